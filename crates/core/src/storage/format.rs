use serde::Deserialize;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::transaction::{ensure_finite, Transaction};

/// A record as it appears on disk, before coercion.
///
/// The store may be edited by hand, so fields are read loosely and checked
/// in [`coerce_record`].
#[derive(Debug, Deserialize)]
struct StoredRecord {
    amount: Option<Value>,
    category: Option<Value>,
    description: Option<Value>,
    date: Option<Value>,
}

/// Serialize the working set into the durable store layout:
/// a pretty-printed JSON array of `{amount, category, description, date}`.
pub fn write_store(transactions: &[Transaction]) -> Result<Vec<u8>, CoreError> {
    let mut bytes = serde_json::to_vec_pretty(transactions)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize transactions: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse durable store bytes.
///
/// Fails if the bytes are not JSON, the top level is not an array, or any
/// record is missing a usable amount, category or date.
pub fn read_store(data: &[u8]) -> Result<Vec<Transaction>, CoreError> {
    let records: Vec<StoredRecord> = serde_json::from_slice(data)
        .map_err(|e| CoreError::Deserialization(format!("Store is not a JSON array of records: {e}")))?;

    records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| coerce_record(record).map_err(|msg| {
            CoreError::Deserialization(format!("Record {idx}: {msg}"))
        }))
        .collect()
}

fn coerce_record(record: StoredRecord) -> Result<Transaction, String> {
    let amount = match record.amount {
        Some(Value::Number(n)) => n.as_f64().ok_or("amount is out of range")?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("amount '{s}' is not a number"))?,
        Some(other) => return Err(format!("amount has unsupported value {other}")),
        None => return Err("amount is missing".into()),
    };
    let amount = ensure_finite(amount).map_err(|e| e.to_string())?;

    let category = match record.category {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::String(_)) => return Err("category is empty".into()),
        Some(other) => return Err(format!("category has unsupported value {other}")),
        None => return Err("category is missing".into()),
    };

    let description = match record.description {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    };

    let date = match record.date {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => return Err("date is missing".into()),
        Some(other) => return Err(format!("date has unsupported value {other}")),
    };

    Ok(Transaction {
        amount,
        category,
        description,
        date,
    })
}
