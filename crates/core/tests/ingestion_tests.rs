// ═══════════════════════════════════════════════════════════════════
// Ingestion Tests — CSV and spreadsheet import, batch validation
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDateTime;
use expense_tracker_core::errors::CoreError;
use expense_tracker_core::export::to_xlsx;
use expense_tracker_core::ingestion::{self, build_batch, Cell, Table};
use expense_tracker_core::models::transaction::{Transaction, DATE_FORMAT};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATE_FORMAT).unwrap()
}

fn now() -> NaiveDateTime {
    ts("2024-07-01 09:00:00")
}

// ═══════════════════════════════════════════════════════════════════
// CSV
// ═══════════════════════════════════════════════════════════════════

mod csv_import {
    use super::*;

    #[test]
    fn full_columns() {
        let csv = b"date,amount,category,description\n\
                    2024-01-01 10:00:00,100,Income,salary\n\
                    2024-01-02 12:00:00,-20.5,Food,lunch\n";
        let txs = ingestion::parse(csv, "bank.csv", now()).unwrap();
        assert_eq!(
            txs,
            vec![
                Transaction::new(100.0, "Income", "salary", ts("2024-01-01 10:00:00")),
                Transaction::new(-20.5, "Food", "lunch", ts("2024-01-02 12:00:00")),
            ]
        );
    }

    #[test]
    fn missing_date_column_stamps_import_time() {
        let csv = b"amount,category\n1,Food\n2,Food\n3,Other\n";
        let txs = ingestion::parse(csv, "x.csv", now()).unwrap();
        assert_eq!(txs.len(), 3);
        assert!(txs.iter().all(|t| t.date == "2024-07-01 09:00:00"));
        assert!(txs.iter().all(|t| t.description.is_empty()));
    }

    #[test]
    fn blank_date_cell_stamps_import_time() {
        let csv = b"amount,category,date\n1,Food,\n2,Food,2024-02-03\n";
        let txs = ingestion::parse(csv, "x.csv", now()).unwrap();
        assert_eq!(txs[0].date, "2024-07-01 09:00:00");
        assert_eq!(txs[1].date, "2024-02-03 00:00:00");
    }

    #[test]
    fn dates_are_normalized() {
        let csv = b"amount,category,date\n\
                    1,Food,2024-02-03T04:05:06\n\
                    1,Food,2024/02/03\n\
                    1,Food,02/03/2024 04:05\n\
                    1,Food,2024-02-03T04:05:06Z\n";
        let dates: Vec<String> = ingestion::parse(csv, "x.csv", now())
            .unwrap()
            .into_iter()
            .map(|t| t.date)
            .collect();
        assert_eq!(
            dates,
            vec![
                "2024-02-03 04:05:06",
                "2024-02-03 00:00:00",
                "2024-02-03 04:05:00",
                "2024-02-03 04:05:06"
            ]
        );
    }

    #[test]
    fn headers_are_case_insensitive_and_extra_columns_ignored() {
        let csv = b"\xEF\xBB\xBFAmount,Category,Notes\n5,Food,ignored\n";
        let txs = ingestion::parse(csv, "X.CSV", now()).unwrap();
        assert_eq!(txs[0].amount, 5.0);
        assert_eq!(txs[0].description, "");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let csv = b"amount,category\n1,Food\n\n,\n2,Food\n";
        assert_eq!(ingestion::parse(csv, "x.csv", now()).unwrap().len(), 2);
    }

    #[test]
    fn missing_required_column_rejects_batch() {
        for csv in [&b"category,description\nFood,x\n"[..], &b"amount,description\n1,x\n"[..]] {
            let err = ingestion::parse(csv, "x.csv", now()).unwrap_err();
            assert!(matches!(err, CoreError::MissingColumns(_)));
            assert_eq!(
                err.to_string(),
                "File must contain \"amount\" and \"category\" columns"
            );
            assert!(err.is_validation());
        }
    }

    #[test]
    fn one_bad_amount_rejects_batch() {
        let csv = b"amount,category\n1,Food\nabc,Food\n3,Food\n";
        let err = ingestion::parse(csv, "x.csv", now()).unwrap_err();
        match err {
            CoreError::InvalidRow { row, message } => {
                assert_eq!(row, 3);
                assert!(message.contains("abc"), "{message}");
            }
            other => panic!("expected InvalidRow, got {other:?}"),
        }
    }

    #[test]
    fn empty_amount_or_category_rejects_batch() {
        assert!(matches!(
            ingestion::parse(b"amount,category\n,Food\n", "x.csv", now()),
            Err(CoreError::InvalidRow { row: 2, .. })
        ));
        assert!(matches!(
            ingestion::parse(b"amount,category\n4,\n", "x.csv", now()),
            Err(CoreError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn unparsable_date_rejects_batch() {
        let err = ingestion::parse(b"amount,category,date\n1,Food,someday\n", "x.csv", now())
            .unwrap_err();
        assert!(err.to_string().contains("invalid date 'someday'"));
    }

    #[test]
    fn header_only_is_rejected() {
        assert!(matches!(
            ingestion::parse(b"amount,category\n", "x.csv", now()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = ingestion::parse(b"amount,category\n1,\xFF\xFE\n", "x.csv", now()).unwrap_err();
        assert!(err.is_validation());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Dispatch
// ═══════════════════════════════════════════════════════════════════

mod dispatch {
    use super::*;

    #[test]
    fn unsupported_extension() {
        let err = ingestion::parse(b"amount,category\n1,Food\n", "data.json", now()).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedFormat(_)));
    }

    #[test]
    fn spreadsheet_extension_with_csv_bytes_fails_cleanly() {
        let err = ingestion::parse(b"amount,category\n1,Food\n", "data.xlsx", now()).unwrap_err();
        assert!(matches!(err, CoreError::Spreadsheet(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Spreadsheet
// ═══════════════════════════════════════════════════════════════════

mod spreadsheet_import {
    use super::*;

    #[test]
    fn reads_exported_workbook() {
        let original = vec![
            Transaction::new(100.0, "Income", "salary", ts("2024-01-01 10:00:00")),
            Transaction::new(-20.25, "Food", "lunch", ts("2024-01-02 12:00:00")),
        ];
        let bytes = to_xlsx(&original).unwrap();
        let txs = ingestion::parse(&bytes, "export.xlsx", now()).unwrap();
        assert_eq!(txs, original);
    }

    #[test]
    fn numeric_cells_and_missing_optional_columns() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "category").unwrap();
        sheet.write_string(0, 1, "amount").unwrap();
        sheet.write_string(1, 0, "Utilities").unwrap();
        sheet.write_number(1, 1, -80.0).unwrap();
        sheet.write_string(2, 0, "Food").unwrap();
        sheet.write_string(2, 1, "-12.5").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let txs = ingestion::parse(&bytes, "bills.XLSX", now()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount, -80.0);
        assert_eq!(txs[0].category, "Utilities");
        assert_eq!(txs[1].amount, -12.5);
        assert!(txs.iter().all(|t| t.date == "2024-07-01 09:00:00"));
    }

    #[test]
    fn native_date_cells_keep_their_timestamp() {
        let stamp = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let day = Format::new().set_num_format("dd/mm/yyyy");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["date", "amount", "category"].into_iter().enumerate() {
            sheet.write_string(0, col as u16, name).unwrap();
        }
        let evening = ExcelDateTime::parse_from_str("2023-03-04 18:00:00").unwrap();
        sheet.write_datetime_with_format(1, 0, &evening, &stamp).unwrap();
        sheet.write_number(1, 1, -42.5).unwrap();
        sheet.write_string(1, 2, "Food").unwrap();
        let new_year = ExcelDateTime::parse_from_str("2024-01-01").unwrap();
        sheet.write_datetime_with_format(2, 0, &new_year, &day).unwrap();
        sheet.write_number(2, 1, 1500.0).unwrap();
        sheet.write_string(2, 2, "Income").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let txs = ingestion::parse(&bytes, "statement.xlsx", now()).unwrap();
        assert_eq!(
            txs,
            vec![
                Transaction::new(-42.5, "Food", "", ts("2023-03-04 18:00:00")),
                Transaction::new(1500.0, "Income", "", ts("2024-01-01 00:00:00")),
            ]
        );
    }

    #[test]
    fn missing_required_column_rejects_workbook() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "amount").unwrap();
        sheet.write_number(1, 0, 5.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        assert!(matches!(
            ingestion::parse(&bytes, "a.xlsx", now()),
            Err(CoreError::MissingColumns(_))
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Table validation
// ═══════════════════════════════════════════════════════════════════

mod batch {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn native_date_cells_are_used_directly() {
        let table = Table {
            headers: headers(&["amount", "category", "date"]),
            rows: vec![(
                2,
                vec![
                    Cell::Number(7.0),
                    Cell::Text("Other".into()),
                    Cell::DateTime(ts("2023-03-04 05:06:07")),
                ],
            )],
        };
        let txs = build_batch(table, now()).unwrap();
        assert_eq!(txs[0].date, "2023-03-04 05:06:07");
    }

    #[test]
    fn numeric_description_becomes_text() {
        let table = Table {
            headers: headers(&["amount", "category", "description"]),
            rows: vec![(2, vec![Cell::Number(1.0), Cell::Text("Food".into()), Cell::Number(42.0)])],
        };
        assert_eq!(build_batch(table, now()).unwrap()[0].description, "42");
    }

    #[test]
    fn non_finite_number_cell_rejected() {
        let table = Table {
            headers: headers(&["amount", "category"]),
            rows: vec![(5, vec![Cell::Number(f64::NAN), Cell::Text("Food".into())])],
        };
        assert!(matches!(
            build_batch(table, now()),
            Err(CoreError::InvalidRow { row: 5, .. })
        ));
    }
}
