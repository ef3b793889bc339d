use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::sync::{watch, Mutex};
use tracing_subscriber::EnvFilter;

use expense_tracker_core::export::ExportFormat;
use expense_tracker_core::models::settings::Settings;
use expense_tracker_core::models::transaction::TransactionDraft;
use expense_tracker_core::models::view::{CategoryFilter, ViewFilter, ViewResult};
use expense_tracker_core::reconcile::{schedule, RefreshOutcome};
use expense_tracker_core::ExpenseTracker;

/// Record personal transactions and summarise spending.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON settings file. Environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path of the transaction store, overriding settings.
    #[arg(long)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add one transaction. Use a negative amount for expenses.
    Add {
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: Option<String>,
        /// Day of the transaction (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Import a .csv, .xls or .xlsx file with amount and category columns.
    Import { file: PathBuf },
    /// Write the transactions to a file.
    Export {
        /// csv or xlsx
        format: ExportFormat,
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print totals for the selected transactions.
    View {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Keep reconciling with the store file until interrupted.
    Watch,
}

#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Category name, or "All".
    #[arg(long)]
    category: Option<String>,
    /// Case-insensitive text to find in descriptions.
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> ViewFilter {
        ViewFilter {
            start_date: self.from,
            end_date: self.to,
            category: CategoryFilter::from_param(self.category.as_deref()),
            search: self.search.clone(),
        }
    }

    fn is_set(&self) -> bool {
        self.from.is_some() || self.to.is_some() || self.category.is_some() || self.search.is_some()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let args = Args::parse();
    let settings = load_settings(&args)?;
    let mut tracker = ExpenseTracker::open(settings).context("failed to open transaction store")?;

    match args.command {
        Command::Add {
            amount,
            category,
            description,
            date,
        } => {
            let mut draft = TransactionDraft::new(amount, category);
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            if let Some(day) = date {
                draft = draft.on_day(day);
            }
            let report = tracker.add(draft);
            println!("{}", report.message());
            if !report.status.is_success() {
                std::process::exit(1);
            }
        }
        Command::Import { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let report = tracker.import(&bytes, &filename);
            println!("{}", report.message());
            if !report.status.is_success() {
                std::process::exit(1);
            }
        }
        Command::Export {
            format,
            output,
            filter,
        } => {
            let view_filter = filter.to_filter();
            let report = tracker.export(format, filter.is_set().then_some(&view_filter));
            let Some(file) = report.file else {
                bail!(report.message);
            };
            let path = output.unwrap_or_else(|| PathBuf::from(&file.file_name));
            std::fs::write(&path, &file.bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{} ({})", report.message, path.display());
        }
        Command::View { filter } => {
            print_view(&tracker.view(&filter.to_filter()));
        }
        Command::Watch => watch_store(tracker).await,
    }

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let settings = match &args.config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let mut settings = settings.with_env_overrides()?;
    if let Some(path) = &args.data_file {
        settings.data_file = path.clone();
    }
    Ok(settings)
}

async fn watch_store(tracker: ExpenseTracker) {
    let period = tracker.settings().refresh_interval();
    tracing::info!(
        path = %tracker.storage_path().display(),
        every = ?period,
        "watching transaction store"
    );

    let tracker = Arc::new(Mutex::new(tracker));
    let (stop, stopped) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop.send(true);
        }
    });

    let stats = schedule::run_periodic(tracker, period, stopped, |outcome| {
        if let RefreshOutcome::Replaced { previous, current } = outcome {
            println!("Store changed: {previous} -> {current} transactions");
        }
    })
    .await;
    println!(
        "Stopped after {} passes ({} updates, {} failures)",
        stats.passes, stats.replaced, stats.failed
    );
}

fn print_view(view: &ViewResult) {
    if view.excluded > 0 {
        println!("({} transactions skipped: unreadable date)", view.excluded);
    }
    if view.is_empty() {
        println!("No transactions yet.");
        return;
    }

    let s = &view.summary;
    println!(
        "{} transactions  income {:.2}  expenses {:.2}  net {:.2}",
        s.count, s.income, s.expenses, s.net
    );

    println!("\nBy category");
    for (category, total) in view.categories.slices() {
        println!("  {category:<16} {total:>12.2}");
    }

    println!("\nBy month");
    for m in &view.monthly {
        println!("  {}  {:<16} {:>12.2}", m.month.format("%Y-%m"), m.category, m.total);
    }

    if let Some(last) = view.cumulative.last() {
        println!("\nRunning total at {}: {:.2}", last.timestamp, last.cumulative);
    }

    println!("\nRecent transactions");
    for tx in &view.recent {
        println!(
            "  {}  {:>10.2}  {:<14} {}",
            tx.date, tx.amount, tx.category, tx.description
        );
    }
}
