//! Paged scan demo over an in-memory store.
//!
//! Fills one row with `--columns` columns named `<prefix>NNN`, scans it with
//! the given page size and bounds, and prints one JSON line per column:
//!
//! ```sh
//! RUST_LOG=widerow_core=debug widerow-scan --columns 23 --page-size 10
//! widerow-scan --start a010 --finish a020 --reversed
//! ```

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use widerow_client::{
    ClientConfig, ColumnStore, Cursor, Keyspace, MemoryStore, ScanRange, Value, ValueType,
};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "widerow-scan")]
#[command(about = "Scan a wide row page by page")]
struct Args {
    /// Number of columns to write before scanning.
    #[arg(short, long, default_value_t = 100, env = "WIDEROW_COLUMNS")]
    columns: u32,

    /// Column name prefix.
    #[arg(long, default_value = "a", env = "WIDEROW_PREFIX")]
    prefix: String,

    /// Columns per fetch. 0 or less fetches everything at once.
    #[arg(
        short,
        long,
        default_value_t = 100,
        env = "WIDEROW_PAGE_SIZE",
        allow_negative_numbers = true
    )]
    page_size: i64,

    /// Inclusive start column.
    #[arg(long)]
    start: Option<String>,

    /// Inclusive finish column.
    #[arg(long)]
    finish: Option<String>,

    /// Scan in descending order; `--start` is then the upper bound.
    #[arg(short, long)]
    reversed: bool,

    /// Emit logs as JSON.
    #[arg(long, env = "WIDEROW_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let store = Arc::new(MemoryStore::new());
    let config = ClientConfig::default().with_column_page_size(args.page_size);
    let keyspace = Keyspace::new("demo", Arc::clone(&store) as Arc<dyn ColumnStore>, config);
    let family =
        keyspace.add_column_family("wide", ValueType::Utf8, ValueType::Utf8, ValueType::Long)?;
    keyspace.sync_schema()?;

    let row = family.row("row")?;
    let width = args.columns.saturating_sub(1).to_string().len().max(3);
    for n in 0..args.columns {
        row.insert_column(format!("{}{n:0width$}", args.prefix), i64::from(n))?;
    }
    info!(columns = args.columns, page_size = args.page_size, "row populated");

    let mut range = ScanRange::between(args.start.map(Value::from), args.finish.map(Value::from));
    if args.reversed {
        range = range.reversed();
    }

    let before = store.query_count();
    let mut out = io::stdout().lock();
    let mut delivered = 0_usize;
    for column in row.scan(range)?.into_results() {
        let column = column?;
        let line = serde_json::json!({
            "name": column.name.to_string(),
            "value": column.value.as_i64(),
        });
        serde_json::to_writer(&mut out, &line)?;
        writeln!(out)?;
        delivered += 1;
    }
    out.flush()?;

    info!(
        delivered,
        fetches = store.query_count() - before,
        "scan complete"
    );
    Ok(())
}
