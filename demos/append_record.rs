//! Append a dated temperature reading to a Google Sheet
//!
//! Configure with SHEETLOG_EMAIL, SHEETLOG_KEY, SHEETLOG_SPREADSHEET_ID and
//! optionally SHEETLOG_SHEET / SHEETLOG_RETENTION. Set RUST_LOG=sheetlog=debug
//! to see each request.

use sheetlog::{append_data, Record, SpreadsheetOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut options = SpreadsheetOptions::from_env();
    if options.sheet.is_empty() {
        options = options.with_sheet("Temperatures");
    }

    let mut record = Record::new();
    record.insert("livingroom".to_string(), 21.5.into());
    record.insert("bedroom".to_string(), 19.0.into());
    record.insert("outside".to_string(), (-2.5).into());

    println!("📝 Appending to '{}'...", options.sheet);
    let outcome = append_data(record, &options).await?;

    println!("✅ Row appended (tab id {})", outcome.sheet_id);
    println!("📋 Headers: {:?}", outcome.headers);
    if !outcome.added_headers.is_empty() {
        println!("➕ New headers: {:?}", outcome.added_headers);
    }
    println!(
        "🧹 Purged {} rows older than {} days",
        outcome.purged_rows,
        options.retention_days()
    );

    Ok(())
}
