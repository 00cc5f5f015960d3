//! Keep one row per job in a status sheet
//!
//! Usage: cargo run --example set_key_values -- <job> <state>
//!
//! Configure with SHEETLOG_EMAIL, SHEETLOG_KEY, SHEETLOG_SPREADSHEET_ID and
//! optionally SHEETLOG_SHEET / SHEETLOG_KEY_NAME.

use sheetlog::{set_key_values, Record, SpreadsheetOptions, UpsertOutcome};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let job = args.next().unwrap_or_else(|| "backup".to_string());
    let state = args.next().unwrap_or_else(|| "ok".to_string());

    let mut options = SpreadsheetOptions::from_env();
    if options.sheet.is_empty() {
        options = options.with_sheet("Jobs");
    }

    let mut record = Record::new();
    record.insert(options.key_name().to_string(), job.clone().into());
    record.insert("state".to_string(), state.into());
    record.insert(
        "updated".to_string(),
        chrono::Local::now().to_rfc3339().into(),
    );

    match set_key_values(record, &options).await? {
        UpsertOutcome::Updated { row } => println!("✅ Updated '{}' in row {}", job, row),
        UpsertOutcome::Appended => println!("➕ Added '{}'", job),
    }

    Ok(())
}
