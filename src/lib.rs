//! # sheetlog
//!
//! Append records as rows to a Google Sheets spreadsheet.
//!
//! ## Features
//!
//! - **Auto tabs**: the target tab is created on first use
//! - **Auto headers**: unknown record fields become new header columns on the right
//! - **Retention**: date-stamped rows older than the retention window are purged
//! - **Upsert**: rows can be overwritten in place by a key column
//! - **Pluggable backend**: workflows run against any [`SheetsGateway`]
//!
//! ## Quick Start
//!
//! ### Appending a dated record
//!
//! ```rust,no_run
//! use sheetlog::{append_data, Record, SpreadsheetOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = SpreadsheetOptions::new(
//!     "logger@project.iam.gserviceaccount.com",
//!     std::env::var("SHEETLOG_KEY")?,
//!     "1f5epAPxP_Yd3g1TunEMdtianpVAhKS0RG6BKRDSLtrk",
//! )
//! .with_sheet("Temperatures");
//!
//! let mut record = Record::new();
//! record.insert("livingroom".to_string(), 21.5.into());
//!
//! // Stamps `date`, adds missing headers, appends, purges rows older than 14 days
//! append_data(record, &options).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Key/value rows
//!
//! ```rust,no_run
//! use sheetlog::{set_key_values, Record, SpreadsheetOptions, UpsertOutcome};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = SpreadsheetOptions::from_env().with_sheet("Status");
//!
//! let mut record = Record::new();
//! record.insert("key".to_string(), "backup".into());
//! record.insert("state".to_string(), "ok".into());
//!
//! match set_key_values(record, &options).await? {
//!     UpsertOutcome::Updated { row } => println!("updated row {}", row),
//!     UpsertOutcome::Appended => println!("new key"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod append;
pub mod column;
pub mod error;
pub mod gateway;
pub mod options;
pub mod types;

pub use append::{append_data_with, set_key_values_with, AppendOutcome, UpsertOutcome};
pub use error::{Result, SheetError};
pub use gateway::SheetsGateway;
pub use options::SpreadsheetOptions;
pub use types::{value_row, CellValue, Record};

#[cfg(feature = "google-api")]
pub use gateway::GoogleSheetsClient;

/// Authorize with the options' service account, then run
/// [`append_data_with`] against Google Sheets.
///
/// Options are validated before any network access.
#[cfg(feature = "google-api")]
pub async fn append_data(record: Record, options: &SpreadsheetOptions) -> Result<AppendOutcome> {
    options.validate()?;
    let client = GoogleSheetsClient::authorize(options).await?;
    append_data_with(&client, record, options).await
}

/// Authorize with the options' service account, then run
/// [`set_key_values_with`] against Google Sheets.
///
/// Options and the record's key are validated before any network access.
#[cfg(feature = "google-api")]
pub async fn set_key_values(record: Record, options: &SpreadsheetOptions) -> Result<UpsertOutcome> {
    options.validate()?;
    append::record_key(&record, options)?;
    let client = GoogleSheetsClient::authorize(options).await?;
    set_key_values_with(&client, record, options).await
}
