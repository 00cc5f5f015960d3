//! Append and upsert workflows
//!
//! Both workflows run the same short sequence of remote calls, each awaited
//! before the next is issued:
//!
//! 1. Validate options (no network access on failure)
//! 2. Make sure the target tab exists, creating it if needed
//! 3. Make sure every record field has a header column, appending missing
//!    headers to the right of the existing ones
//! 4. Write the record as a row aligned to the headers
//! 5. [`append_data_with`]: delete rows older than the retention window.
//!    [`set_key_values_with`]: overwrite the row whose key matches instead
//!    of appending, when there is one
//!
//! Nothing is cached between calls and no lock is taken. Two calls racing on
//! the same tab can both miss a key and append twice, or a purge can race an
//! append; callers that need stronger guarantees must serialize their calls
//! per tab.
//!
//! # Example
//!
//! ```no_run
//! use sheetlog::{append_data, Record, SpreadsheetOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = SpreadsheetOptions::from_env()
//!         .with_sheet("Temperatures")
//!         .with_retention(30);
//!
//!     let mut record = Record::new();
//!     record.insert("livingroom".to_string(), 21.5.into());
//!     record.insert("bedroom".to_string(), 19.0.into());
//!
//!     let outcome = append_data(record, &options).await?;
//!     println!("purged {} old rows", outcome.purged_rows);
//!     Ok(())
//! }
//! ```

pub mod purge;

use crate::column::{column_name, column_span, row_span, sheet_range};
use crate::error::{Result, SheetError};
use crate::gateway::{Request, SheetsGateway};
use crate::options::SpreadsheetOptions;
use crate::types::{value_row, CellValue, Record};
use chrono::{DateTime, Duration, Local};
use tracing::{debug, info};

/// Header every date-stamped sheet starts with
pub const DATE_HEADER: &str = "date";

/// Format used to stamp records without a date
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Header columns read when reconciling headers (A..CV)
pub const HEADER_COLUMNS_TO_CHECK: u32 = 100;

/// Data rows scanned by purge and key lookup; rows beyond are ignored
pub const ROWS_TO_CHECK: u32 = 1000;

/// Field name that is never turned into a header
const UNDEFINED_FIELD: &str = "undefined";

/// Result of [`append_data_with`]
#[derive(Debug, Clone, PartialEq)]
pub struct AppendOutcome {
    /// Numeric id of the tab written to (0 for the first tab)
    pub sheet_id: i64,
    /// Header row after reconciliation
    pub headers: Vec<String>,
    /// Headers created by this call
    pub added_headers: Vec<String>,
    /// Rows deleted by the retention purge
    pub purged_rows: usize,
}

/// Result of [`set_key_values_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Existing row (1-based sheet row number) overwritten in place
    Updated { row: u32 },
    /// No row matched the key; a new row was appended
    Appended,
}

/// How strictly the existing header row is checked before extending it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// First header must be `date` once the row is non-empty
    DateFirst,
    /// Any existing layout is accepted
    Any,
}

/// Header row after [`ensure_headers`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Headers {
    /// Existing headers followed by the added ones
    pub names: Vec<String>,
    /// Headers written by this call
    pub added: Vec<String>,
}

/// Append a date-stamped record and purge rows older than the retention.
///
/// A `date` field is added (formatted `YYYY-MM-DD HH:mm`, local time) when
/// the record has none or it is blank, and is always the first header.
pub async fn append_data_with<G: SheetsGateway>(
    gateway: &G,
    mut record: Record,
    options: &SpreadsheetOptions,
) -> Result<AppendOutcome> {
    options.validate()?;

    let now = Local::now();
    stamp_date(&mut record, now);

    let sheet_id = ensure_sheet(gateway, options).await?;
    let headers = ensure_headers(
        gateway,
        options,
        &date_headers(&record),
        HeaderLayout::DateFirst,
    )
    .await?;

    append_row(gateway, options, &record, &headers.names).await?;
    let purged_rows = purge_rows(gateway, options, sheet_id, now).await?;

    Ok(AppendOutcome {
        sheet_id,
        headers: headers.names,
        added_headers: headers.added,
        purged_rows,
    })
}

/// Overwrite the row whose key column matches the record's key, or append.
///
/// The key field is [`SpreadsheetOptions::key_name`]; a record without a
/// value for it is rejected before any remote call.
pub async fn set_key_values_with<G: SheetsGateway>(
    gateway: &G,
    record: Record,
    options: &SpreadsheetOptions,
) -> Result<UpsertOutcome> {
    options.validate()?;
    let key = record_key(&record, options)?;
    let key_name = options.key_name();

    ensure_sheet(gateway, options).await?;
    let headers =
        ensure_headers(gateway, options, &field_headers(&record), HeaderLayout::Any).await?;

    let key_column = headers
        .names
        .iter()
        .position(|h| h == key_name)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| {
            SheetError::InvalidResponse(format!("header row lacks key column '{}'", key_name))
        })?;

    match find_key_row(gateway, options, key_column, &key).await? {
        Some(row) => {
            let range = sheet_range(&options.sheet, &format!("A{}", row));
            gateway
                .update_values(
                    &options.spreadsheet_id,
                    &range,
                    vec![overwrite_row(&record, &headers.names)],
                )
                .await?;
            info!(sheet = %options.sheet, key = %key, row, "updated row in place");
            Ok(UpsertOutcome::Updated { row })
        }
        None => {
            append_row(gateway, options, &record, &headers.names).await?;
            debug!(sheet = %options.sheet, key = %key, "key not found, appended");
            Ok(UpsertOutcome::Appended)
        }
    }
}

/// Text of the record's key, or [`SheetError::MissingKey`] when it is blank.
///
/// A key name of `undefined` is rejected with [`SheetError::InvalidKeyName`]
/// since that field is never turned into a header.
pub fn record_key(record: &Record, options: &SpreadsheetOptions) -> Result<String> {
    let key_name = options.key_name();
    if key_name == UNDEFINED_FIELD {
        return Err(SheetError::InvalidKeyName(key_name.to_string()));
    }
    record
        .get(key_name)
        .filter(|v| !v.is_blank())
        .map(CellValue::as_string)
        .ok_or_else(|| SheetError::MissingKey {
            key_name: key_name.to_string(),
        })
}

/// Row that replaces every cell under `headers`.
///
/// The service leaves a cell untouched when it is sent `null`, so absent
/// fields are sent as empty strings to clear what the old row held.
pub fn overwrite_row(record: &Record, headers: &[String]) -> Vec<CellValue> {
    value_row(record, headers)
        .into_iter()
        .map(|cell| match cell {
            CellValue::Empty => CellValue::String(String::new()),
            other => other,
        })
        .collect()
}

/// Stamp `now` into the `date` field unless it already holds a value
pub fn stamp_date(record: &mut Record, now: DateTime<Local>) {
    let blank = record.get(DATE_HEADER).map_or(true, CellValue::is_blank);
    if blank {
        record.insert(
            DATE_HEADER.to_string(),
            CellValue::String(now.format(DATE_FORMAT).to_string()),
        );
    }
}

/// Headers a date-stamped record needs: `date` first, then its other fields
pub fn date_headers(record: &Record) -> Vec<String> {
    std::iter::once(DATE_HEADER.to_string())
        .chain(
            record
                .keys()
                .filter(|k| k.as_str() != DATE_HEADER && k.as_str() != UNDEFINED_FIELD)
                .cloned(),
        )
        .collect()
}

/// Headers a key/value record needs, in field order
pub fn field_headers(record: &Record) -> Vec<String> {
    record
        .keys()
        .filter(|k| k.as_str() != UNDEFINED_FIELD)
        .cloned()
        .collect()
}

/// Resolve the numeric id of the configured tab, creating the tab if needed.
///
/// With no tab name configured the first tab is used and its id is taken to
/// be 0 without asking the service.
pub async fn ensure_sheet<G: SheetsGateway>(
    gateway: &G,
    options: &SpreadsheetOptions,
) -> Result<i64> {
    if options.sheet.is_empty() {
        return Ok(0);
    }

    let spreadsheet = gateway.get_spreadsheet(&options.spreadsheet_id).await?;
    if let Some(properties) = spreadsheet.find_sheet(&options.sheet) {
        debug!(sheet = %options.sheet, sheet_id = properties.sheet_id, "tab exists");
        return Ok(properties.sheet_id);
    }

    let response = gateway
        .batch_update(
            &options.spreadsheet_id,
            vec![Request::add_sheet(options.sheet.clone())],
        )
        .await?;

    let sheet_id = response
        .replies
        .into_iter()
        .next()
        .and_then(|reply| reply.add_sheet)
        .map(|reply| reply.properties.sheet_id)
        .ok_or_else(|| SheetError::InvalidResponse("addSheet reply without sheetId".to_string()))?;

    info!(sheet = %options.sheet, sheet_id, "created tab");
    Ok(sheet_id)
}

/// Make sure every name in `wanted` is present in the header row.
///
/// Missing names are written into row 1 starting at the first free column;
/// existing headers are never moved. With [`HeaderLayout::DateFirst`] a
/// non-empty header row that does not start with `date` is rejected before
/// anything is written.
pub async fn ensure_headers<G: SheetsGateway>(
    gateway: &G,
    options: &SpreadsheetOptions,
    wanted: &[String],
    layout: HeaderLayout,
) -> Result<Headers> {
    let range = row_span(&options.sheet, 1, HEADER_COLUMNS_TO_CHECK)?;
    let existing = gateway
        .get_values(&options.spreadsheet_id, &range)
        .await?
        .first_row_text();

    let missing: Vec<String> = wanted
        .iter()
        .filter(|h| !existing.contains(*h))
        .cloned()
        .collect();

    if missing.is_empty() {
        return Ok(Headers {
            names: existing,
            added: Vec::new(),
        });
    }

    if layout == HeaderLayout::DateFirst {
        if let Some(first) = existing.first().filter(|h| h.as_str() != DATE_HEADER) {
            return Err(SheetError::HeaderMismatch {
                found: first.clone(),
            });
        }
    }

    let first_free = column_name(existing.len() as u32 + 1)?;
    let range = sheet_range(&options.sheet, &format!("{}1", first_free));
    let cells = missing.iter().map(|h| CellValue::from(h.as_str())).collect();
    gateway
        .update_values(&options.spreadsheet_id, &range, vec![cells])
        .await?;
    info!(sheet = %options.sheet, added = ?missing, column = %first_free, "added headers");

    let mut names = existing;
    names.extend(missing.iter().cloned());
    Ok(Headers {
        names,
        added: missing,
    })
}

/// Append the record as a new row aligned to `headers`
pub async fn append_row<G: SheetsGateway>(
    gateway: &G,
    options: &SpreadsheetOptions,
    record: &Record,
    headers: &[String],
) -> Result<()> {
    let range = sheet_range(&options.sheet, "A1");
    gateway
        .append_values(
            &options.spreadsheet_id,
            &range,
            vec![value_row(record, headers)],
        )
        .await
}

/// Delete data rows whose date is missing, unreadable or older than the
/// retention window. Returns the number of rows deleted.
///
/// Only the first [`ROWS_TO_CHECK`] data rows are examined. Deletions are
/// sent in one batch, highest row first, so earlier deletions do not shift
/// rows still pending.
pub async fn purge_rows<G: SheetsGateway>(
    gateway: &G,
    options: &SpreadsheetOptions,
    sheet_id: i64,
    now: DateTime<Local>,
) -> Result<usize> {
    let range = column_span(&options.sheet, 1, 2, ROWS_TO_CHECK + 1)?;
    let Some(rows) = gateway
        .get_values(&options.spreadsheet_id, &range)
        .await?
        .values
    else {
        return Ok(0);
    };

    let cutoff = now - Duration::days(i64::from(options.retention_days()));
    let stale = purge::stale_rows(&rows, cutoff);
    if stale.is_empty() {
        return Ok(0);
    }

    // Offset 0 is sheet row 2, i.e. 0-based dimension index 1
    let requests = stale
        .iter()
        .rev()
        .map(|&offset| Request::delete_rows(sheet_id, offset + 1, offset + 2))
        .collect();
    gateway
        .batch_update(&options.spreadsheet_id, requests)
        .await?;

    info!(sheet = %options.sheet, rows = stale.len(), %cutoff, "purged stale rows");
    Ok(stale.len())
}

/// Sheet row number (1-based) whose key column holds `key`.
async fn find_key_row<G: SheetsGateway>(
    gateway: &G,
    options: &SpreadsheetOptions,
    key_column: u32,
    key: &str,
) -> Result<Option<u32>> {
    let range = column_span(&options.sheet, key_column, 2, ROWS_TO_CHECK + 1)?;
    let rows = gateway
        .get_values(&options.spreadsheet_id, &range)
        .await?
        .values
        .unwrap_or_default();

    Ok(rows
        .iter()
        .position(|row| row.first().is_some_and(|cell| cell.as_string() == key))
        .map(|i| i as u32 + 2))
}
