//! Spreadsheet service boundary
//!
//! The append workflows only talk to the remote spreadsheet through the
//! [`SheetsGateway`] trait. [`GoogleSheetsClient`] implements it on top of the
//! Sheets v4 REST API; tests plug in an in-memory implementation.
//!
//! # Example
//!
//! ```no_run
//! use sheetlog::gateway::{GoogleSheetsClient, SheetsGateway};
//! use sheetlog::SpreadsheetOptions;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = SpreadsheetOptions::from_env();
//!     let client = GoogleSheetsClient::authorize(&options).await?;
//!
//!     let spreadsheet = client.get_spreadsheet(&options.spreadsheet_id).await?;
//!     for tab in spreadsheet.sheets {
//!         println!("{} ({})", tab.properties.title, tab.properties.sheet_id);
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "google-api")]
pub mod auth;

#[cfg(feature = "google-api")]
pub mod google;

#[cfg(feature = "google-api")]
pub use google::GoogleSheetsClient;

use crate::error::Result;
use crate::types::CellValue;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Operations the workflows need from the spreadsheet service
///
/// Every call is awaited before the next one is issued; implementations do
/// not need to support concurrent use from a single workflow.
pub trait SheetsGateway: Send + Sync {
    /// Fetch spreadsheet metadata (tab titles and ids)
    fn get_spreadsheet(
        &self,
        spreadsheet_id: &str,
    ) -> impl Future<Output = Result<Spreadsheet>> + Send;

    /// Read the cells of a range
    ///
    /// An empty range yields a [`ValueRange`] whose `values` is `None`.
    fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> impl Future<Output = Result<ValueRange>> + Send;

    /// Append rows after the data found at the top-left of `range`
    fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<CellValue>>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Overwrite the cells starting at `range`
    fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<CellValue>>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Apply structural requests in order
    fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> impl Future<Output = Result<BatchUpdateResponse>> + Send;
}

/// Spreadsheet metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Spreadsheet {
    /// Find a tab by exact (case-sensitive) title
    pub fn find_sheet(&self, title: &str) -> Option<&SheetProperties> {
        self.sheets
            .iter()
            .map(|s| &s.properties)
            .find(|p| p.title == title)
    }
}

/// A tab within a spreadsheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(default)]
    pub properties: SheetProperties,
}

/// Title and service assigned id of a tab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    #[serde(default)]
    pub title: String,
}

/// Cells of a range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Vec<CellValue>>>,
}

impl ValueRange {
    /// Value range holding `rows`, used for request bodies
    pub fn rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            range: None,
            major_dimension: Some("ROWS".to_string()),
            values: Some(rows),
        }
    }

    /// First row as text, empty when the range had no data
    pub fn first_row_text(&self) -> Vec<String> {
        self.values
            .as_ref()
            .and_then(|rows| rows.first())
            .map(|row| row.iter().map(CellValue::as_string).collect())
            .unwrap_or_default()
    }
}

/// Structural batch update request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    AddSheet(AddSheetRequest),
    DeleteDimension(DeleteDimensionRequest),
}

impl Request {
    /// Create a tab with the given title
    pub fn add_sheet(title: impl Into<String>) -> Self {
        Request::AddSheet(AddSheetRequest {
            properties: NewSheetProperties {
                title: title.into(),
            },
        })
    }

    /// Delete rows `start..end` (0-based, end exclusive) of a tab
    pub fn delete_rows(sheet_id: i64, start_index: u32, end_index: u32) -> Self {
        Request::DeleteDimension(DeleteDimensionRequest {
            range: DimensionRange {
                sheet_id,
                dimension: Dimension::Rows,
                start_index,
                end_index,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSheetRequest {
    pub properties: NewSheetProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSheetProperties {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDimensionRequest {
    pub range: DimensionRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    pub dimension: Dimension,
    pub start_index: u32,
    pub end_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Rows,
}

/// Replies to a batch update, one per request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_sheet: Option<AddSheetReply>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSheetReply {
    pub properties: SheetProperties,
}
