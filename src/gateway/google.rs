//! Google Sheets v4 REST client

use super::auth::ServiceAccount;
use super::{BatchUpdateResponse, Request, SheetsGateway, Spreadsheet, ValueRange};
use crate::error::{Result, SheetError};
use crate::options::SpreadsheetOptions;
use crate::types::CellValue;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Sheets API endpoint
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Authorized Sheets client
///
/// # Example
///
/// ```no_run
/// use sheetlog::gateway::GoogleSheetsClient;
/// use sheetlog::{append_data_with, Record, SpreadsheetOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let options = SpreadsheetOptions::from_env().with_sheet("Temperatures");
///     let client = GoogleSheetsClient::authorize(&options).await?;
///
///     // Reuse one token for several appends
///     for reading in [21.5, 21.7] {
///         let mut record = Record::new();
///         record.insert("temperature".to_string(), reading.into());
///         append_data_with(&client, record, &options).await?;
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    access_token: String,
    base_url: Url,
}

/// Error body returned by Google APIs
#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateBody {
    requests: Vec<Request>,
}

impl GoogleSheetsClient {
    /// Validate options, then fetch an access token for the service account
    pub async fn authorize(options: &SpreadsheetOptions) -> Result<Self> {
        options.validate()?;

        let http = reqwest::Client::new();
        let token = ServiceAccount::new(&options.email, options.private_key_pem())
            .fetch_access_token(&http)
            .await?;
        debug!(expires_in = token.expires_in, "authorized service account");

        Self::with_token(http, token.access_token)
    }

    /// Use an access token obtained elsewhere
    pub fn with_token(http: reqwest::Client, access_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http,
            access_token: access_token.into(),
            base_url: Url::parse(SHEETS_BASE_URL)?,
        })
    }

    /// Point the client at another endpoint (e.g. a local emulator)
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)?;
        Ok(self)
    }

    /// `<base>/<id>/<segments...>`, each segment percent-encoded
    fn url(&self, spreadsheet_id: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SheetError::Transport("base url cannot have a path".to_string()))?;
            path.pop_if_empty().push(spreadsheet_id);
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.access_token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = error_body(response.text().await);
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(SheetError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

impl SheetsGateway for GoogleSheetsClient {
    async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet> {
        let mut url = self.url(spreadsheet_id, &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");

        debug!(spreadsheet_id, "get spreadsheet");
        self.send(self.request(Method::GET, url)).await
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange> {
        let url = self.url(spreadsheet_id, &["values", range])?;

        debug!(spreadsheet_id, range, "get values");
        self.send(self.request(Method::GET, url)).await
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<()> {
        let mut url = self.url(spreadsheet_id, &["values", &format!("{}:append", range)])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        debug!(spreadsheet_id, range, rows = rows.len(), "append values");
        let body = ValueRange::rows(rows);
        self.send::<serde_json::Value>(self.request(Method::POST, url).json(&body))
            .await?;
        Ok(())
    }

    async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<()> {
        let mut url = self.url(spreadsheet_id, &["values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        debug!(spreadsheet_id, range, rows = rows.len(), "update values");
        let body = ValueRange::rows(rows);
        self.send::<serde_json::Value>(self.request(Method::PUT, url).json(&body))
            .await?;
        Ok(())
    }

    async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse> {
        let url = self.url(&format!("{}:batchUpdate", spreadsheet_id), &[])?;

        debug!(spreadsheet_id, requests = requests.len(), "batch update");
        let body = BatchUpdateBody { requests };
        self.send(self.request(Method::POST, url).json(&body)).await
    }
}

/// Body of an error response, or why it could not be read
pub(crate) fn error_body(body: reqwest::Result<String>) -> String {
    body.unwrap_or_else(|e| format!("unreadable response body: {}", e))
}
