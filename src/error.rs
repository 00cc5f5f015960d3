//! Error types for sheetlog

use thiserror::Error;

/// Result type alias for sheetlog operations
pub type Result<T> = std::result::Result<T, SheetError>;

/// Main error type for all spreadsheet operations
#[derive(Error, Debug)]
pub enum SheetError {
    /// A required connection option is missing or empty
    #[error("parameter \"{0}\" is missing")]
    MissingParameter(&'static str),

    /// The record passed to an upsert has no value for the key column
    #[error(
        "Key is not specified. Set a value for \"{key_name}\" or set a different key name to use another attribute as key."
    )]
    MissingKey { key_name: String },

    /// The configured key name can never be a header
    #[error("Invalid key name \"{0}\": this field name is never written as a header")]
    InvalidKeyName(String),

    /// Column indices are 1-based; zero has no letter name
    #[error("Invalid column index: {0}")]
    InvalidColumnIndex(u32),

    /// Column names consist of the letters A-Z only
    #[error("Invalid column name: '{0}'")]
    InvalidColumnName(String),

    /// The header row of the target tab does not start with `date`
    #[error("The first column header must be 'date', found '{found}'")]
    HeaderMismatch { found: String },

    /// Service account key could not be read or used for signing
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    /// Token endpoint refused the signed assertion
    #[error("Authorization failed ({status}): {message}")]
    Auth { status: u16, message: String },

    /// Sheets API answered with a non-success status
    #[error("Spreadsheet API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network or HTTP level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON (de)serialization error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response was well-formed JSON but lacked something we need
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SheetError {
    /// Whether this error was raised before any remote call was attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SheetError::MissingParameter(_)
                | SheetError::MissingKey { .. }
                | SheetError::InvalidKeyName(_)
        )
    }
}

#[cfg(feature = "google-api")]
impl From<reqwest::Error> for SheetError {
    fn from(err: reqwest::Error) -> Self {
        SheetError::Transport(err.to_string())
    }
}

#[cfg(feature = "google-api")]
impl From<url::ParseError> for SheetError {
    fn from(err: url::ParseError) -> Self {
        SheetError::Transport(format!("invalid url: {}", err))
    }
}
