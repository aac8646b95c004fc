//! Error type shared by every stage of the sheets pipeline.
//!
//! `PipelineError` covers both the configuration-level failures raised while
//! constructing a pipeline and the per-item failures raised by
//! `process_item`. None of them are retried internally; they are surfaced to
//! the crawler, which decides whether to retry the item or stop.

use thiserror::Error;

/// Errors produced while building rows or appending them to a sheet.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A column index outside `[1, 18278]`, or a value that is not an integer.
    #[error("Invalid column index: {0}")]
    InvalidColumnIndex(String),

    /// The item exposes neither declared fields nor a key/value view.
    #[error("Couldn't get export fields for item of type {type_name}")]
    UnresolvableSchema { type_name: String },

    /// The resolved export field spec has no fields.
    #[error("Export field spec is empty, nothing to append")]
    EmptyExportSpec,

    /// The persisted access token could not be loaded.
    #[error("Authentication unavailable: {0}")]
    AuthenticationUnavailable(String),

    /// The pipeline configuration is incomplete or inconsistent.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The remote store rejected the append or could not be reached.
    #[error("Remote write failed{}: {message}", status_suffix(.status))]
    RemoteWriteFailure {
        status: Option<u16>,
        message: String,
    },

    /// Pipeline state could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {}", code),
        None => String::new(),
    }
}

impl PipelineError {
    /// Whether the caller may reasonably retry the same item.
    ///
    /// Only transport failures qualify: connection errors (no status),
    /// rate limiting (429) and server errors (5xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::RemoteWriteFailure { status: None, .. } => true,
            PipelineError::RemoteWriteFailure {
                status: Some(code), ..
            } => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::RemoteWriteFailure {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
