//! Transport to the Google Sheets `values.append` endpoint.
//!
//! `SheetsClient` is the seam between the pipeline and the remote store: the
//! pipeline hands it one row and a range, and gets back either the API's
//! append summary or a `RemoteWriteFailure`. `HttpSheetsClient` implements it
//! over HTTPS with `reqwest` and a pre-issued bearer token.
//!
//! See <https://developers.google.com/sheets/api/guides/values#append_values>.

use crate::error::PipelineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "http-client")]
pub use self::http::HttpSheetsClient;

/// How the remote store interprets appended values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    /// Stored exactly as sent, always as text.
    Raw,
    /// Parsed as if typed into the sheet, so numbers and dates are coerced.
    UserEntered,
}

impl ValueInputOption {
    /// Query parameter value expected by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

/// Request body of an append call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    pub major_dimension: String,
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    /// Builds the body for appending a single row to `range`.
    pub fn single_row(range: impl Into<String>, row: Vec<String>) -> Self {
        ValueRange {
            range: range.into(),
            major_dimension: "ROWS".to_string(),
            values: vec![row],
        }
    }
}

/// Summary of the cells an append call wrote.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    pub spreadsheet_id: Option<String>,
    pub updated_range: Option<String>,
    pub updated_rows: Option<u64>,
    pub updated_columns: Option<u64>,
    pub updated_cells: Option<u64>,
}

/// Response of an append call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    pub spreadsheet_id: Option<String>,
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: UpdateValuesResponse,
}

/// An authenticated handle able to append rows to a spreadsheet.
#[async_trait]
pub trait SheetsClient: Send + Sync {
    /// Appends `row` after the table found in `range` of `spreadsheet_id`.
    async fn append_row(
        &self,
        spreadsheet_id: &str,
        range: &str,
        row: Vec<String>,
        value_input_option: ValueInputOption,
    ) -> Result<AppendResponse, PipelineError>;
}

#[cfg(feature = "http-client")]
mod http {
    use super::{AppendResponse, SheetsClient, ValueInputOption, ValueRange};
    use crate::auth::StoredToken;
    use crate::error::PipelineError;
    use async_trait::async_trait;
    use log::{debug, trace, warn};
    use reqwest::Url;
    use std::time::Duration;

    /// `SheetsClient` backed by the Sheets v4 REST API.
    pub struct HttpSheetsClient {
        http: reqwest::Client,
        base_url: Url,
        token: StoredToken,
    }

    impl HttpSheetsClient {
        /// Builds a client for the API rooted at `base_url`, failing on URLs that
        /// cannot take path segments.
        pub fn new(
            token: StoredToken,
            base_url: &str,
            timeout: Duration,
        ) -> Result<Self, PipelineError> {
            let base_url = Url::parse(base_url).map_err(|e| {
                PipelineError::ConfigurationError(format!(
                    "invalid api base url '{}': {}",
                    base_url, e
                ))
            })?;
            if base_url.cannot_be_a_base() {
                return Err(PipelineError::ConfigurationError(format!(
                    "api base url '{}' cannot be used as a base",
                    base_url
                )));
            }
            let http = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| {
                    PipelineError::ConfigurationError(format!(
                        "failed to build HTTP client: {}",
                        e
                    ))
                })?;
            debug!("Sheets HTTP client ready for {}", base_url);
            Ok(HttpSheetsClient {
                http,
                base_url,
                token,
            })
        }

        /// `{base}/v4/spreadsheets/{id}/values/{range}:append?valueInputOption=...`
        pub fn append_url(
            &self,
            spreadsheet_id: &str,
            range: &str,
            value_input_option: ValueInputOption,
        ) -> Result<Url, PipelineError> {
            let append_segment = format!("{}:append", range);
            let mut url = self.base_url.clone();
            url.path_segments_mut()
                .map_err(|_| {
                    PipelineError::ConfigurationError(format!(
                        "api base url '{}' cannot be used as a base",
                        self.base_url
                    ))
                })?
                .pop_if_empty()
                .extend([
                    "v4",
                    "spreadsheets",
                    spreadsheet_id,
                    "values",
                    append_segment.as_str(),
                ]);
            url.query_pairs_mut()
                .append_pair("valueInputOption", value_input_option.as_str());
            Ok(url)
        }
    }

    #[async_trait]
    impl SheetsClient for HttpSheetsClient {
        async fn append_row(
            &self,
            spreadsheet_id: &str,
            range: &str,
            row: Vec<String>,
            value_input_option: ValueInputOption,
        ) -> Result<AppendResponse, PipelineError> {
            let url = self.append_url(spreadsheet_id, range, value_input_option)?;
            let body = ValueRange::single_row(range, row);
            trace!("POST {} with {} cells", url, body.values[0].len());

            let response = self
                .http
                .post(url)
                .bearer_auth(self.token.access_token())
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
                return Err(PipelineError::RemoteWriteFailure {
                    status: Some(status.as_u16()),
                    message,
                });
            }

            // 2xx means the row is stored; the summary is informational.
            let appended = match response.text().await {
                Ok(body) => serde_json::from_str::<AppendResponse>(&body).unwrap_or_else(|e| {
                    warn!("Row appended but the append summary could not be parsed: {}", e);
                    AppendResponse::default()
                }),
                Err(e) => {
                    warn!("Row appended but the append summary could not be read: {}", e);
                    AppendResponse::default()
                }
            };
            trace!("Append response: {:?}", appended);
            Ok(appended)
        }
    }
}
