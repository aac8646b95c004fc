//! Configuration for the Google Sheets pipeline.
//!
//! `SheetsConfig` is built once, either in code with the `with_*` setters or
//! from a JSON document, and is never mutated by the pipeline afterwards.
//!
//! ```json
//! {
//!   "spreadsheet_id": "1eX8ftT1jKY2MyUcaHFV-Oo93qGP1NgHdcC-4MFm6UUc",
//!   "token_path": "resources/token.json",
//!   "export_fields": { "quote": "Quote", "author": "Author" },
//!   "replace_decimal_dot_with_comma": true
//! }
//! ```

use crate::error::PipelineError;
use crate::row::FieldSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings recognized by `GoogleSheetsPipeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Id of the spreadsheet rows are appended to.
    pub spreadsheet_id: Option<String>,
    /// Ordered field name to column label mapping. Empty means derive from
    /// the first item.
    #[serde(with = "ordered_fields")]
    pub export_fields: Vec<(String, String)>,
    /// Fallback mapping used when `export_fields` is empty, shared with the
    /// crawler's other feed exporters.
    #[serde(with = "ordered_fields")]
    pub feed_export_fields: Vec<(String, String)>,
    /// Write floats as `3,14` instead of `3.14`.
    pub replace_decimal_dot_with_comma: bool,
    /// Token file written by the offline authorization tool.
    pub token_path: Option<PathBuf>,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        SheetsConfig {
            spreadsheet_id: None,
            export_fields: Vec::new(),
            feed_export_fields: Vec::new(),
            replace_decimal_dot_with_comma: true,
            token_path: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SheetsConfig {
    /// Creates a config for `spreadsheet_id` with every other option at its default.
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        SheetsConfig {
            spreadsheet_id: Some(spreadsheet_id.into()),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigurationError(format!(
                "failed to read config file {:?}: {}",
                path, e
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parses a config from a JSON document.
    pub fn from_json_str(contents: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(contents)
            .map_err(|e| PipelineError::ConfigurationError(format!("invalid config: {}", e)))
    }

    /// Sets the `name -> label` export fields, in column order.
    pub fn with_export_fields<N, L>(mut self, fields: impl IntoIterator<Item = (N, L)>) -> Self
    where
        N: Into<String>,
        L: Into<String>,
    {
        self.export_fields = fields
            .into_iter()
            .map(|(n, l)| (n.into(), l.into()))
            .collect();
        self
    }

    /// Sets the fallback fields used when no export fields are configured.
    pub fn with_feed_export_fields<N, L>(mut self, fields: impl IntoIterator<Item = (N, L)>) -> Self
    where
        N: Into<String>,
        L: Into<String>,
    {
        self.feed_export_fields = fields
            .into_iter()
            .map(|(n, l)| (n.into(), l.into()))
            .collect();
        self
    }

    /// Enables or disables the decimal comma for float values.
    pub fn with_replace_decimal_dot_with_comma(mut self, replace: bool) -> Self {
        self.replace_decimal_dot_with_comma = replace;
        self
    }

    /// Sets the path of the stored access token.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the per-request timeout, truncated to whole seconds.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the spreadsheet id, failing if it is missing or blank.
    pub fn spreadsheet_id(&self) -> Result<&str, PipelineError> {
        match self.spreadsheet_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(PipelineError::ConfigurationError(
                "spreadsheet id is not set".to_string(),
            )),
        }
    }

    /// Returns the configured export spec, falling back to the feed export
    /// fields. An empty spec means it will be derived from the first item.
    pub fn field_spec(&self) -> Result<FieldSpec, PipelineError> {
        let fields = if !self.export_fields.is_empty() {
            &self.export_fields
        } else {
            &self.feed_export_fields
        };
        FieldSpec::from_pairs(fields.iter().cloned())
    }

    /// Checks the options needed before any request is made.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.spreadsheet_id()?;
        self.field_spec()?;
        if self.api_base_url.trim().is_empty() {
            return Err(PipelineError::ConfigurationError(
                "api base url is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// (De)serializes an ordered `name -> label` list as a JSON object, keeping
/// key order and duplicate keys so validation can reject them.
mod ordered_fields {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(fields: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, label) in fields {
            map.serialize_entry(name, label)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to column labels")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, label)) = access.next_entry::<String, String>()? {
                    fields.push((name, label));
                }
                Ok(fields)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Vec::new())
            }
        }

        deserializer.deserialize_any(FieldsVisitor)
    }
}
