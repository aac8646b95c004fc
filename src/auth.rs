//! Loading the persisted Sheets access token.
//!
//! The pipeline never runs the interactive OAuth flow. A separate tool
//! authorizes once and writes the resulting credentials as JSON; this module
//! only reads that file back. Both the `token` key written by Google's auth
//! libraries and a plain `access_token` key are accepted.

use crate::error::PipelineError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// OAuth scope granting read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Credentials persisted by the offline authorization tool.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(alias = "access_token")]
    token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    expiry: Option<String>,
}

impl StoredToken {
    /// Wraps a bare access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        StoredToken {
            token: access_token.into(),
            refresh_token: None,
            token_uri: None,
            client_id: None,
            client_secret: None,
            scopes: Vec::new(),
            expiry: None,
        }
    }

    /// Reads and parses the token file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        debug!("Loading Sheets token from {:?}", path);
        let contents = fs::read_to_string(path).map_err(|e| {
            PipelineError::AuthenticationUnavailable(format!(
                "failed to read token file {:?}: {}",
                path, e
            ))
        })?;
        let token: StoredToken = serde_json::from_str(&contents).map_err(|e| {
            PipelineError::AuthenticationUnavailable(format!(
                "failed to parse token file {:?}: {}",
                path, e
            ))
        })?;
        if token.token.trim().is_empty() {
            return Err(PipelineError::AuthenticationUnavailable(format!(
                "token file {:?} has an empty access token",
                path
            )));
        }
        if !token.scopes.is_empty() && !token.has_scope(SPREADSHEETS_SCOPE) {
            warn!(
                "Token in {:?} was not issued for {}, appends may be rejected",
                path, SPREADSHEETS_SCOPE
            );
        }
        Ok(token)
    }

    /// The bearer token sent with every request.
    pub fn access_token(&self) -> &str {
        &self.token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expiry(&self) -> Option<&str> {
        self.expiry.as_deref()
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Whether the token was issued for `scope`.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

impl fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredToken")
            .field("token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}
