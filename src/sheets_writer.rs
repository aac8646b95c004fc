//! Item Pipeline for appending scraped items to a Google Sheets spreadsheet.
//!
//! This module provides the `GoogleSheetsPipeline`, an item pipeline that
//! writes every `ScrapedItem` it receives as one new row at the end of a
//! spreadsheet, using the Sheets `values.append` call.
//!
//! Key features include:
//! - Configurable columns: the exported fields and their order come from
//!   `SheetsConfig`, or are inferred from the fields of the first item
//!   processed and then kept for the rest of the crawl.
//! - Per-field serializers, applied before a value is written to its cell.
//! - Optional decimal comma for float values, for locales that expect one.
//! - User-entered value input, so the sheet parses numbers and dates itself.
//! - State persistence: the inferred columns can be saved and restored to
//!   support crawler checkpointing.
//!
//! Each item results in exactly one append request. Failed requests are
//! returned to the crawler as-is; nothing is retried or deduplicated here.

use crate::client::{SheetsClient, ValueInputOption};
use crate::column::column_letter;
use crate::config::SheetsConfig;
use crate::error::PipelineError;
use crate::item::{ScrapedItem, Serializer};
use crate::pipeline::Pipeline;
use crate::row::{build_row, derive_field_spec, FieldSpec};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

#[cfg(feature = "http-client")]
use crate::auth::StoredToken;
#[cfg(feature = "http-client")]
use crate::client::HttpSheetsClient;

#[derive(Serialize, Deserialize)]
struct SheetsWriterState {
    fields: FieldSpec,
}

/// A pipeline that appends each scraped item as a row of a Google Sheet.
pub struct GoogleSheetsPipeline<I: ScrapedItem> {
    spreadsheet_id: String,
    client: Arc<dyn SheetsClient>,
    field_spec: OnceCell<Arc<FieldSpec>>,
    replace_decimal_dot_with_comma: bool,
    rows_appended: AtomicU64,
    _phantom: PhantomData<I>,
}

impl<I: ScrapedItem> GoogleSheetsPipeline<I> {
    /// Creates a pipeline that appends through an already authenticated client.
    pub fn new(config: SheetsConfig, client: Arc<dyn SheetsClient>) -> Result<Self, PipelineError> {
        config.validate()?;
        let spreadsheet_id = config.spreadsheet_id()?.to_string();
        let spec = config.field_spec()?;

        if spec.is_empty() {
            info!(
                "Initializing GoogleSheetsPipeline for spreadsheet {}, export fields will be taken from the first item",
                spreadsheet_id
            );
        } else {
            info!(
                "Initializing GoogleSheetsPipeline for spreadsheet {} with export fields: {:?}",
                spreadsheet_id,
                spec.names().collect::<Vec<_>>()
            );
        }

        let field_spec = if spec.is_empty() {
            OnceCell::new()
        } else {
            OnceCell::new_with(Some(Arc::new(spec)))
        };

        Ok(GoogleSheetsPipeline {
            spreadsheet_id,
            client,
            field_spec,
            replace_decimal_dot_with_comma: config.replace_decimal_dot_with_comma,
            rows_appended: AtomicU64::new(0),
            _phantom: PhantomData,
        })
    }

    /// Creates a pipeline that talks to the Sheets API directly, using the
    /// token file named by `config.token_path`.
    #[cfg(feature = "http-client")]
    pub fn from_config(config: SheetsConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let token_path = config.token_path.as_ref().ok_or_else(|| {
            PipelineError::AuthenticationUnavailable("no token path configured".to_string())
        })?;
        let token = StoredToken::load(token_path)?;
        let client = HttpSheetsClient::new(token, &config.api_base_url, config.request_timeout())?;
        Self::new(config, Arc::new(client))
    }

    /// Attaches a serializer to one of the configured export fields.
    pub fn with_serializer(mut self, field: &str, serializer: Serializer) -> Result<Self, PipelineError> {
        match self.field_spec.get_mut() {
            Some(spec) => {
                Arc::make_mut(spec).set_serializer(field, serializer)?;
                Ok(self)
            }
            None => Err(PipelineError::ConfigurationError(format!(
                "cannot attach serializer to '{}' before export fields are configured",
                field
            ))),
        }
    }

    /// Number of rows appended so far.
    pub fn rows_appended(&self) -> u64 {
        self.rows_appended.load(Ordering::Relaxed)
    }

    /// Returns the configured spec, deriving it from `item` the first time.
    ///
    /// Concurrent first calls wait for a single derivation and then share its
    /// result. An empty derived spec fails with `EmptyExportSpec` and is not
    /// kept, so a later item can still define the columns.
    async fn resolve_field_spec(&self, item: &I) -> Result<Arc<FieldSpec>, PipelineError> {
        let spec = self
            .field_spec
            .get_or_try_init(|| async {
                let spec = derive_field_spec(item)?;
                if spec.is_empty() {
                    debug!("First item has no fields, export fields stay unresolved");
                    return Err(PipelineError::EmptyExportSpec);
                }
                info!(
                    "Export fields derived from first item: {:?}",
                    spec.names().collect::<Vec<_>>()
                );
                Ok(Arc::new(spec))
            })
            .await?;
        Ok(Arc::clone(spec))
    }
}

#[async_trait]
impl<I: ScrapedItem> Pipeline<I> for GoogleSheetsPipeline<I> {
    fn name(&self) -> &str {
        "GoogleSheetsPipeline"
    }

    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError> {
        debug!("GoogleSheetsPipeline processing item.");
        let spec = self.resolve_field_spec(&item).await?;

        let row = build_row(&item, &spec, self.replace_decimal_dot_with_comma);
        let range = format!("A:{}", column_letter(spec.len())?);

        match self
            .client
            .append_row(&self.spreadsheet_id, &range, row, ValueInputOption::UserEntered)
            .await
        {
            Ok(response) => {
                self.rows_appended.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Appended row to {} ({})",
                    self.spreadsheet_id,
                    response.updates.updated_range.as_deref().unwrap_or(&range)
                );
            }
            Err(e) => {
                error!(
                    "Failed to append item to spreadsheet {}: {}",
                    self.spreadsheet_id, e
                );
                return Err(e);
            }
        }

        Ok(Some(item))
    }

    async fn close(&self) -> Result<(), PipelineError> {
        info!(
            "Closing GoogleSheetsPipeline after appending {} rows to spreadsheet {}.",
            self.rows_appended(),
            self.spreadsheet_id
        );
        Ok(())
    }

    async fn get_state(&self) -> Result<Option<Value>, PipelineError> {
        match self.field_spec.get() {
            Some(spec) => {
                let state = SheetsWriterState {
                    fields: FieldSpec::clone(spec),
                };
                Ok(Some(serde_json::to_value(state)?))
            }
            None => Ok(None),
        }
    }

    async fn restore_state(&self, state: Value) -> Result<(), PipelineError> {
        let restored: SheetsWriterState = serde_json::from_value(state)?;
        let restored = FieldSpec::from_entries(restored.fields.entries().to_vec())?;

        if restored.is_empty() {
            warn!("Ignoring restored GoogleSheetsPipeline state with no export fields.");
            return Ok(());
        }

        let names = restored.names().map(str::to_string).collect::<Vec<_>>();
        match self.field_spec.set(Arc::new(restored)) {
            Ok(()) => info!(
                "GoogleSheetsPipeline state restored with export fields: {:?}",
                names
            ),
            Err(_) => {
                warn!("Ignoring restored GoogleSheetsPipeline state, export fields are already set.")
            }
        }
        Ok(())
    }
}
