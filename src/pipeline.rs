//! The item pipeline contract.
//!
//! A crawler hands every scraped item to its pipelines in order. Each
//! pipeline may store the item somewhere, pass it on unchanged, or drop it.
//! Export pipelines such as `GoogleSheetsPipeline` always pass the item on,
//! so they can be chained with others.
//!
//! Pipelines that learn something from the items they see (for example the
//! column layout derived from the first item) can expose it through
//! `get_state` so a resumed crawl writes the same layout.

use crate::error::PipelineError;
use crate::item::ScrapedItem;
use async_trait::async_trait;
use serde_json::Value;

/// A stage that receives every scraped item.
#[async_trait]
pub trait Pipeline<I: ScrapedItem>: Send + Sync + 'static {
    /// Returns the name of the pipeline.
    fn name(&self) -> &str;

    /// Processes a single item.
    ///
    /// Returns `Ok(Some(item))` to pass the item on, `Ok(None)` to drop it.
    /// Errors are returned to the crawler, which owns the retry decision.
    async fn process_item(&self, item: I) -> Result<Option<I>, PipelineError>;

    /// Called once when the crawl ends.
    async fn close(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Returns state to checkpoint, if the pipeline has any.
    async fn get_state(&self) -> Result<Option<Value>, PipelineError> {
        Ok(None)
    }

    /// Restores state previously returned by `get_state`.
    async fn restore_state(&self, _state: Value) -> Result<(), PipelineError> {
        Ok(())
    }
}
