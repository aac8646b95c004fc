//! # spider-sheets-pipeline
//!
//! An item pipeline that appends every scraped item as a row of a Google
//! Sheets spreadsheet.
//!
//! Items are mapped to rows by a field spec, either configured or inferred
//! from the first item. Each item becomes exactly one `values.append` call
//! against the range `A:<last column>`, with user-entered value input so the
//! sheet applies its own number and date parsing.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spider_sheets_pipeline::config::SheetsConfig;
//! use spider_sheets_pipeline::sheets_writer::GoogleSheetsPipeline;
//!
//! let config = SheetsConfig::new("1eX8ftT1jKY2MyUcaHFV-Oo93qGP1NgHdcC-4MFm6UUc")
//!     .with_token_path("resources/token.json")
//!     .with_export_fields([("quote", "Quote"), ("author", "Author")]);
//!
//! let crawler = CrawlerBuilder::new(QuotesSpider)
//!     .add_pipeline(GoogleSheetsPipeline::from_config(config)?)
//!     .build()
//!     .await?;
//! ```

pub mod auth;
pub mod client;
pub mod column;
pub mod config;
pub mod error;
pub mod item;
pub mod pipeline;
pub mod row;
pub mod sheets_writer;

pub use error::PipelineError;
pub use item::ScrapedItem;
pub use pipeline::Pipeline;
pub use sheets_writer::GoogleSheetsPipeline;
