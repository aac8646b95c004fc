//! The scraped item abstraction consumed by the sheets pipeline.
//!
//! A `ScrapedItem` is read two ways:
//! - through its key/value view, `to_json_value`, which every item provides;
//! - through an optional declared schema, `declared_fields`, for items whose
//!   field list is fixed at compile time. Declared fields may carry a
//!   serializer applied before the value is written to a cell.
//!
//! `ItemShape::of` probes those two capabilities in a fixed order so the row
//! builder never has to guess what kind of item it received.

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A unit of scraped data flowing through pipelines.
pub trait ScrapedItem: fmt::Debug + Send + Sync + 'static {
    /// Returns the item's key/value view. Objects keep insertion order.
    fn to_json_value(&self) -> Value;

    /// Returns the fixed, ordered field list for items with a declared schema.
    fn declared_fields(&self) -> Option<Vec<FieldDef>> {
        None
    }
}

impl ScrapedItem for Value {
    fn to_json_value(&self) -> Value {
        self.clone()
    }
}

/// A per-field value transformation applied before a value becomes a cell.
#[derive(Clone)]
pub struct Serializer(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Serializer {
    /// Wraps a value-to-value conversion.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Serializer(Arc::new(f))
    }

    /// Runs the conversion on `value`.
    pub fn apply(&self, value: &Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Serializer(..)")
    }
}

/// A field declared by an item with a fixed schema.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub serializer: Option<Serializer>,
}

impl FieldDef {
    /// Declares a field with no serializer.
    pub fn new(name: impl Into<String>) -> Self {
        FieldDef {
            name: name.into(),
            serializer: None,
        }
    }

    /// Attaches a serializer applied to this field's value.
    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = Some(serializer);
        self
    }
}

/// How an item exposes its fields, in order of preference.
#[derive(Debug)]
pub enum ItemShape {
    Declared(Vec<FieldDef>),
    Dynamic(Map<String, Value>),
    Opaque,
}

impl ItemShape {
    /// Probes `item` for declared fields first, then for a key/value view.
    pub fn of<I: ScrapedItem + ?Sized>(item: &I) -> Self {
        if let Some(fields) = item.declared_fields() {
            return ItemShape::Declared(fields);
        }
        match item.to_json_value() {
            Value::Object(map) => ItemShape::Dynamic(map),
            _ => ItemShape::Opaque,
        }
    }
}
