//! Turning scraped items into spreadsheet rows.
//!
//! A `FieldSpec` fixes which item fields become columns and in what order.
//! It is either configured up front or derived from the first item the
//! pipeline sees, and from then on every row has exactly one cell per entry:
//! fields missing from an item become empty cells and unlisted fields
//! are ignored.
//!
//! Each value passes through its field's serializer before being rendered to
//! text. Floating-point results can have their decimal dot replaced by a
//! comma for locales that expect one; the decision is made on the serialized
//! value's type, so text that merely looks like a number is left alone.

use crate::error::PipelineError;
use crate::item::{ItemShape, ScrapedItem, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// One exported column: the item field it reads and the header it is known by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub label: String,
    #[serde(skip)]
    pub serializer: Option<Serializer>,
}

impl FieldEntry {
    /// Creates an entry for item field `name` with column label `label`.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        FieldEntry {
            name: name.into(),
            label: label.into(),
            serializer: None,
        }
    }

    /// Attaches a serializer that overrides any the item declares.
    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = Some(serializer);
        self
    }
}

/// Ordered, key-unique list of exported fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSpec {
    entries: Vec<FieldEntry>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a spec from entries, rejecting duplicate field names.
    pub fn from_entries(entries: Vec<FieldEntry>) -> Result<Self, PipelineError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(PipelineError::ConfigurationError(format!(
                    "duplicate export field '{}'",
                    entry.name
                )));
            }
        }
        Ok(FieldSpec { entries })
    }

    /// Builds a spec from `(name, label)` pairs.
    pub fn from_pairs<N, L>(pairs: impl IntoIterator<Item = (N, L)>) -> Result<Self, PipelineError>
    where
        N: Into<String>,
        L: Into<String>,
    {
        Self::from_entries(
            pairs
                .into_iter()
                .map(|(name, label)| FieldEntry::new(name, label))
                .collect(),
        )
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in column order.
    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    /// Field names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Looks up the entry for field `name`.
    pub fn get(&self, name: &str) -> Option<&FieldEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Attaches a serializer to an existing field.
    pub fn set_serializer(&mut self, name: &str, serializer: Serializer) -> Result<(), PipelineError> {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.serializer = Some(serializer);
                Ok(())
            }
            None => Err(PipelineError::ConfigurationError(format!(
                "cannot attach serializer to unknown field '{}'",
                name
            ))),
        }
    }
}

/// Derives an identity-labelled spec from an item's fields.
///
/// Declared fields are preferred, in declaration order and with their
/// serializers; otherwise the keys of the item's JSON object are used in
/// insertion order.
pub fn derive_field_spec<I: ScrapedItem>(item: &I) -> Result<FieldSpec, PipelineError> {
    let entries = match ItemShape::of(item) {
        ItemShape::Declared(fields) => fields
            .into_iter()
            .map(|f| FieldEntry {
                label: f.name.clone(),
                name: f.name,
                serializer: f.serializer,
            })
            .collect(),
        ItemShape::Dynamic(map) => map
            .keys()
            .map(|k| FieldEntry::new(k.clone(), k.clone()))
            .collect(),
        ItemShape::Opaque => {
            return Err(PipelineError::UnresolvableSchema {
                type_name: std::any::type_name::<I>().to_string(),
            })
        }
    };
    FieldSpec::from_entries(entries)
}

/// Builds one row of cells for `item`, one per entry of `spec`.
pub fn build_row<I: ScrapedItem>(
    item: &I,
    spec: &FieldSpec,
    replace_decimal_dot_with_comma: bool,
) -> Vec<String> {
    let item_value = item.to_json_value();
    let declared = item.declared_fields().unwrap_or_default();
    let missing = Value::String(String::new());

    spec.entries()
        .iter()
        .map(|entry| {
            let value = item_value.get(&entry.name).unwrap_or(&missing);
            let serializer = entry.serializer.as_ref().or_else(|| {
                declared
                    .iter()
                    .find(|f| f.name == entry.name)
                    .and_then(|f| f.serializer.as_ref())
            });
            let serialized = match serializer {
                Some(s) => s.apply(value),
                None => value.clone(),
            };
            cell_text(&serialized, replace_decimal_dot_with_comma)
        })
        .collect()
}

/// Renders a serialized value as cell text.
pub fn cell_text(value: &Value, replace_decimal_dot_with_comma: bool) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() && replace_decimal_dot_with_comma => {
            n.to_string().replace('.', ",")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::FieldDef;
    use serde_json::json;

    #[derive(Debug)]
    struct Product {
        name: String,
        price: f64,
    }

    impl ScrapedItem for Product {
        fn to_json_value(&self) -> Value {
            json!({ "price": self.price, "name": self.name })
        }

        fn declared_fields(&self) -> Option<Vec<FieldDef>> {
            Some(vec![
                FieldDef::new("name").with_serializer(Serializer::new(|v| {
                    Value::String(v.as_str().unwrap_or_default().trim().to_string())
                })),
                FieldDef::new("price"),
            ])
        }
    }

    #[derive(Debug)]
    struct Opaque;

    impl ScrapedItem for Opaque {
        fn to_json_value(&self) -> Value {
            json!("not an object")
        }
    }

    #[test]
    fn builds_row_in_spec_order() {
        let spec = FieldSpec::from_pairs([("quote", "Quote"), ("author", "Author")]).unwrap();
        let item = json!({ "author": "Shakespeare", "quote": "To be or not to be" });

        let row = build_row(&item, &spec, true);
        assert_eq!(row, vec!["To be or not to be", "Shakespeare"]);
    }

    #[test]
    fn missing_fields_become_empty_cells() {
        let spec = FieldSpec::from_pairs([("a", "A"), ("b", "B"), ("c", "C")]).unwrap();
        let item = json!({ "a": "x", "c": 0 });

        assert_eq!(build_row(&item, &spec, true), vec!["x", "", "0"]);
    }

    #[test]
    fn falsy_values_are_not_blanked() {
        let spec = FieldSpec::from_pairs([("flag", "flag"), ("count", "count")]).unwrap();
        let item = json!({ "flag": false, "count": 0 });

        assert_eq!(build_row(&item, &spec, true), vec!["false", "0"]);
    }

    #[test]
    fn decimal_comma_applies_to_floats_only() {
        let spec = FieldSpec::from_pairs([("price", "Price"), ("version", "Version")]).unwrap();
        let item = json!({ "price": 3.14, "version": "v3.14" });

        assert_eq!(build_row(&item, &spec, true), vec!["3,14", "v3.14"]);
        assert_eq!(build_row(&item, &spec, false), vec!["3.14", "v3.14"]);
    }

    #[test]
    fn numeric_looking_text_is_left_alone() {
        let spec = FieldSpec::from_pairs([("n", "n")]).unwrap();
        let item = json!({ "n": "3.5" });

        assert_eq!(build_row(&item, &spec, true), vec!["3.5"]);
    }

    #[test]
    fn serializer_output_type_decides_decimal_comma() {
        let mut spec = FieldSpec::from_pairs([("price", "Price")]).unwrap();
        spec.set_serializer(
            "price",
            Serializer::new(|v| match v.as_str().and_then(|s| s.parse::<f64>().ok()) {
                Some(f) => json!(f),
                None => v.clone(),
            }),
        )
        .unwrap();
        let item = json!({ "price": "2.5" });

        assert_eq!(build_row(&item, &spec, true), vec!["2,5"]);
    }

    #[test]
    fn serializer_can_turn_float_into_text() {
        let mut spec = FieldSpec::from_pairs([("price", "Price")]).unwrap();
        spec.set_serializer(
            "price",
            Serializer::new(|v| Value::String(format!("${}", v))),
        )
        .unwrap();
        let item = json!({ "price": 9.99 });

        assert_eq!(build_row(&item, &spec, true), vec!["$9.99"]);
    }

    #[test]
    fn declared_serializer_is_used_and_spec_serializer_wins() {
        let product = Product {
            name: "  Widget ".into(),
            price: 1.5,
        };
        let derived = derive_field_spec(&product).unwrap();
        assert_eq!(build_row(&product, &derived, true), vec!["Widget", "1,5"]);

        let mut configured = FieldSpec::from_pairs([("name", "Name")]).unwrap();
        configured
            .set_serializer("name", Serializer::new(|_| json!("overridden")))
            .unwrap();
        assert_eq!(build_row(&product, &configured, true), vec!["overridden"]);
    }

    #[test]
    fn cell_text_renders_non_strings_as_json() {
        assert_eq!(cell_text(&json!(null), true), "");
        assert_eq!(cell_text(&json!(true), true), "true");
        assert_eq!(cell_text(&json!(42), true), "42");
        assert_eq!(cell_text(&json!(1.0), true), "1,0");
        assert_eq!(cell_text(&json!(["a", 1]), true), "[\"a\",1]");
        assert_eq!(cell_text(&json!({ "k": 1.5 }), true), "{\"k\":1.5}");
    }

    #[test]
    fn derives_spec_from_declared_fields() {
        let product = Product {
            name: "Widget".into(),
            price: 1.5,
        };
        let spec = derive_field_spec(&product).unwrap();

        assert_eq!(spec.names().collect::<Vec<_>>(), vec!["name", "price"]);
        assert_eq!(spec.labels().collect::<Vec<_>>(), vec!["name", "price"]);
        assert!(spec.get("name").unwrap().serializer.is_some());
    }

    #[test]
    fn derives_spec_from_object_key_order() {
        let item = json!({ "url": "https://example.com", "title": "Example", "rank": 3 });
        let spec = derive_field_spec(&item).unwrap();

        assert_eq!(spec.names().collect::<Vec<_>>(), vec!["url", "title", "rank"]);
    }

    #[test]
    fn opaque_items_cannot_derive_a_spec() {
        match derive_field_spec(&Opaque) {
            Err(PipelineError::UnresolvableSchema { type_name }) => {
                assert!(type_name.ends_with("Opaque"), "{}", type_name);
            }
            other => panic!("expected UnresolvableSchema, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let result = FieldSpec::from_pairs([("a", "A"), ("a", "Other")]);
        assert!(matches!(result, Err(PipelineError::ConfigurationError(_))));
    }

    #[test]
    fn serializer_for_unknown_field_is_rejected() {
        let mut spec = FieldSpec::from_pairs([("a", "A")]).unwrap();
        let result = spec.set_serializer("b", Serializer::new(|v| v.clone()));
        assert!(matches!(result, Err(PipelineError::ConfigurationError(_))));
    }

    #[test]
    fn row_width_matches_spec_for_sparse_items() {
        let spec = FieldSpec::from_pairs((0..40).map(|i| (format!("f{}", i), format!("F{}", i))))
            .unwrap();
        let item = json!({ "f3": "x", "unrelated": "y" });

        let row = build_row(&item, &spec, true);
        assert_eq!(row.len(), 40);
        assert_eq!(row[3], "x");
        assert!(row.iter().enumerate().all(|(i, c)| i == 3 || c.is_empty()));
    }
}
