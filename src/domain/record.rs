//! Free-form records awaiting human review.
//!
//! A [`Record`] is an ordered key → value(s) mapping. Keys carry no schema;
//! a key seen once holds a scalar, and every further occurrence of the same
//! key promotes it to an ordered sequence.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value of a record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// All values, a scalar being a one-element slice
    pub fn values(&self) -> &[String] {
        match self {
            FieldValue::Scalar(value) => std::slice::from_ref(value),
            FieldValue::List(values) => values,
        }
    }

    /// First value, if any
    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }

    /// Apply the promotion rule for one more occurrence of the same key
    fn push(&mut self, value: String) {
        match self {
            FieldValue::Scalar(first) => {
                let first = std::mem::take(first);
                *self = FieldValue::List(vec![first, value]);
            }
            FieldValue::List(values) => values.push(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::List(values)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// One reviewable entity (an item, a label assignment, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `key`.
    ///
    /// The first occurrence stores a scalar; the second turns it into a
    /// two-element sequence; later ones append.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.fields.entry(key.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
            Entry::Vacant(entry) => {
                entry.insert(FieldValue::Scalar(value));
            }
        }
    }

    /// Replace the value of `key`, keeping its position if already present
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// First value of `key`
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::first)
    }

    /// All values of `key` (empty if absent)
    pub fn values(&self, key: &str) -> &[String] {
        self.get(key).map(FieldValue::values).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Short human label used in diagnostics (the `name` field, else the first value)
    pub fn label(&self) -> String {
        self.first("name")
            .or_else(|| self.fields.values().find_map(FieldValue::first))
            .unwrap_or("<empty record>")
            .to_string()
    }
}

/// Records nested under a header (for intake, a location path or id)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub header: String,
    pub records: Vec<Record>,
}

impl Group {
    pub fn new(header: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            header: header.into(),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_promotes_scalar_then_appends() {
        let mut record = Record::new();
        record.push("labels", "Tools");
        assert_eq!(record.get("labels"), Some(&FieldValue::from("Tools")));

        record.push("labels", "Garage");
        record.push("labels", "Metal");
        assert_eq!(
            record.get("labels"),
            Some(&FieldValue::from(vec!["Tools", "Garage", "Metal"]))
        );
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let record = Record::new()
            .with("quantity", "2")
            .with("name", "Hammer")
            .with("quantity", "3");

        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["quantity", "name"]);
        assert_eq!(record.first("quantity"), Some("3"));
    }

    #[test]
    fn test_serializes_as_plain_json_object() {
        let record = Record::new()
            .with("name", "Hammer")
            .with("labels", vec!["Tools", "Metal"]);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"Hammer","labels":["Tools","Metal"]}"#);

        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_label_falls_back_to_first_value() {
        assert_eq!(Record::new().with("name", "Saw").label(), "Saw");
        assert_eq!(Record::new().with("id", "i-1").label(), "i-1");
        assert_eq!(Record::new().label(), "<empty record>");
    }
}
