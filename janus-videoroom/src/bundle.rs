//! Request context carried through every operation
//!
//! A [`Bundle`] is an ordered set of typed fields set by the caller before a
//! command is issued. Once wrapped in a [`Context`] it is never mutated: the
//! adapter copies a bundle when it needs to annotate it.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared, read-only context handed to delegates and continuations
pub type Context = Arc<Bundle>;

/// A single context value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl FieldValue {
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::String(_) => "string",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    fields: IndexMap<String, FieldValue>,
}

impl Bundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into a shareable [`Context`]
    #[must_use]
    pub fn into_context(self) -> Context {
        Arc::new(self)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.set(key, FieldValue::String(value.into()))
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.set(key, FieldValue::Int(value))
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.set(key, FieldValue::Bool(value))
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn with_string(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(key, FieldValue::String(value.into()))
    }

    #[must_use]
    pub fn with_int(self, key: impl Into<String>, value: i64) -> Self {
        self.with(key, FieldValue::Int(value))
    }

    #[must_use]
    pub fn with_bool(self, key: impl Into<String>, value: bool) -> Self {
        self.with(key, FieldValue::Bool(value))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::String(s)) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(FieldValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.fields.get(key) {
            Some(FieldValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Field value of any type; fails if absent
    pub fn require(&self, key: &str) -> Result<&FieldValue> {
        self.fields.get(key).ok_or_else(|| Error::missing(key))
    }

    pub fn require_int(&self, key: &str) -> Result<i64> {
        match self.require(key)? {
            FieldValue::Int(i) => Ok(*i),
            _ => Err(Error::invalid(key, "integer")),
        }
    }

    pub fn require_string(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            FieldValue::String(s) => Ok(s),
            _ => Err(Error::invalid(key, "string")),
        }
    }

    /// Boolean flag that may be absent; present values must be booleans
    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(FieldValue::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(Error::invalid(key, "boolean")),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let mut bundle = Bundle::new();
        bundle
            .set_int("room", 42069)
            .set_string("display", "yolo")
            .set_bool("audio", false);

        assert_eq!(bundle.get_int("room"), Some(42069));
        assert_eq!(bundle.get_string("display"), Some("yolo"));
        assert_eq!(bundle.get_bool("audio"), Some(false));
        assert_eq!(bundle.get_int("display"), None);
        assert_eq!(bundle.len(), 3);
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let bundle = Bundle::new().with_int("room", 1).with_int("room", 2);
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.get_int("room"), Some(2));
    }

    #[test]
    fn test_require_errors() {
        let bundle = Bundle::new().with_string("room", "lobby");
        assert!(matches!(
            bundle.require_int("feed"),
            Err(Error::MissingField { ref field }) if field == "feed"
        ));
        assert!(matches!(
            bundle.require_int("room"),
            Err(Error::InvalidField { expected: "integer", .. })
        ));
        assert_eq!(bundle.require_string("room").unwrap(), "lobby");
    }

    #[test]
    fn test_optional_bool() {
        let bundle = Bundle::new().with_bool("video", true).with_int("audio", 1);
        assert_eq!(bundle.optional_bool("video").unwrap(), Some(true));
        assert_eq!(bundle.optional_bool("data").unwrap(), None);
        assert!(bundle.optional_bool("audio").is_err());
    }

    #[test]
    fn test_field_value_serializes_untagged() {
        let values = vec![
            FieldValue::from(true),
            FieldValue::from(7_i64),
            FieldValue::from("text"),
        ];
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, serde_json::json!([true, 7, "text"]));
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let bundle = Bundle::new()
            .with_string("command", "attach")
            .with_int("feed", 420)
            .with_int("room", 69);
        let keys: Vec<&str> = bundle.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["command", "feed", "room"]);
    }
}
