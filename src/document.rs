//! The finished document: root value, tag map, and version.

use crate::context::{TAG_BOOL, TAG_FLOAT, TAG_INT, TAG_MAP, TAG_NULL, TAG_SEQ, TAG_STR};
use crate::error::{ParseError, Result};
use crate::pointer;
use crate::value::Value;
use std::collections::BTreeMap;

/// One parsed YAML document.
///
/// Immutable once built: the root value plus the pointer-keyed tag map
/// accumulated during the parse and the `%YAML` version (defaulting to
/// 1.2).
#[derive(Debug)]
pub struct Document {
    root: Value,
    tags: BTreeMap<String, String>,
    version: (u32, u32),
}

impl Document {
    pub(crate) fn new(root: Value, tags: BTreeMap<String, String>, version: (u32, u32)) -> Self {
        Document {
            root,
            tags,
            version,
        }
    }

    /// The root value; null for an empty document.
    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn major_version(&self) -> u32 {
        self.version.0
    }

    pub fn minor_version(&self) -> u32 {
        self.version.1
    }

    /// The tag of the node at a JSON pointer.
    ///
    /// An explicitly recorded tag wins; otherwise the root is walked
    /// along the pointer and an existing node yields the default tag of
    /// its value kind. A pointer that resolves to nothing fails.
    pub fn get_tag(&self, pointer: &str) -> Result<String> {
        if let Some(tag) = self.tags.get(pointer) {
            return Ok(tag.clone());
        }
        match pointer::resolve(&self.root, pointer) {
            Some(node) => Ok(default_tag(node).to_string()),
            None => Err(ParseError::NoSuchNode(pointer.to_string())),
        }
    }

    /// Iterate the recorded pointer→tag pairs, for debugging.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(p, t)| (p.as_str(), t.as_str()))
    }
}

/// The YAML 1.2 canonical tag for a value kind.
pub(crate) fn default_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => TAG_NULL,
        Value::Bool(_) => TAG_BOOL,
        Value::Int(_) | Value::Long(_) => TAG_INT,
        Value::Decimal(_) => TAG_FLOAT,
        Value::String(_) => TAG_STR,
        Value::Sequence(_) => TAG_SEQ,
        Value::Mapping(_) => TAG_MAP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use indexmap::IndexMap;
    use std::str::FromStr;

    fn sample() -> Document {
        let mut entries = IndexMap::new();
        entries.insert("hr".to_string(), Value::Int(65));
        entries.insert(
            "avg".to_string(),
            Value::Decimal(BigDecimal::from_str("0.278").unwrap()),
        );
        entries.insert(
            "names".to_string(),
            Value::Sequence(vec![Value::String("a".to_string())]),
        );
        let mut tags = BTreeMap::new();
        tags.insert("/names/0".to_string(), "tag:example.com,2023:n".to_string());
        Document::new(Value::Mapping(entries), tags, (1, 2))
    }

    #[test]
    fn test_default_tags_from_kind() {
        let doc = sample();
        assert_eq!(doc.get_tag("").unwrap(), TAG_MAP);
        assert_eq!(doc.get_tag("/hr").unwrap(), TAG_INT);
        assert_eq!(doc.get_tag("/avg").unwrap(), TAG_FLOAT);
        assert_eq!(doc.get_tag("/names").unwrap(), TAG_SEQ);
    }

    #[test]
    fn test_explicit_tag_wins() {
        let doc = sample();
        assert_eq!(doc.get_tag("/names/0").unwrap(), "tag:example.com,2023:n");
    }

    #[test]
    fn test_missing_node_fails() {
        let doc = sample();
        let err = doc.get_tag("/nope").unwrap_err();
        assert!(err.to_string().contains("Node does not exist"));
    }

    #[test]
    fn test_tags_iterable() {
        let doc = sample();
        let pairs: Vec<_> = doc.tags().collect();
        assert_eq!(pairs, vec![("/names/0", "tag:example.com,2023:n")]);
    }
}
