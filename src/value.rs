//! The JSON-superset value model the parser builds into.

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use std::fmt;

/// A parsed value.
///
/// Structurally a superset of JSON: integers narrower than 32 bits are
/// held as `Int`, wider ones as `Long`, and everything else numeric as
/// an arbitrary-precision `Decimal`. Mappings preserve insertion order.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// Arbitrary-precision decimal number.
    Decimal(BigDecimal),
    /// UTF-8 string.
    String(String),
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
    /// Insertion-ordered string-keyed mapping.
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value widened to 64 bits if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns a reference to the decimal if this is a `Decimal`.
    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the items if this is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a reference to the entries if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// The kind name used in error messages and default-tag derivation.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::Long(_) => "int",
            Value::Decimal(_) => "float",
            Value::String(_) => "str",
            Value::Sequence(_) => "seq",
            Value::Mapping(_) => "map",
        }
    }

    /// Serialize to compact JSON text.
    ///
    /// Used for coercing non-string mapping keys. Decimals print in
    /// their plain notation.
    pub fn to_json_string(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    fn write_json(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Long(n) => out.push_str(&n.to_string()),
            Value::Decimal(d) => out.push_str(&d.to_string()),
            Value::String(s) => write_json_string(s, out),
            Value::Sequence(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_json(out);
                }
                out.push(']');
            }
            Value::Mapping(entries) => {
                out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_json_string(key, out);
                    out.push(':');
                    value.write_json(out);
                }
                out.push('}');
            }
        }
    }
}

/// Write a JSON string literal with the escapes JSON requires.
fn write_json_string(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0C' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}L", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Sequence(items) => f.debug_list().entries(items).finish(),
            Value::Mapping(entries) => f.debug_map().entries(entries).finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Mapping(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind_name(), "null");
        assert_eq!(Value::Int(1).kind_name(), "int");
        assert_eq!(Value::Long(1).kind_name(), "int");
        assert_eq!(
            Value::Decimal(BigDecimal::from_str("0.5").unwrap()).kind_name(),
            "float"
        );
        assert_eq!(Value::Sequence(vec![]).kind_name(), "seq");
    }

    #[test]
    fn test_json_string_escapes() {
        let v = Value::String("a\"b\\c\nd".to_string());
        assert_eq!(v.to_json_string(), r#""a\"b\\c\nd""#);
    }

    #[test]
    fn test_json_compound() {
        let mut map = IndexMap::new();
        map.insert(
            "k".to_string(),
            Value::Sequence(vec![Value::Int(1), Value::Null]),
        );
        assert_eq!(Value::Mapping(map).to_json_string(), r#"{"k":[1,null]}"#);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int(7).as_i64(), Some(7));
        assert_eq!(Value::Long(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
        assert!(Value::Int(7).as_str().is_none());
    }
}
