//! Attribute maps and tri-state field lookup.
//!
//! Entity states are flat maps of attribute name to JSON value. Inside a
//! diff, a key that is absent means "not touched" (or, for full states,
//! "not present"), which is different from a key explicitly set to `null`.
//! [`FieldValue`] keeps that distinction explicit.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Attribute name to value map describing (part of) an entity state.
pub type AttrMap = BTreeMap<String, Value>;

/// The value of one attribute as seen through an optional attribute map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// The key is absent (or the whole map is absent).
    Unset,
    /// The key is present with an explicit JSON `null`.
    Null,
    /// The key is present with a non-null value.
    Value(Value),
}

impl FieldValue {
    /// Look up `key` in an optional map.
    pub fn lookup(map: Option<&AttrMap>, key: &str) -> Self {
        Self::from_option(map.and_then(|m| m.get(key)))
    }

    /// Classify an optional JSON value.
    pub fn from_option(value: Option<&Value>) -> Self {
        match value {
            None => Self::Unset,
            Some(Value::Null) => Self::Null,
            Some(v) => Self::Value(v.clone()),
        }
    }

    /// Convert back into an optional JSON value (`Unset` becomes `None`).
    pub fn into_option(self) -> Option<Value> {
        match self {
            Self::Unset => None,
            Self::Null => Some(Value::Null),
            Self::Value(v) => Some(v),
        }
    }

    /// Returns `true` if the key is absent.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Write this value into `map` under `key`, removing the key when unset.
    pub fn write_into(self, map: &mut AttrMap, key: &str) {
        match self.into_option() {
            Some(v) => {
                map.insert(key.to_string(), v);
            }
            None => {
                map.remove(key);
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("<unset>"),
            Self::Null => f.write_str("null"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> AttrMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn lookup_distinguishes_absent_and_null() {
        let m = map(&[("a", json!(null)), ("b", json!("x"))]);
        assert_eq!(FieldValue::lookup(Some(&m), "a"), FieldValue::Null);
        assert_eq!(FieldValue::lookup(Some(&m), "b"), FieldValue::Value(json!("x")));
        assert_eq!(FieldValue::lookup(Some(&m), "c"), FieldValue::Unset);
        assert_eq!(FieldValue::lookup(None, "a"), FieldValue::Unset);
    }

    #[test]
    fn write_into_removes_unset() {
        let mut m = map(&[("a", json!(1))]);
        FieldValue::Unset.write_into(&mut m, "a");
        assert!(m.is_empty());
        FieldValue::Null.write_into(&mut m, "b");
        assert_eq!(m.get("b"), Some(&Value::Null));
    }

    #[test]
    fn display() {
        assert_eq!(FieldValue::Unset.to_string(), "<unset>");
        assert_eq!(FieldValue::Value(json!("t")).to_string(), "\"t\"");
    }
}
