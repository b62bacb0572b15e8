//! Entity references of the form `/<entity-kind>/<entity-id>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Characters that are forbidden in the kind segment.
const FORBIDDEN_KIND_CHARS: &[char] = &[' ', '\t', '\n', '\r', '/'];

/// Reference to one entity in the catalog, e.g. `/package/annie`.
///
/// The kind is the first path segment; everything after the second slash is
/// the entity id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityRef(String);

impl EntityRef {
    /// Parse and validate a reference string.
    pub fn parse(reference: &str) -> TypeResult<Self> {
        let invalid = |reason: &str| TypeError::InvalidRef {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let rest = reference
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;
        let (kind, id) = rest
            .split_once('/')
            .ok_or_else(|| invalid("expected /<kind>/<id>"))?;

        if kind.is_empty() {
            return Err(invalid("entity kind must not be empty"));
        }
        if kind.contains(FORBIDDEN_KIND_CHARS) {
            return Err(invalid("entity kind contains a forbidden character"));
        }
        if id.trim().is_empty() {
            return Err(invalid("entity id must not be empty"));
        }

        Ok(Self(reference.to_string()))
    }

    /// Build a reference from its parts.
    pub fn new(kind: &str, id: &str) -> TypeResult<Self> {
        Self::parse(&format!("/{kind}/{id}"))
    }

    /// The entity kind, e.g. `package`.
    pub fn kind(&self) -> &str {
        self.split().0
    }

    /// The entity id within its kind.
    pub fn id(&self) -> &str {
        self.split().1
    }

    /// The full reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> (&str, &str) {
        // Validated on construction.
        self.0[1..].split_once('/').unwrap_or(("", ""))
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({})", self.0)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EntityRef {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityRef> for String {
    fn from(reference: EntityRef) -> Self {
        reference.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_and_id() {
        let r = EntityRef::parse("/package/annie").unwrap();
        assert_eq!(r.kind(), "package");
        assert_eq!(r.id(), "annie");
        assert_eq!(r.as_str(), "/package/annie");
    }

    #[test]
    fn id_may_contain_slashes() {
        let r = EntityRef::parse("/resource/annie/data.csv").unwrap();
        assert_eq!(r.kind(), "resource");
        assert_eq!(r.id(), "annie/data.csv");
    }

    #[test]
    fn new_builds_reference() {
        let r = EntityRef::new("package", "annie").unwrap();
        assert_eq!(r.to_string(), "/package/annie");
    }

    #[test]
    fn rejects_malformed_refs() {
        for bad in ["", "package/annie", "/package", "//annie", "/package/", "/pack age/x"] {
            assert!(EntityRef::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn serde_validates() {
        let ok: EntityRef = serde_json::from_str("\"/package/x\"").unwrap();
        assert_eq!(ok.id(), "x");
        assert!(serde_json::from_str::<EntityRef>("\"nope\"").is_err());
    }
}
