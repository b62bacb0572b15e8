//! Conflicts between two change lists and how to settle them.

use std::fmt;

use changes_types::{AttrMap, EntityRef, FieldValue};
use serde_json::Value;

/// Two sides disagree about an entity since their common base.
///
/// A conflict is either attribute-level (`field` is set, the values are that
/// attribute's values) or entity-level (`field` is `None`: one side deleted
/// the entity while the other edited it, and the values are whole states).
///
/// "Closing" is the incoming side (the branch being merged in, or the change
/// being applied); "continuing" is the side that is kept (the line the merge
/// follows, or the live state).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub entity: EntityRef,
    pub field: Option<String>,
    pub base: FieldValue,
    pub closing: FieldValue,
    pub continuing: FieldValue,
}

impl Conflict {
    /// Attribute-level conflict.
    pub fn on_field(
        entity: EntityRef,
        field: impl Into<String>,
        base: FieldValue,
        closing: FieldValue,
        continuing: FieldValue,
    ) -> Self {
        Self {
            entity,
            field: Some(field.into()),
            base,
            closing,
            continuing,
        }
    }

    /// Entity-level conflict between whole states (`None` = deleted).
    pub fn on_entity(
        entity: EntityRef,
        base: Option<&AttrMap>,
        closing: Option<&AttrMap>,
        continuing: Option<&AttrMap>,
    ) -> Self {
        Self {
            entity,
            field: None,
            base: state_value(base),
            closing: state_value(closing),
            continuing: state_value(continuing),
        }
    }

    pub fn is_entity_level(&self) -> bool {
        self.field.is_none()
    }

    /// The value the given resolution keeps, `None` for [`Resolution::Drop`].
    pub fn winner(&self, resolution: Resolution) -> Option<&FieldValue> {
        match resolution {
            Resolution::Closing => Some(&self.closing),
            Resolution::Continuing => Some(&self.continuing),
            Resolution::Drop => None,
        }
    }
}

fn state_value(state: Option<&AttrMap>) -> FieldValue {
    match state {
        Some(map) => FieldValue::Value(Value::Object(
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )),
        None => FieldValue::Unset,
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => writeln!(f, "conflict on {} [{field}]", self.entity)?,
            None => writeln!(f, "conflict on {} (deleted on one side, edited on the other)", self.entity)?,
        }
        writeln!(f, "  base:       {}", self.base)?;
        writeln!(f, "  closing:    {}", self.closing)?;
        write!(f, "  continuing: {}", self.continuing)
    }
}

/// How a single conflict is settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The closing side's value wins.
    Closing,
    /// The continuing side's value wins.
    Continuing,
    /// Neither side's edit is carried by the result.
    Drop,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closing => f.write_str("closing"),
            Self::Continuing => f.write_str("continuing"),
            Self::Drop => f.write_str("drop"),
        }
    }
}
