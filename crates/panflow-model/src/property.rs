use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A free-form property value arriving at the API boundary (§9: "the
/// property map remains a string-keyed value at the API boundary; accessors
/// translate it once"). Accessors map each key to its XML shape per the
/// kind's values descriptor (scalar / choice-of / member-list / flag).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(String),
    Bool(bool),
    List(Vec<String>),
    /// Clears a scalar or choice-of field's element entirely, rather than
    /// setting it to an empty string. Writing `Null` to a member-list or
    /// flag field is rejected by the accessor that owns it.
    Null,
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Ordered-by-key map of property name to value, passed to `add`/`update`.
/// `BTreeMap` gives deterministic iteration for reproducible change-records.
pub type PropertyMap = BTreeMap<String, PropertyValue>;
