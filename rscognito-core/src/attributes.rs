//! Conversions between the pool's `{Name, Value}` attribute lists and
//! the typed attribute map exposed to callers

use std::collections::HashMap;

use crate::CognitoAttribute;

/// A user pool attribute value. The wire format is always a string;
/// the literals `"true"` and `"false"` surface as booleans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Str(String),
    Bool(bool),
}

impl AttributeValue {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "true" => AttributeValue::Bool(true),
            "false" => AttributeValue::Bool(false),
            other => AttributeValue::Str(other.to_string()),
        }
    }

    pub fn to_wire(&self) -> String {
        match self {
            AttributeValue::Str(s) => s.clone(),
            AttributeValue::Bool(true) => "true".to_string(),
            AttributeValue::Bool(false) => "false".to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            AttributeValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Str(_) => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Str(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Str(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// Optional renaming between pool attribute names and the names a
/// caller wants to see. Keys are pool names, values are caller names.
pub type AttrMap = HashMap<String, String>;

/// Convert a pool attribute list into a typed map, applying `attr_map`
/// renames pool name -> caller name
pub fn from_cognito(list: &[CognitoAttribute], attr_map: &AttrMap) -> HashMap<String, AttributeValue> {
    list.iter()
        .map(|a| {
            let name = attr_map.get(&a.name).unwrap_or(&a.name).clone();
            (name, AttributeValue::from_wire(&a.value))
        })
        .collect()
}

/// Convert a typed attribute map back into the pool list shape,
/// applying `attr_map` renames caller name -> pool name
pub fn to_cognito(
    attrs: &HashMap<String, AttributeValue>,
    attr_map: &AttrMap,
) -> Vec<CognitoAttribute> {
    attrs
        .iter()
        .map(|(name, value)| {
            let pool_name = attr_map
                .iter()
                .find(|(_, caller)| *caller == name)
                .map(|(pool, _)| pool.clone())
                .unwrap_or_else(|| name.clone());
            CognitoAttribute::new(pool_name, value.to_wire())
        })
        .collect()
}

/// Prefix an attribute name as a pool custom attribute
pub fn custom(name: &str) -> String {
    format!("custom:{}", name)
}
