//! User entity with an explicit attribute map

use std::collections::HashMap;

use rscognito_core::attributes::{from_cognito, AttrMap, AttributeValue};
use rscognito_core::RawUser;

/// A user pool user. Well known attributes are lifted onto fields;
/// everything else stays in the attribute map, where an absent name
/// reads as `None` rather than a silent null.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub sub: Option<String>,
    pub email_verified: Option<bool>,
    pub phone_number_verified: Option<bool>,
    pub enabled: Option<bool>,
    pub user_status: Option<String>,
    attributes: HashMap<String, AttributeValue>,
}

impl User {
    pub(crate) fn from_raw(raw: RawUser, attr_map: &AttrMap) -> Self {
        let mut attributes = from_cognito(&raw.attributes, attr_map);

        let sub = attributes
            .remove("sub")
            .and_then(|v| v.as_str().map(str::to_string));
        let email_verified = attributes
            .remove("email_verified")
            .and_then(|v| v.as_bool());
        let phone_number_verified = attributes
            .remove("phone_number_verified")
            .and_then(|v| v.as_bool());

        Self {
            username: raw.username,
            sub,
            email_verified,
            phone_number_verified,
            enabled: raw.enabled,
            user_status: raw.user_status,
            attributes,
        }
    }

    /// Look up an attribute by its mapped name
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute<V: Into<AttributeValue>>(&mut self, name: &str, value: V) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }
}
