//! Group entity

use chrono::{DateTime, Utc};
use rscognito_core::RawGroup;

/// A user pool group
#[derive(Debug, Clone)]
pub struct Group {
    pub group_name: String,
    pub description: Option<String>,
    pub role_arn: Option<String>,
    pub precedence: Option<i32>,
    pub creation_date: Option<DateTime<Utc>>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl From<RawGroup> for Group {
    fn from(raw: RawGroup) -> Self {
        Self {
            group_name: raw.group_name,
            description: raw.description,
            role_arn: raw.role_arn,
            precedence: raw.precedence,
            creation_date: raw.creation_date,
            last_modified_date: raw.last_modified_date,
        }
    }
}
