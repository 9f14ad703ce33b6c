//! Preferences Entity

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Free-form preferences document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Preferences {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub properties: serde_json::Value,
}

impl Preferences {
    pub fn new(properties: serde_json::Value) -> Self {
        Self { properties }
    }
}
