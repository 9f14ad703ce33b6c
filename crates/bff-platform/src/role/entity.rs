//! Role Entity

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Realm role. Two roles are the same role only when id and name both match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: String,
    pub name: String,
}

impl Role {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Role list response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleListResponse {
    pub items: Vec<Role>,
    pub total_count: u64,
}

impl From<Vec<Role>> for RoleListResponse {
    fn from(items: Vec<Role>) -> Self {
        Self {
            total_count: items.len() as u64,
            items,
        }
    }
}
