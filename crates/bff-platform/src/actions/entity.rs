//! Action Entities
//!
//! The `action` payload is opaque to the BFF and forwarded as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::api_common::{string_or_number, PaginationParams};
use crate::shared::error::Result;

/// Create action request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateActionRequest {
    pub user_id: String,
    #[schema(value_type = Object)]
    pub action: serde_json::Value,
    pub action_created_at: DateTime<Utc>,
}

/// Recorded action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    #[schema(value_type = Object)]
    pub action: serde_json::Value,
    pub action_created_at: DateTime<Utc>,
}

/// Page of actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionListResponse {
    pub items: Vec<ActionResponse>,
    pub total_count: u64,
}

/// Action list as returned by the history log
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryActionList {
    #[serde(default)]
    pub actions_list: Vec<ActionResponse>,
    #[serde(default)]
    pub total_count: u64,
}

impl From<HistoryActionList> for ActionListResponse {
    fn from(list: HistoryActionList) -> Self {
        Self {
            items: list.actions_list,
            total_count: list.total_count,
        }
    }
}

/// Query parameters for action lists
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ActionsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,
    /// Only actions of the last hours; all actions when absent
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub show_last_hours: Option<u32>,
}

impl ActionsQuery {
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            pagination: self.pagination.validated()?,
            show_last_hours: self.show_last_hours,
        })
    }

    /// Query pairs for the history log; `showLastHours` only when given
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.pagination.page().to_string()),
            ("pageSize", self.pagination.page_size().to_string()),
        ];
        if let Some(hours) = self.show_last_hours {
            query.push(("showLastHours", hours.to_string()));
        }
        query
    }
}
