//! Actions Aggregate
//!
//! Per-user action history kept by the history log.

pub mod entity;
pub mod client;
pub mod api;

pub use entity::{ActionListResponse, ActionResponse, ActionsQuery, CreateActionRequest};
pub use client::{ActionHistoryLog, HistoryClient};
pub use api::{ActionsState, actions_router};
