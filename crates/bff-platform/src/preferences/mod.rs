//! Preferences Aggregate
//!
//! Per-caller JSON document kept by the preferences store. The store keys
//! documents by the caller's identity, so nothing here takes a user id.

pub mod entity;
pub mod client;
pub mod api;

pub use entity::Preferences;
pub use client::{PreferencesClient, PreferencesStore};
pub use api::{PreferencesState, preferences_router};
