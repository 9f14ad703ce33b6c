//! Portal BFF Platform
//!
//! Backend-for-frontend aggregating three downstream systems behind one
//! REST API:
//! - Identity directory (Keycloak admin API): users, realm roles, role mappings
//! - Preferences store: per-caller JSON document
//! - History log: per-user action history
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Public request/response types
//! - `client` / `service` - Downstream access and composition
//! - `api` - REST endpoints

// Aggregates
pub mod user;
pub mod role;
pub mod preferences;
pub mod actions;

// Identity provider integration
pub mod idp;

// Shared infrastructure
pub mod shared;

// Wiring
pub mod app;

// Re-export common types from shared
pub use shared::error::{BffError, DownstreamProblem, ProblemDetail, Result};
pub use shared::middleware::{Caller, RequestContextLayer};
pub use shared::authorization_service::{operations, AccessControl};

// Re-export main types for convenience
pub use idp::{DirectoryUser, IdentityDirectory, KeycloakDirectory, PasswordCredential, RequiredAction};
pub use user::{UserDirectoryAggregator, UserListResponse, UserResponse};
pub use role::{Role, RoleListResponse};
pub use preferences::{Preferences, PreferencesStore};
pub use actions::{ActionHistoryLog, ActionListResponse, ActionResponse};

pub use app::{build_app, BffServices};
