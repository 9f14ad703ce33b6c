//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "application.toml",
    "bff.toml",
    "./config/config.toml",
    "./config/application.toml",
    "/etc/portal-bff/config.toml",
];

const ENV_PREFIX: &str = "BFF_";
const ACCESS_CONTROL_PREFIX: &str = "BFF_ACCESS_CONTROL_";

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, env::vars())?;

        config.validate()?;
        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured config file does not exist");
        }

        if let Ok(path) = env::var("BFF_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `BFF_*` overrides from the given variables.
///
/// `BFF_ACCESS_CONTROL_<OPERATION>=role_a,role_b` replaces the role list of
/// one operation key.
pub(crate) fn apply_overrides<I>(config: &mut AppConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let vars: HashMap<String, String> = vars
        .into_iter()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect();
    let get = |key: &str| vars.get(key).cloned();

    // HTTP
    if let Some(val) = get("BFF_HTTP_PORT") {
        config.http.port = parse_number("BFF_HTTP_PORT", &val)?;
    }
    if let Some(val) = get("BFF_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = get("BFF_CORS_ORIGINS") {
        config.http.cors_origins = split_list(&val);
    }
    if let Some(val) = get("BFF_METRICS_PORT") {
        config.http.metrics_port = parse_number("BFF_METRICS_PORT", &val)?;
    }

    // Keycloak
    if let Some(val) = get("BFF_KEYCLOAK_URL") {
        config.keycloak.url = val;
    }
    if let Some(val) = get("BFF_KEYCLOAK_REALM") {
        config.keycloak.realm = val;
    }
    if let Some(val) = get("BFF_KEYCLOAK_ADMIN_BASE_PATH") {
        config.keycloak.admin_base_path = val;
    }
    if let Some(val) = get("BFF_KEYCLOAK_CLIENT_ID") {
        config.keycloak.client_id = val;
    }
    if let Some(val) = get("BFF_KEYCLOAK_CLIENT_SECRET") {
        config.keycloak.client_secret = Some(val).filter(|s| !s.is_empty());
    }

    // Downstream
    if let Some(val) = get("BFF_PREFERENCES_URL") {
        config.downstream.preferences_url = val;
    }
    if let Some(val) = get("BFF_HISTORY_URL") {
        config.downstream.history_url = val;
    }
    if let Some(val) = get("BFF_DOWNSTREAM_TIMEOUT_MS") {
        config.downstream.timeout_ms = parse_number("BFF_DOWNSTREAM_TIMEOUT_MS", &val)?;
    }
    if let Some(val) = get("BFF_DOWNSTREAM_CONNECT_TIMEOUT_MS") {
        config.downstream.connect_timeout_ms =
            parse_number("BFF_DOWNSTREAM_CONNECT_TIMEOUT_MS", &val)?;
    }

    // RBAC
    if let Some(val) = get("BFF_RBAC_MODE") {
        config.rbac.mode = val.parse()?;
    }
    if let Some(val) = get("BFF_RBAC_ENDPOINTS_EXCLUDED") {
        config.rbac.endpoints_excluded = split_list(&val);
    }
    for (key, val) in &vars {
        if let Some(operation) = key.strip_prefix(ACCESS_CONTROL_PREFIX) {
            config
                .rbac
                .access_control
                .insert(operation.to_string(), split_list(val));
        }
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, val: &str) -> Result<T, ConfigError> {
    val.trim()
        .parse()
        .map_err(|_| ConfigError::EnvError(format!("{} is not a valid number: '{}'", key, val)))
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
