//! Portal BFF Configuration System
//!
//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub keycloak: KeycloakConfig,
    pub downstream: DownstreamConfig,
    pub rbac: RbacConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    /// Port serving Prometheus metrics
    pub metrics_port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["http://localhost:4200".to_string()],
            metrics_port: 9090,
        }
    }
}

/// Identity provider (Keycloak) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeycloakConfig {
    /// Base URL, e.g. `http://keycloak:8080`
    pub url: String,
    pub realm: String,
    /// Prefix of the admin REST API in front of the realm name
    pub admin_base_path: String,
    /// Client used for UMA decisions and, with a secret, for service tokens
    pub client_id: String,
    /// When set, admin calls use a client-credentials token instead of the caller's
    pub client_secret: Option<String>,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8180".to_string(),
            realm: "onap".to_string(),
            admin_base_path: "/auth/admin/realms".to_string(),
            client_id: "portal-bff".to_string(),
            client_secret: None,
        }
    }
}

impl KeycloakConfig {
    /// `{url}{admin_base_path}/{realm}`
    pub fn admin_base_url(&self) -> String {
        format!(
            "{}{}/{}",
            self.url.trim_end_matches('/'),
            self.admin_base_path.trim_end_matches('/'),
            self.realm
        )
    }

    /// OpenID Connect token endpoint of the realm
    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.url.trim_end_matches('/'),
            self.realm
        )
    }
}

/// Downstream HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    pub preferences_url: String,
    pub history_url: String,
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            preferences_url: "http://localhost:9001".to_string(),
            history_url: "http://localhost:9002".to_string(),
            timeout_ms: 30_000,
            connect_timeout_ms: 5_000,
            pool_max_idle_per_host: 500,
            pool_idle_timeout_secs: 20,
        }
    }
}

impl DownstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

/// How endpoint access is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RbacMode {
    /// Every request is allowed
    #[default]
    Disabled,
    /// Roles claim of the `X-Auth-Identity` token against `access_control`
    IdToken,
    /// Keycloak UMA decision per `path#METHOD`
    Uma,
}

impl FromStr for RbacMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" => Ok(RbacMode::Disabled),
            "id-token" | "id_token" => Ok(RbacMode::IdToken),
            "uma" => Ok(RbacMode::Uma),
            other => Err(ConfigError::ValidationError(format!("unknown rbac mode '{}'", other))),
        }
    }
}

/// Role based access control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    pub mode: RbacMode,
    /// Path patterns that bypass access control (`*` one segment, `**` anything)
    pub endpoints_excluded: Vec<String>,
    /// Operation key (e.g. `USERS_CREATE`) to the roles allowed to call it
    pub access_control: HashMap<String, Vec<String>>,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            mode: RbacMode::Disabled,
            endpoints_excluded: vec![
                "/actuator/**".to_string(),
                "/swagger-ui/**".to_string(),
                "/q/openapi".to_string(),
            ],
            access_control: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Check the settings every downstream client depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("keycloak.url", &self.keycloak.url),
            ("keycloak.realm", &self.keycloak.realm),
            ("downstream.preferences_url", &self.downstream.preferences_url),
            ("downstream.history_url", &self.downstream.history_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{} must not be blank", name)));
            }
        }

        if self.rbac.mode == RbacMode::Uma && self.keycloak.client_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "keycloak.client_id is required for rbac mode 'uma'".to_string(),
            ));
        }

        if self.downstream.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "downstream.timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Portal BFF Configuration
# Environment variables (BFF_*) override these settings

[http]
port = 8080
host = "0.0.0.0"
cors_origins = ["http://localhost:4200"]
metrics_port = 9090

[keycloak]
url = "http://localhost:8180"
realm = "onap"
admin_base_path = "/auth/admin/realms"
client_id = "portal-bff"
# client_secret = "..."

[downstream]
preferences_url = "http://localhost:9001"
history_url = "http://localhost:9002"
timeout_ms = 30000
connect_timeout_ms = 5000
pool_max_idle_per_host = 500
pool_idle_timeout_secs = 20

[rbac]
mode = "id-token"  # disabled, id-token, uma
endpoints_excluded = ["/actuator/**", "/swagger-ui/**", "/q/openapi"]

[rbac.access_control]
USERS_CREATE = ["portal_admin"]
USERS_GET = ["portal_admin"]
USERS_LIST = ["portal_admin"]
USERS_UPDATE = ["portal_admin"]
USERS_DELETE = ["portal_admin"]
USERS_PASSWORD_UPDATE = ["portal_admin"]
USERS_ROLES_GET = ["portal_admin"]
USERS_ROLES_UPDATE = ["portal_admin"]
ROLE_LIST = ["portal_admin"]
PREFERENCES_GET = ["portal_admin", "portal_designer", "portal_operator"]
PREFERENCES_CREATE = ["portal_admin", "portal_designer", "portal_operator"]
PREFERENCES_UPDATE = ["portal_admin", "portal_designer", "portal_operator"]
ACTIONS_CREATE = ["portal_admin", "portal_designer", "portal_operator"]
ACTIONS_GET = ["portal_admin", "portal_designer", "portal_operator"]
ACTIONS_LIST = ["portal_admin"]
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_example_toml_parses_and_validates() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.rbac.mode, RbacMode::IdToken);
        assert_eq!(config.rbac.access_control["ACTIONS_LIST"], vec!["portal_admin"]);
        assert_eq!(config.downstream.pool_idle_timeout(), Duration::from_secs(20));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[keycloak]\nrealm = \"portal\"\n").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.keycloak.realm, "portal");
        assert_eq!(config.keycloak.admin_base_path, "/auth/admin/realms");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.rbac.mode, RbacMode::Disabled);
    }

    #[test]
    fn test_unknown_rbac_mode_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[rbac]\nmode = \"everyone\"\n");
        assert!(result.is_err());
        assert!("everyone".parse::<RbacMode>().is_err());
        assert_eq!("ID_TOKEN".parse::<RbacMode>().unwrap(), RbacMode::IdToken);
    }

    #[test]
    fn test_validate_rejects_blank_realm() {
        let mut config = AppConfig::default();
        config.keycloak.realm = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("keycloak.realm"));
    }

    #[test]
    fn test_keycloak_urls() {
        let config = KeycloakConfig {
            url: "http://kc:8080/".to_string(),
            realm: "onap".to_string(),
            ..Default::default()
        };
        assert_eq!(config.admin_base_url(), "http://kc:8080/auth/admin/realms/onap");
        assert_eq!(
            config.token_url(),
            "http://kc:8080/realms/onap/protocol/openid-connect/token"
        );
    }
}
