use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::settings::{OidcSettings, StoreSettings};
use crate::error::ConfigurationError;

/// Environment variables with this prefix override file values, `__` separating keys
/// (e.g. `OIDC_STORE_LOGGING__LEVEL=debug`).
pub const ENV_PREFIX: &str = "OIDC_STORE_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: the OIDC client settings, store settings and logging.
#[derive(Deserialize, Serialize, Debug, JsonSchema)]
pub struct ConfigV1 {
    pub oidc: OidcSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn extract(figment: Figment) -> Result<ConfigV1, ConfigurationError> {
    let config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract::<Config>()
        .map_err(|e| ConfigurationError::Load(Box::new(e)))?;
    match config {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from a YAML file, with environment overrides.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigV1, ConfigurationError> {
    extract(Figment::new().merge(Yaml::file(path.as_ref())))
}

/// Load config from a YAML document, with environment overrides.
pub fn load_config_from_str(yaml: &str) -> Result<ConfigV1, ConfigurationError> {
    extract(Figment::new().merge(Yaml::string(yaml)))
}

/// The JSON schema for the configuration file.
pub fn schema_json() -> String {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthenticatedBy, LogFormat};

    const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
oidc:
  authority: https://your_oidc_authority
  clientId: your_client_id
  redirectUri: http://localhost:1337/oidc-callback
  responseType: code
  scope: openid profile
  automaticSilentRenew: true
store:
  dispatchEventsOnWindow: true
  publicRoutePaths:
    - /about
  isAuthenticatedBy: access_token
"#;

    #[test]
    fn loads_versioned_yaml() {
        let config = load_config_from_str(TEST_CONFIG).expect("config should load");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.oidc.automatic_silent_renew());
        assert!(config.store.dispatch_events_on_window);
        assert_eq!(config.store.is_authenticated_by, AuthenticatedBy::AccessToken);
        assert_eq!(config.store.route_base, "/");
    }

    #[test]
    fn unknown_version_is_a_load_error() {
        let result = load_config_from_str("version: \"9.9.9\"\noidc: {}\n");
        assert!(matches!(result, Err(ConfigurationError::Load(_))));
    }

    #[test]
    fn schema_mentions_store_settings() {
        let schema = schema_json();
        assert!(schema.contains("publicRoutePaths"));
        assert!(!schema.contains("isPublicRoute"));
    }
}
