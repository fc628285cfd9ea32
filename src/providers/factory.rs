//! Builds the identity-provider client from caller settings.

use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::OidcSettings;
use crate::error::ConfigurationError;
use crate::utils::value::{camel_case_to_snake_case, is_truthy, object_assign};

/// The persistent user store the provider client falls back to.
pub const DEFAULT_USER_STORE: &str = "localStorage";

/// camelCase settings the provider client only understands in snake_case.
const SNAKE_CASED_IN_PROVIDER_CLIENT: [&str; 10] = [
    "clientId",
    "redirectUri",
    "responseType",
    "maxAge",
    "uiLocales",
    "loginHint",
    "acrValues",
    "postLogoutRedirectUri",
    "popupRedirectUri",
    "silentRedirectUri",
];

const REQUIRED_SETTINGS: [&str; 5] = [
    "authority",
    "client_id",
    "redirect_uri",
    "response_type",
    "scope",
];

/// Settings as handed to the provider client.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig(Map<String, Value>);

impl EffectiveConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A non-empty string setting.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn authority(&self) -> Option<&str> {
        self.str("authority")
    }

    pub fn client_id(&self) -> Option<&str> {
        self.str("client_id")
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.str("redirect_uri")
    }

    pub fn popup_redirect_uri(&self) -> Option<&str> {
        self.str("popup_redirect_uri")
    }

    pub fn silent_redirect_uri(&self) -> Option<&str> {
        self.str("silent_redirect_uri")
    }

    pub fn post_logout_redirect_uri(&self) -> Option<&str> {
        self.str("post_logout_redirect_uri")
    }

    pub fn automatic_silent_signin(&self) -> bool {
        is_truthy(self.0.get("automaticSilentSignin"))
            || is_truthy(self.0.get("automatic_silent_signin"))
    }

    /// Always false: renewal is scheduled by the store, never by the client itself.
    pub fn automatic_silent_renew(&self) -> bool {
        is_truthy(self.0.get("automaticSilentRenew"))
    }

    pub fn load_user_info(&self) -> bool {
        is_truthy(self.0.get("loadUserInfo"))
    }

    pub fn user_store(&self) -> &str {
        self.str("userStore").unwrap_or(DEFAULT_USER_STORE)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        for required in REQUIRED_SETTINGS {
            if !is_truthy(self.0.get(required)) {
                return Err(ConfigurationError::MissingSetting(required));
            }
        }
        Ok(())
    }
}

/// Defaults, then caller settings with snake_case copies of the recognized camelCase
/// keys, then `automaticSilentRenew: false`.
pub fn get_effective_config(settings: &OidcSettings) -> EffectiveConfig {
    let defaults = match json!({ "userStore": DEFAULT_USER_STORE, "loadUserInfo": true }) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut merged = object_assign([&defaults, settings.as_map()]);

    for camel in SNAKE_CASED_IN_PROVIDER_CLIENT {
        if let Some(value) = merged.get(camel).cloned() {
            merged.insert(camel_case_to_snake_case(camel), value);
        }
    }

    merged.insert("automaticSilentRenew".into(), Value::Bool(false));
    if merged.contains_key("automatic_silent_renew") {
        merged.insert("automatic_silent_renew".into(), Value::Bool(false));
    }
    EffectiveConfig(merged)
}

/// Validates `settings` and builds the provider client with `construct`.
///
/// `construct` is only called once every required setting is present.
pub fn create_user_manager<P, F>(settings: &OidcSettings, construct: F) -> Result<P, ConfigurationError>
where
    F: FnOnce(EffectiveConfig) -> P,
{
    let config = get_effective_config(settings);
    config.validate()?;
    info!(
        "Creating identity provider client for authority '{}'",
        config.authority().unwrap_or_default()
    );
    Ok(construct(config))
}

/// Router path of a callback URI: scheme, host, route base and trailing slash removed.
///
/// `http://host/app/oidc-callback` with route base `/app/` gives `/oidc-callback`.
pub fn get_oidc_callback_path(callback_uri: Option<&str>, route_base: &str) -> Option<String> {
    let uri = callback_uri.filter(|uri| !uri.is_empty())?;

    let host_and_path = match uri.find("://") {
        Some(at) => &uri[at + 3..],
        None => uri,
    };
    let path = match host_and_path.find('/') {
        Some(at) => &host_and_path[at..],
        None => "/",
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);

    let base = route_base.trim_end_matches('/');
    let base = if base.is_empty() || base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{}", base)
    };

    let relative = if !base.is_empty() && (path == base || path.starts_with(&format!("{}/", base))) {
        &path[base.len()..]
    } else {
        path
    };
    let relative = relative.strip_suffix('/').unwrap_or(relative);
    debug!("Callback uri '{}' maps to route '{}'", uri, relative);
    Some(relative.to_string())
}
