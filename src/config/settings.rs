//! Caller-facing settings: the OIDC client settings handed to the identity provider
//! client, and the store settings that shape route classification and event dispatch.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::route::RoutePredicate;
use crate::providers::ProviderOptions;
use crate::utils::value::is_truthy;

/// Raw OIDC client settings, in either camelCase or snake_case.
///
/// Kept as an open map because the provider client accepts many settings this crate
/// does not interpret; `providers::factory::get_effective_config` normalizes it.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, JsonSchema)]
#[serde(transparent)]
pub struct OidcSettings(Map<String, Value>);

impl OidcSettings {
    pub fn new(settings: Map<String, Value>) -> Self {
        Self(settings)
    }

    /// Builds settings from a JSON object; any other JSON value gives empty settings.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.0.remove(key);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A boolean flag, truthy in the JavaScript sense.
    pub fn flag(&self, key: &str) -> bool {
        is_truthy(self.0.get(key))
    }

    /// Whether the caller asked for tokens to be renewed ahead of expiry. The provider
    /// client's own renewal is always switched off; the store schedules renewal instead.
    pub fn automatic_silent_renew(&self) -> bool {
        self.flag("automaticSilentRenew") || self.flag("automatic_silent_renew")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Which token decides `oidc_is_authenticated`.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
pub enum AuthenticatedBy {
    #[serde(rename = "access_token")]
    AccessToken,
    #[default]
    #[serde(rename = "id_token")]
    IdToken,
}

/// Store-level settings.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// Informational: namespaced stores label their log output with the namespace.
    pub namespaced: bool,
    /// Re-dispatch lifecycle events as `vuexoidc:*` browser events.
    pub dispatch_events_on_window: bool,
    /// Predicate consulted last when classifying public routes.
    #[serde(skip)]
    pub is_public_route: Option<RoutePredicate>,
    pub public_route_paths: Vec<String>,
    /// Router base path, stripped from callback URIs when deriving callback routes.
    pub route_base: String,
    pub default_signin_redirect_options: Option<ProviderOptions>,
    pub default_signin_silent_options: Option<ProviderOptions>,
    pub default_signin_popup_options: Option<ProviderOptions>,
    pub is_authenticated_by: AuthenticatedBy,
    /// On access-token expiry, drop the whole session (true) or only the tokens (false).
    pub remove_user_when_tokens_expire: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            namespaced: false,
            dispatch_events_on_window: false,
            is_public_route: None,
            public_route_paths: Vec::new(),
            route_base: "/".to_string(),
            default_signin_redirect_options: None,
            default_signin_silent_options: None,
            default_signin_popup_options: None,
            is_authenticated_by: AuthenticatedBy::default(),
            remove_user_when_tokens_expire: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_settings_defaults() {
        let settings = StoreSettings::default();
        assert_eq!(settings.route_base, "/");
        assert_eq!(settings.is_authenticated_by, AuthenticatedBy::IdToken);
        assert!(settings.remove_user_when_tokens_expire);
        assert!(!settings.dispatch_events_on_window);
    }

    #[test]
    fn store_settings_read_camel_case_keys() {
        let settings: StoreSettings = serde_json::from_value(json!({
            "dispatchEventsOnWindow": true,
            "publicRoutePaths": ["/about/"],
            "isAuthenticatedBy": "access_token",
            "removeUserWhenTokensExpire": false
        }))
        .unwrap();

        assert!(settings.dispatch_events_on_window);
        assert_eq!(settings.public_route_paths, vec!["/about/".to_string()]);
        assert_eq!(settings.is_authenticated_by, AuthenticatedBy::AccessToken);
        assert!(!settings.remove_user_when_tokens_expire);
        assert_eq!(settings.route_base, "/");
    }

    #[test]
    fn automatic_silent_renew_accepts_both_spellings() {
        let camel = OidcSettings::default().with("automaticSilentRenew", true);
        let snake = OidcSettings::default().with("automatic_silent_renew", true);
        assert!(camel.automatic_silent_renew());
        assert!(snake.automatic_silent_renew());
        assert!(!OidcSettings::default().automatic_silent_renew());
    }
}
