use serde::Deserialize;

use crate::providers::ProviderOptions;

/// How a protected route without a session is authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignInMode {
    #[default]
    Redirect,
    Popup,
}

/// Arguments of `authenticate_oidc`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticatePayload {
    /// Where to go after the sign-in callback. Empty clears the stored route.
    pub redirect_path: Option<String>,
    pub options: Option<ProviderOptions>,
}

impl AuthenticatePayload {
    pub fn redirect_path(path: impl Into<String>) -> Self {
        Self {
            redirect_path: Some(path.into()),
            options: None,
        }
    }

    pub fn with_options(mut self, options: ProviderOptions) -> Self {
        self.options = Some(options);
        self
    }
}

impl From<&str> for AuthenticatePayload {
    fn from(path: &str) -> Self {
        Self::redirect_path(path)
    }
}

impl From<String> for AuthenticatePayload {
    fn from(path: String) -> Self {
        Self::redirect_path(path)
    }
}

/// Arguments of `authenticate_oidc_silent`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SilentPayload {
    pub options: Option<ProviderOptions>,
    /// Resolve `None` instead of failing; nothing is recorded in `error`.
    pub ignore_errors: bool,
}

impl SilentPayload {
    pub fn ignoring_errors() -> Self {
        Self {
            options: None,
            ignore_errors: true,
        }
    }
}

/// Arguments of `authenticate_oidc_popup`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PopupPayload {
    pub options: Option<ProviderOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authenticate_payload_from_path_or_object() {
        assert_eq!(
            AuthenticatePayload::from("/protected"),
            AuthenticatePayload::redirect_path("/protected")
        );
        let payload: AuthenticatePayload = serde_json::from_value(json!({
            "redirectPath": "/admin",
            "options": {"prompt": "login"}
        }))
        .unwrap();
        assert_eq!(payload.redirect_path.as_deref(), Some("/admin"));
        assert_eq!(payload.options.unwrap().get("prompt"), Some(&json!("login")));
    }

    #[test]
    fn silent_payload_reads_ignore_errors() {
        let payload: SilentPayload = serde_json::from_value(json!({"ignoreErrors": true})).unwrap();
        assert_eq!(payload, SilentPayload::ignoring_errors());
    }
}
