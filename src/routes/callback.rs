//! Handlers for the pages the identity provider redirects back to.
//!
//! Each handler awaits the store action before navigating anywhere.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::OidcStore;
use crate::config::OidcSettings;
use crate::error::OidcError;
use crate::models::User;
use crate::providers::{create_user_manager, EffectiveConfig, IdentityProvider};

/// The host router.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, path: &str) -> Result<(), String>;
}

async fn navigate(navigator: &dyn Navigator, path: &str) -> Result<(), OidcError> {
    navigator.navigate(path).await.map_err(OidcError::Navigation)
}

/// Mounted at the redirect callback route.
pub struct SignInCallbackHandler {
    store: OidcStore,
    navigator: Arc<dyn Navigator>,
    error_path: Option<String>,
}

impl SignInCallbackHandler {
    pub fn new(store: OidcStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            error_path: None,
        }
    }

    /// Where to go when the callback cannot be completed.
    pub fn with_error_path(mut self, path: impl Into<String>) -> Self {
        self.error_path = Some(path.into());
        self
    }

    /// Completes the sign-in, then navigates to the restored path and returns it.
    pub async fn handle(&self, url: Option<&str>) -> Result<String, OidcError> {
        match self.store.oidc_sign_in_callback(url).await {
            Ok(path) => {
                navigate(self.navigator.as_ref(), &path).await?;
                Ok(path)
            }
            Err(e) => {
                if let Some(error_path) = self.error_path.as_deref() {
                    if let Err(nav) = self.navigator.navigate(error_path).await {
                        warn!("Could not navigate to '{}': {}", error_path, nav);
                    }
                }
                Err(e)
            }
        }
    }
}

/// Mounted at the popup callback route; the opener keeps its own navigation.
pub struct PopupCallbackHandler {
    store: OidcStore,
}

impl PopupCallbackHandler {
    pub fn new(store: OidcStore) -> Self {
        Self { store }
    }

    pub async fn handle(&self, url: Option<&str>) -> Result<(), OidcError> {
        self.store.oidc_sign_in_popup_callback(url).await
    }
}

/// Mounted at the post-logout redirect route.
pub struct SignOutCallbackHandler {
    store: OidcStore,
    navigator: Arc<dyn Navigator>,
    after_sign_out_path: String,
}

impl SignOutCallbackHandler {
    pub fn new(store: OidcStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            after_sign_out_path: "/".to_string(),
        }
    }

    pub fn with_after_sign_out_path(mut self, path: impl Into<String>) -> Self {
        self.after_sign_out_path = path.into();
        self
    }

    pub async fn handle(&self, url: Option<&str>) -> Result<(), OidcError> {
        self.store.sign_out_oidc_callback(url).await?;
        navigate(self.navigator.as_ref(), &self.after_sign_out_path).await
    }
}

/// Completes a redirect sign-in on a page that does not host the store.
pub async fn process_signin_callback<P, F>(
    settings: &OidcSettings,
    construct: F,
    url: Option<&str>,
) -> Result<User, OidcError>
where
    P: IdentityProvider,
    F: FnOnce(EffectiveConfig) -> P,
{
    let provider = create_user_manager(settings, construct)?;
    let user = provider
        .signin_redirect_callback(url)
        .await
        .map_err(OidcError::Callback)?;
    info!("Processed sign-in callback for '{}'", user.subject());
    Ok(user)
}

/// Completes a silent sign-in inside the hidden frame. The frame's own client must not
/// renew or sign in silently itself.
pub async fn process_silent_signin_callback<P, F>(
    settings: &OidcSettings,
    construct: F,
    url: Option<&str>,
) -> Result<(), OidcError>
where
    P: IdentityProvider,
    F: FnOnce(EffectiveConfig) -> P,
{
    let settings = settings
        .clone()
        .without("silentRedirectUri")
        .with("silent_redirect_uri", Value::Null)
        .with("automaticSilentRenew", false);
    let provider = create_user_manager(&settings, construct)?;
    provider
        .signin_silent_callback(url)
        .await
        .map_err(OidcError::SilentRenew)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::providers::memory_provider::Operation;
    use crate::providers::InMemoryProvider;
    use serde_json::json;

    fn settings() -> OidcSettings {
        OidcSettings::from_json(json!({
            "authority": "https://idp",
            "client_id": "spa",
            "redirect_uri": "http://localhost/oidc-callback",
            "silentRedirectUri": "http://localhost/silent-renew-oidc.html",
            "response_type": "code",
            "scope": "openid"
        }))
    }

    #[tokio::test]
    async fn silent_callback_client_has_no_silent_redirect_uri() {
        let mut seen = None;
        process_silent_signin_callback(
            &settings(),
            |config| {
                seen = Some(config.clone());
                InMemoryProvider::new(config)
            },
            Some("http://localhost/silent-renew-oidc.html#id_token=x"),
        )
        .await
        .unwrap();

        let config = seen.unwrap();
        assert_eq!(config.silent_redirect_uri(), None);
        assert!(!config.automatic_silent_renew());
    }

    #[tokio::test]
    async fn signin_callback_reports_provider_failure() {
        let result = process_signin_callback(&settings(), InMemoryProvider::new, None).await;
        match result {
            Err(OidcError::Callback(ProviderError { message })) => {
                assert_eq!(message, "No matching state found in storage")
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn signin_callback_returns_the_user() {
        let result = process_signin_callback(
            &settings(),
            |config| {
                let provider = InMemoryProvider::new(config);
                provider.script(
                    Operation::SigninRedirectCallback,
                    Ok(Some(User::default().with_scope("openid"))),
                );
                provider
            },
            Some("http://localhost/oidc-callback?code=abc&state=xyz"),
        )
        .await;
        assert_eq!(result.unwrap().scope.as_deref(), Some("openid"));
    }
}
