use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::events::ProviderEvents;
use crate::error::ProviderError;
use crate::models::User;

/// Provider-specific request options (extra query parameters, prompt, etc.).
pub type ProviderOptions = Map<String, Value>;

/// A sign-out request built by the provider client; `url` ends the IdP session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SignoutRequest {
    pub url: String,
    #[serde(default)]
    pub state: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SignoutResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub state: Option<Value>,
}

/// The identity-provider client: owns the persisted session, redirect/popup windows
/// and silent frames. Everything protocol-level happens behind this trait.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The persisted user, if any.
    async fn get_user(&self) -> Result<Option<User>, ProviderError>;

    async fn signin_redirect(&self, options: &ProviderOptions) -> Result<(), ProviderError>;
    async fn signin_redirect_callback(&self, url: Option<&str>) -> Result<User, ProviderError>;

    async fn signin_silent(&self, options: &ProviderOptions) -> Result<User, ProviderError>;
    async fn signin_silent_callback(&self, url: Option<&str>) -> Result<(), ProviderError>;

    async fn signin_popup(&self, options: &ProviderOptions) -> Result<User, ProviderError>;
    async fn signin_popup_callback(&self, url: Option<&str>) -> Result<(), ProviderError>;

    async fn signout_redirect(&self, options: &ProviderOptions) -> Result<(), ProviderError>;
    async fn signout_redirect_callback(
        &self,
        url: Option<&str>,
    ) -> Result<SignoutResponse, ProviderError>;

    async fn signout_popup(&self, options: &ProviderOptions) -> Result<(), ProviderError>;
    async fn signout_popup_callback(&self, url: Option<&str>) -> Result<(), ProviderError>;

    async fn create_signout_request(
        &self,
        args: &ProviderOptions,
    ) -> Result<SignoutRequest, ProviderError>;

    async fn store_user(&self, user: &User) -> Result<(), ProviderError>;
    async fn remove_user(&self) -> Result<(), ProviderError>;
    async fn clear_stale_state(&self) -> Result<(), ProviderError>;

    /// Lifecycle event registration surface.
    fn events(&self) -> &ProviderEvents;
}

/// Lets a caller keep its own handle on the client it hands to the store.
#[async_trait::async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    async fn get_user(&self) -> Result<Option<User>, ProviderError> {
        (**self).get_user().await
    }

    async fn signin_redirect(&self, options: &ProviderOptions) -> Result<(), ProviderError> {
        (**self).signin_redirect(options).await
    }

    async fn signin_redirect_callback(&self, url: Option<&str>) -> Result<User, ProviderError> {
        (**self).signin_redirect_callback(url).await
    }

    async fn signin_silent(&self, options: &ProviderOptions) -> Result<User, ProviderError> {
        (**self).signin_silent(options).await
    }

    async fn signin_silent_callback(&self, url: Option<&str>) -> Result<(), ProviderError> {
        (**self).signin_silent_callback(url).await
    }

    async fn signin_popup(&self, options: &ProviderOptions) -> Result<User, ProviderError> {
        (**self).signin_popup(options).await
    }

    async fn signin_popup_callback(&self, url: Option<&str>) -> Result<(), ProviderError> {
        (**self).signin_popup_callback(url).await
    }

    async fn signout_redirect(&self, options: &ProviderOptions) -> Result<(), ProviderError> {
        (**self).signout_redirect(options).await
    }

    async fn signout_redirect_callback(
        &self,
        url: Option<&str>,
    ) -> Result<SignoutResponse, ProviderError> {
        (**self).signout_redirect_callback(url).await
    }

    async fn signout_popup(&self, options: &ProviderOptions) -> Result<(), ProviderError> {
        (**self).signout_popup(options).await
    }

    async fn signout_popup_callback(&self, url: Option<&str>) -> Result<(), ProviderError> {
        (**self).signout_popup_callback(url).await
    }

    async fn create_signout_request(
        &self,
        args: &ProviderOptions,
    ) -> Result<SignoutRequest, ProviderError> {
        (**self).create_signout_request(args).await
    }

    async fn store_user(&self, user: &User) -> Result<(), ProviderError> {
        (**self).store_user(user).await
    }

    async fn remove_user(&self) -> Result<(), ProviderError> {
        (**self).remove_user().await
    }

    async fn clear_stale_state(&self) -> Result<(), ProviderError> {
        (**self).clear_stale_state().await
    }

    fn events(&self) -> &ProviderEvents {
        (**self).events()
    }
}
