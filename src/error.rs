//! Error types shared by the store, the provider seam and configuration loading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised while building the provider client or loading configuration. Never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Required oidc setting {0} missing for creating UserManager")]
    MissingSetting(&'static str),

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid logging configuration: {0}")]
    InvalidLogging(String),
}

/// A failure reported by the identity-provider client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for ProviderError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ProviderError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Errors returned by store actions and callback handlers.
#[derive(Debug, Error)]
pub enum OidcError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("authentication failed: {0}")]
    Authentication(ProviderError),

    #[error("sign-in callback failed: {0}")]
    Callback(ProviderError),

    #[error("silent sign-in failed: {0}")]
    SilentRenew(ProviderError),

    #[error("sign-out failed: {0}")]
    SignOut(ProviderError),

    #[error("user storage failed: {0}")]
    Storage(ProviderError),

    #[error("navigation failed: {0}")]
    Navigation(String),
}

impl OidcError {
    /// The underlying message, without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            OidcError::Authentication(e)
            | OidcError::Callback(e)
            | OidcError::SilentRenew(e)
            | OidcError::SignOut(e)
            | OidcError::Storage(e) => e.message.clone(),
            OidcError::Navigation(message) => message.clone(),
            OidcError::Configuration(e) => e.to_string(),
        }
    }
}

/// Delivered to `oidcError` / `automaticSilentRenewError` listeners and browser events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Name of the action that produced the error.
    pub context: String,
    pub error: String,
}

impl ErrorPayload {
    pub fn new(context: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            error: error.into(),
        }
    }
}
