use std::fmt;
use std::sync::Arc;

use crate::error::ErrorPayload;
use crate::providers::{EventDetail, EventListener, ProviderEvent};

/// Store-level event names that are not provider lifecycle events.
pub const OIDC_ERROR: &str = "oidcError";
pub const AUTOMATIC_SILENT_RENEW_ERROR: &str = "automaticSilentRenewError";

pub type ErrorListener = Arc<dyn Fn(&ErrorPayload) + Send + Sync>;

/// Optional callbacks supplied when the store is built.
#[derive(Clone, Default)]
pub struct OidcEventListeners {
    pub user_loaded: Option<EventListener>,
    pub user_unloaded: Option<EventListener>,
    pub access_token_expiring: Option<EventListener>,
    pub access_token_expired: Option<EventListener>,
    pub silent_renew_error: Option<EventListener>,
    pub user_signed_out: Option<EventListener>,
    pub oidc_error: Option<ErrorListener>,
    pub automatic_silent_renew_error: Option<ErrorListener>,
}

impl OidcEventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the listener for one provider lifecycle event.
    pub fn on<F>(mut self, event: ProviderEvent, listener: F) -> Self
    where
        F: Fn(&EventDetail) + Send + Sync + 'static,
    {
        let listener: EventListener = Arc::new(listener);
        *self.slot_mut(event) = Some(listener);
        self
    }

    pub fn on_oidc_error<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ErrorPayload) + Send + Sync + 'static,
    {
        self.oidc_error = Some(Arc::new(listener));
        self
    }

    pub fn on_automatic_silent_renew_error<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ErrorPayload) + Send + Sync + 'static,
    {
        self.automatic_silent_renew_error = Some(Arc::new(listener));
        self
    }

    pub fn provider_listener(&self, event: ProviderEvent) -> Option<&EventListener> {
        match event {
            ProviderEvent::UserLoaded => self.user_loaded.as_ref(),
            ProviderEvent::UserUnloaded => self.user_unloaded.as_ref(),
            ProviderEvent::AccessTokenExpiring => self.access_token_expiring.as_ref(),
            ProviderEvent::AccessTokenExpired => self.access_token_expired.as_ref(),
            ProviderEvent::SilentRenewError => self.silent_renew_error.as_ref(),
            ProviderEvent::UserSignedOut => self.user_signed_out.as_ref(),
        }
    }

    /// The listener for `oidcError` or `automaticSilentRenewError`.
    pub fn error_listener(&self, event_name: &str) -> Option<&ErrorListener> {
        match event_name {
            OIDC_ERROR => self.oidc_error.as_ref(),
            AUTOMATIC_SILENT_RENEW_ERROR => self.automatic_silent_renew_error.as_ref(),
            _ => None,
        }
    }

    fn slot_mut(&mut self, event: ProviderEvent) -> &mut Option<EventListener> {
        match event {
            ProviderEvent::UserLoaded => &mut self.user_loaded,
            ProviderEvent::UserUnloaded => &mut self.user_unloaded,
            ProviderEvent::AccessTokenExpiring => &mut self.access_token_expiring,
            ProviderEvent::AccessTokenExpired => &mut self.access_token_expired,
            ProviderEvent::SilentRenewError => &mut self.silent_renew_error,
            ProviderEvent::UserSignedOut => &mut self.user_signed_out,
        }
    }
}

impl fmt::Debug for OidcEventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<&str> = ProviderEvent::ALL
            .iter()
            .filter(|event| self.provider_listener(**event).is_some())
            .map(|event| event.name())
            .chain(self.oidc_error.as_ref().map(|_| OIDC_ERROR))
            .chain(
                self.automatic_silent_renew_error
                    .as_ref()
                    .map(|_| AUTOMATIC_SILENT_RENEW_ERROR),
            )
            .collect();
        f.debug_struct("OidcEventListeners")
            .field("registered", &registered)
            .finish()
    }
}
