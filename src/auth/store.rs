use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::listeners::{OidcEventListeners, OIDC_ERROR};
use crate::browser::{dispatch_custom_browser_event, BrowserWindow, FrameLoader, NoWindow};
use crate::config::{AuthenticatedBy, OidcSettings, StoreSettings};
use crate::error::{ConfigurationError, ErrorPayload};
use crate::models::{AuthState, Mutation, Profile, Route, User};
use crate::providers::{
    create_user_manager, get_effective_config, EffectiveConfig, EventDetail, EventListener,
    IdentityProvider, ProviderEvent,
};
use crate::routes::classify::RouteClassifier;
use crate::store::{MemorySessionStore, SessionStore};
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::jwt::{token_exp, token_is_expired};

const MUTATION_CHANNEL_CAPACITY: usize = 64;

pub(crate) struct Inner {
    pub(crate) settings: OidcSettings,
    pub(crate) config: EffectiveConfig,
    pub(crate) store_settings: StoreSettings,
    pub(crate) listeners: OidcEventListeners,
    pub(crate) provider: Arc<dyn IdentityProvider>,
    pub(crate) session: Arc<dyn SessionStore>,
    pub(crate) window: Arc<dyn BrowserWindow>,
    pub(crate) frame_loader: Option<Arc<dyn FrameLoader>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) classifier: RouteClassifier,
    state: Mutex<AuthState>,
    mutations: broadcast::Sender<Mutation>,
}

/// The authentication state store: one per application session, shared by the route
/// guard and the callback handlers. Cloning gives another handle on the same store.
#[derive(Clone)]
pub struct OidcStore {
    pub(crate) inner: Arc<Inner>,
}

pub struct OidcStoreBuilder {
    settings: OidcSettings,
    store_settings: StoreSettings,
    listeners: OidcEventListeners,
    session: Option<Arc<dyn SessionStore>>,
    window: Option<Arc<dyn BrowserWindow>>,
    frame_loader: Option<Arc<dyn FrameLoader>>,
    clock: Option<Arc<dyn Clock>>,
}

impl OidcStoreBuilder {
    pub fn store_settings(mut self, store_settings: StoreSettings) -> Self {
        self.store_settings = store_settings;
        self
    }

    pub fn listeners(mut self, listeners: OidcEventListeners) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn session_store(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn window(mut self, window: Arc<dyn BrowserWindow>) -> Self {
        self.window = Some(window);
        self
    }

    pub fn frame_loader(mut self, frame_loader: Arc<dyn FrameLoader>) -> Self {
        self.frame_loader = Some(frame_loader);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validates the settings, builds the provider client with `construct` and wires the
    /// caller's listeners (and the browser bridge) onto its lifecycle events.
    pub fn build<P, F>(self, construct: F) -> Result<OidcStore, ConfigurationError>
    where
        P: IdentityProvider + 'static,
        F: FnOnce(EffectiveConfig) -> P,
    {
        let provider: Arc<dyn IdentityProvider> =
            Arc::new(create_user_manager(&self.settings, construct)?);
        let config = get_effective_config(&self.settings);
        let classifier = RouteClassifier::new(&config, &self.store_settings);
        let window = self.window.unwrap_or_else(|| Arc::new(NoWindow));

        for event in ProviderEvent::ALL {
            if let Some(listener) = self.listeners.provider_listener(event) {
                provider.events().add(event, listener.clone());
            }
        }
        if self.store_settings.dispatch_events_on_window {
            for event in ProviderEvent::ALL {
                let window = window.clone();
                let bridge: EventListener = Arc::new(move |detail: &EventDetail| {
                    dispatch_custom_browser_event(window.as_ref(), event.name(), &detail.to_json())
                });
                provider.events().add(event, bridge);
            }
        }

        let (mutations, _) = broadcast::channel(MUTATION_CHANNEL_CAPACITY);
        info!(
            "OIDC store ready (authenticated by {:?}, callback routes {:?})",
            self.store_settings.is_authenticated_by,
            classifier.callback_paths()
        );

        Ok(OidcStore {
            inner: Arc::new(Inner {
                settings: self.settings,
                config,
                store_settings: self.store_settings,
                listeners: self.listeners,
                provider,
                session: self
                    .session
                    .unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
                window,
                frame_loader: self.frame_loader,
                clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
                classifier,
                state: Mutex::new(AuthState::default()),
                mutations,
            }),
        })
    }
}

impl OidcStore {
    pub fn builder(settings: OidcSettings) -> OidcStoreBuilder {
        OidcStoreBuilder {
            settings,
            store_settings: StoreSettings::default(),
            listeners: OidcEventListeners::default(),
            session: None,
            window: None,
            frame_loader: None,
            clock: None,
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.inner.provider
    }

    pub fn effective_config(&self) -> &EffectiveConfig {
        &self.inner.config
    }

    pub fn store_settings(&self) -> &StoreSettings {
        &self.inner.store_settings
    }

    /// Router paths of the configured redirect, popup and silent callback URIs.
    pub fn callback_paths(&self) -> &[String] {
        self.inner.classifier.callback_paths()
    }

    /// A copy of the current state.
    pub fn state(&self) -> AuthState {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every mutation applied from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Mutation> {
        self.inner.mutations.subscribe()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Runs `f` under the state lock. Never call across an `.await`.
    fn with_state<R>(&self, f: impl FnOnce(&mut AuthState) -> R) -> R {
        let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    fn commit(&self, mutation: Mutation, f: impl FnOnce(&mut AuthState)) {
        self.with_state(f);
        debug!("Mutation {:?}", mutation);
        // No subscribers is fine.
        let _ = self.inner.mutations.send(mutation);
    }

    // Getters

    pub fn oidc_is_authenticated(&self) -> bool {
        let state = self.state();
        let token = match self.inner.store_settings.is_authenticated_by {
            AuthenticatedBy::AccessToken => state.access_token,
            AuthenticatedBy::IdToken => state.id_token,
        };
        !token_is_expired(token.as_deref(), self.now())
    }

    pub fn oidc_user(&self) -> Option<Profile> {
        self.state().user
    }

    /// The access token, or `None` once it has expired.
    pub fn oidc_access_token(&self) -> Option<String> {
        self.unexpired(self.state().access_token)
    }

    pub fn oidc_access_token_exp(&self) -> Option<DateTime<Utc>> {
        token_exp(self.state().access_token.as_deref())
    }

    pub fn oidc_id_token(&self) -> Option<String> {
        self.unexpired(self.state().id_token)
    }

    pub fn oidc_id_token_exp(&self) -> Option<DateTime<Utc>> {
        token_exp(self.state().id_token.as_deref())
    }

    /// Refresh tokens are often opaque; only a readable `exp` in the past hides one.
    pub fn oidc_refresh_token(&self) -> Option<String> {
        let token = self.state().refresh_token;
        match token_exp(token.as_deref()) {
            Some(exp) if exp <= self.now() => None,
            _ => token,
        }
    }

    pub fn oidc_refresh_token_exp(&self) -> Option<DateTime<Utc>> {
        token_exp(self.state().refresh_token.as_deref())
    }

    pub fn oidc_scopes(&self) -> Option<Vec<String>> {
        self.state().scopes
    }

    pub fn oidc_authentication_is_checked(&self) -> bool {
        self.state().is_checked
    }

    pub fn oidc_error(&self) -> Option<String> {
        self.state().error
    }

    pub fn oidc_is_route_public(&self, route: &Route) -> bool {
        self.inner.classifier.is_public(route)
    }

    fn unexpired(&self, token: Option<String>) -> Option<String> {
        if token_is_expired(token.as_deref(), self.now()) {
            None
        } else {
            token
        }
    }

    // Mutations

    pub fn set_oidc_auth(&self, user: &User) {
        self.commit(Mutation::SetOidcAuth, |state| state.set_auth(user));
    }

    pub fn set_oidc_user(&self, user: Option<&User>) {
        self.commit(Mutation::SetOidcUser, |state| state.set_user(user));
    }

    pub fn unset_oidc_auth(&self) {
        self.commit(Mutation::UnsetOidcAuth, AuthState::unset_auth);
    }

    /// Clears the tokens but keeps the profile.
    pub fn unset_oidc_tokens(&self) {
        self.commit(Mutation::UnsetOidcTokens, AuthState::unset_tokens);
    }

    pub fn set_oidc_auth_is_checked(&self) {
        self.commit(Mutation::SetOidcAuthIsChecked, |state| state.is_checked = true);
    }

    pub fn set_oidc_events_are_bound(&self) {
        self.commit(Mutation::SetOidcEventsAreBound, |state| {
            state.events_are_bound = true
        });
    }

    /// Records the error and notifies the `oidcError` listener and window.
    pub fn set_oidc_error(&self, payload: ErrorPayload) {
        warn!("{} failed: {}", payload.context, payload.error);
        self.commit(Mutation::SetOidcError(payload.error.clone()), |state| {
            state.error = Some(payload.error.clone())
        });
        self.dispatch_custom_error_event(OIDC_ERROR, &payload);
    }

    /// Atomically claims the one-time listener binding; true for the caller that won.
    pub(crate) fn claim_event_binding(&self) -> bool {
        let claimed = self.with_state(AuthState::bind_events_once);
        if claimed {
            debug!("Mutation {:?}", Mutation::SetOidcEventsAreBound);
            let _ = self.inner.mutations.send(Mutation::SetOidcEventsAreBound);
        }
        claimed
    }

    // Notifications

    pub(crate) fn dispatch_custom_error_event(&self, event_name: &str, payload: &ErrorPayload) {
        if let Some(listener) = self.inner.listeners.error_listener(event_name) {
            listener(payload);
        }
        if self.inner.store_settings.dispatch_events_on_window {
            let detail = serde_json::to_value(payload).unwrap_or(Value::Null);
            dispatch_custom_browser_event(self.inner.window.as_ref(), event_name, &detail);
        }
    }

    /// `userLoaded` for a session found in persisted storage rather than signed in now.
    pub(crate) fn notify_user_loaded(&self, user: &User) {
        let detail = EventDetail::User(Box::new(user.clone()));
        if let Some(listener) = self.inner.listeners.user_loaded.as_ref() {
            listener(&detail);
        }
        if self.inner.store_settings.dispatch_events_on_window {
            dispatch_custom_browser_event(
                self.inner.window.as_ref(),
                ProviderEvent::UserLoaded.name(),
                &detail.to_json(),
            );
        }
    }

    /// Runs `task` on the current tokio runtime without waiting for it.
    pub(crate) fn spawn_background<F>(&self, what: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Starting background {}", what);
                handle.spawn(task);
            }
            Err(_) => warn!("No async runtime, skipping background {}", what),
        }
    }
}
