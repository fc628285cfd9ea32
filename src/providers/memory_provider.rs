//! An identity-provider client that keeps its session in memory.
//!
//! Used by the binary's dry runs and by tests: every operation can be scripted with the
//! outcome it should produce next, and every call is recorded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::base::{IdentityProvider, ProviderOptions, SignoutRequest, SignoutResponse};
use super::events::{EventDetail, ProviderEvent, ProviderEvents};
use super::factory::EffectiveConfig;
use crate::error::ProviderError;
use crate::models::User;

/// Path appended to the authority when building end-session URLs.
const END_SESSION_PATH: &str = "connect/endsession";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetUser,
    SigninRedirect,
    SigninRedirectCallback,
    SigninSilent,
    SigninSilentCallback,
    SigninPopup,
    SigninPopupCallback,
    SignoutRedirect,
    SignoutRedirectCallback,
    SignoutPopup,
    SignoutPopupCallback,
    CreateSignoutRequest,
    StoreUser,
    RemoveUser,
    ClearStaleState,
}

/// A recorded call: the operation plus the options or URL it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub operation: Operation,
    pub options: Option<ProviderOptions>,
    pub url: Option<String>,
}

/// What a scripted operation produces. `Ok(None)` means success without a user.
pub type Outcome = Result<Option<User>, ProviderError>;

pub struct InMemoryProvider {
    config: EffectiveConfig,
    session: Mutex<Option<User>>,
    outcomes: Mutex<HashMap<Operation, VecDeque<Outcome>>>,
    calls: Mutex<Vec<ProviderCall>>,
    events: ProviderEvents,
}

impl InMemoryProvider {
    pub fn new(config: EffectiveConfig) -> Self {
        info!(
            "In-memory identity provider for client '{}'",
            config.client_id().unwrap_or_default()
        );
        Self {
            config,
            session: Mutex::new(None),
            outcomes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            events: ProviderEvents::new(),
        }
    }

    /// Seeds the persisted session.
    pub fn with_user(self, user: User) -> Self {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(user);
        self
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    /// Queues the outcome of the next call to `operation`.
    pub fn script(&self, operation: Operation, outcome: Outcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(operation)
            .or_default()
            .push_back(outcome);
    }

    /// Replaces the persisted session without raising events.
    pub fn set_session(&self, user: Option<User>) {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = user;
    }

    pub fn session(&self) -> Option<User> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    fn record(&self, operation: Operation, options: Option<&ProviderOptions>, url: Option<&str>) {
        debug!("Identity provider call {:?}", operation);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ProviderCall {
                operation,
                options: options.cloned(),
                url: url.map(str::to_string),
            });
    }

    fn next_outcome(&self, operation: Operation) -> Option<Outcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
    }

    /// Persists `user` and raises `userLoaded`, as a completed sign-in does.
    fn load(&self, user: User) -> User {
        self.set_session(Some(user.clone()));
        self.events
            .raise(ProviderEvent::UserLoaded, &EventDetail::User(Box::new(user.clone())));
        user
    }

    fn unload(&self) {
        self.set_session(None);
        self.events
            .raise(ProviderEvent::UserUnloaded, &EventDetail::None);
    }

    /// Sign-in operations: a scripted user is loaded, otherwise `default_error`.
    fn sign_in(&self, operation: Operation, default_error: &str) -> Result<User, ProviderError> {
        match self.next_outcome(operation) {
            Some(Ok(Some(user))) => Ok(self.load(user)),
            Some(Ok(None)) => Err(ProviderError::new("No user returned by the identity provider")),
            Some(Err(e)) => Err(e),
            None => Err(ProviderError::new(default_error)),
        }
    }

    /// Operations without a user result: succeed unless scripted to fail.
    fn complete(&self, operation: Operation) -> Result<(), ProviderError> {
        match self.next_outcome(operation) {
            Some(Err(e)) => Err(e),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryProvider {
    async fn get_user(&self) -> Result<Option<User>, ProviderError> {
        self.record(Operation::GetUser, None, None);
        match self.next_outcome(Operation::GetUser) {
            Some(outcome) => outcome,
            None => Ok(self.session()),
        }
    }

    async fn signin_redirect(&self, options: &ProviderOptions) -> Result<(), ProviderError> {
        self.record(Operation::SigninRedirect, Some(options), None);
        self.complete(Operation::SigninRedirect)
    }

    async fn signin_redirect_callback(&self, url: Option<&str>) -> Result<User, ProviderError> {
        self.record(Operation::SigninRedirectCallback, None, url);
        self.sign_in(
            Operation::SigninRedirectCallback,
            "No matching state found in storage",
        )
    }

    async fn signin_silent(&self, options: &ProviderOptions) -> Result<User, ProviderError> {
        self.record(Operation::SigninSilent, Some(options), None);
        self.sign_in(Operation::SigninSilent, "login_required")
    }

    async fn signin_silent_callback(&self, url: Option<&str>) -> Result<(), ProviderError> {
        self.record(Operation::SigninSilentCallback, None, url);
        self.complete(Operation::SigninSilentCallback)
    }

    async fn signin_popup(&self, options: &ProviderOptions) -> Result<User, ProviderError> {
        self.record(Operation::SigninPopup, Some(options), None);
        self.sign_in(Operation::SigninPopup, "Popup window closed")
    }

    async fn signin_popup_callback(&self, url: Option<&str>) -> Result<(), ProviderError> {
        self.record(Operation::SigninPopupCallback, None, url);
        self.complete(Operation::SigninPopupCallback)
    }

    async fn signout_redirect(&self, options: &ProviderOptions) -> Result<(), ProviderError> {
        self.record(Operation::SignoutRedirect, Some(options), None);
        self.complete(Operation::SignoutRedirect)?;
        self.unload();
        Ok(())
    }

    async fn signout_redirect_callback(
        &self,
        url: Option<&str>,
    ) -> Result<SignoutResponse, ProviderError> {
        self.record(Operation::SignoutRedirectCallback, None, url);
        self.complete(Operation::SignoutRedirectCallback)?;
        Ok(SignoutResponse::default())
    }

    async fn signout_popup(&self, options: &ProviderOptions) -> Result<(), ProviderError> {
        self.record(Operation::SignoutPopup, Some(options), None);
        self.complete(Operation::SignoutPopup)?;
        self.unload();
        Ok(())
    }

    async fn signout_popup_callback(&self, url: Option<&str>) -> Result<(), ProviderError> {
        self.record(Operation::SignoutPopupCallback, None, url);
        self.complete(Operation::SignoutPopupCallback)
    }

    async fn create_signout_request(
        &self,
        args: &ProviderOptions,
    ) -> Result<SignoutRequest, ProviderError> {
        self.record(Operation::CreateSignoutRequest, Some(args), None);
        self.complete(Operation::CreateSignoutRequest)?;

        let authority = self
            .config
            .authority()
            .ok_or_else(|| ProviderError::new("No authority configured"))?;
        let mut url = url::Url::parse(&format!(
            "{}/{}",
            authority.trim_end_matches('/'),
            END_SESSION_PATH
        ))
        .map_err(|e| ProviderError::new(format!("Invalid authority '{}': {}", authority, e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in args {
                match value {
                    Value::String(s) => {
                        pairs.append_pair(key, s);
                    }
                    Value::Null => {}
                    other => {
                        pairs.append_pair(key, &other.to_string());
                    }
                }
            }
            if !args.contains_key("post_logout_redirect_uri") {
                if let Some(uri) = self.config.post_logout_redirect_uri() {
                    pairs.append_pair("post_logout_redirect_uri", uri);
                }
            }
        }

        Ok(SignoutRequest {
            url: url.to_string(),
            state: args.get("state").cloned(),
        })
    }

    async fn store_user(&self, user: &User) -> Result<(), ProviderError> {
        self.record(Operation::StoreUser, None, None);
        self.complete(Operation::StoreUser)?;
        self.set_session(Some(user.clone()));
        Ok(())
    }

    async fn remove_user(&self) -> Result<(), ProviderError> {
        self.record(Operation::RemoveUser, None, None);
        self.complete(Operation::RemoveUser)?;
        self.unload();
        Ok(())
    }

    async fn clear_stale_state(&self) -> Result<(), ProviderError> {
        self.record(Operation::ClearStaleState, None, None);
        self.complete(Operation::ClearStaleState)
    }

    fn events(&self) -> &ProviderEvents {
        &self.events
    }
}
