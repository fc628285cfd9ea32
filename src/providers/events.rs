//! Lifecycle events raised by the identity-provider client.
//!
//! Every event has one entry in [`ProviderEvent::ALL`]; listeners register against the
//! enum variant, never against a name built at runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::trace;

use crate::error::ErrorPayload;
use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProviderEvent {
    #[serde(rename = "userLoaded")]
    UserLoaded,
    #[serde(rename = "userUnloaded")]
    UserUnloaded,
    #[serde(rename = "accessTokenExpiring")]
    AccessTokenExpiring,
    #[serde(rename = "accessTokenExpired")]
    AccessTokenExpired,
    #[serde(rename = "silentRenewError")]
    SilentRenewError,
    #[serde(rename = "userSignedOut")]
    UserSignedOut,
}

impl ProviderEvent {
    pub const ALL: [ProviderEvent; 6] = [
        ProviderEvent::UserLoaded,
        ProviderEvent::UserUnloaded,
        ProviderEvent::AccessTokenExpiring,
        ProviderEvent::AccessTokenExpired,
        ProviderEvent::SilentRenewError,
        ProviderEvent::UserSignedOut,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProviderEvent::UserLoaded => "userLoaded",
            ProviderEvent::UserUnloaded => "userUnloaded",
            ProviderEvent::AccessTokenExpiring => "accessTokenExpiring",
            ProviderEvent::AccessTokenExpired => "accessTokenExpired",
            ProviderEvent::SilentRenewError => "silentRenewError",
            ProviderEvent::UserSignedOut => "userSignedOut",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.name() == name)
    }
}

impl fmt::Display for ProviderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an event carries.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    None,
    User(Box<User>),
    Error(ErrorPayload),
    Message(String),
}

impl EventDetail {
    /// JSON form used as a browser event's `detail`; always an object.
    pub fn to_json(&self) -> Value {
        match self {
            EventDetail::None => json!({}),
            EventDetail::User(user) => serde_json::to_value(user).unwrap_or_else(|_| json!({})),
            EventDetail::Error(payload) => {
                serde_json::to_value(payload).unwrap_or_else(|_| json!({}))
            }
            EventDetail::Message(message) => json!({ "message": message }),
        }
    }
}

pub type EventListener = Arc<dyn Fn(&EventDetail) + Send + Sync>;

/// Handle returned by [`ProviderEvents::add`], used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registry owned by a provider client.
#[derive(Default)]
pub struct ProviderEvents {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<ProviderEvent, Vec<(ListenerId, EventListener)>>>,
}

impl ProviderEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, event: ProviderEvent, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event)
            .or_default()
            .push((id, listener));
        trace!("Added '{}' listener {:?}", event, id);
        id
    }

    /// Returns false when no listener with `id` was registered for `event`.
    pub fn remove(&self, event: ProviderEvent, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        match listeners.get_mut(&event) {
            Some(registered) => {
                let before = registered.len();
                registered.retain(|(existing, _)| *existing != id);
                before != registered.len()
            }
            None => false,
        }
    }

    /// Calls every listener of `event`; returns how many ran.
    ///
    /// Listeners run outside the registry lock so they may add or remove listeners.
    pub fn raise(&self, event: ProviderEvent, detail: &EventDetail) -> usize {
        let listeners: Vec<EventListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map(|registered| registered.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();
        trace!("Raising '{}' to {} listener(s)", event, listeners.len());
        for listener in &listeners {
            listener(detail);
        }
        listeners.len()
    }

    pub fn listener_count(&self, event: ProviderEvent) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map_or(0, Vec::len)
    }
}
