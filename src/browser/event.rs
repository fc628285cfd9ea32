//! `vuexoidc:`-prefixed custom events.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::trace;

use super::window::BrowserWindow;

pub const EVENT_PREFIX: &str = "vuexoidc:";

/// A custom DOM event as handed to the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomBrowserEvent {
    /// Prefixed event name, e.g. `vuexoidc:userLoaded`.
    pub name: String,
    /// Always a JSON object.
    pub detail: Value,
    pub bubbles: bool,
    pub cancelable: bool,
}

impl CustomBrowserEvent {
    /// Builds an event with a shallow copy of `detail`; non-object details become `{}`.
    pub fn new(event_name: &str, detail: &Value) -> Self {
        let detail = match detail {
            Value::Object(map) => Value::Object(map.clone()),
            _ => Value::Object(Map::new()),
        };
        Self {
            name: format!("{}{}", EVENT_PREFIX, event_name),
            detail,
            bubbles: false,
            cancelable: false,
        }
    }

    /// The name without the `vuexoidc:` prefix.
    pub fn event_name(&self) -> &str {
        self.name.strip_prefix(EVENT_PREFIX).unwrap_or(&self.name)
    }
}

/// Dispatches `vuexoidc:<event_name>` on `window`. Does nothing without a window.
pub fn dispatch_custom_browser_event(window: &dyn BrowserWindow, event_name: &str, detail: &Value) {
    if !window.is_available() {
        trace!("No window, dropping browser event '{}'", event_name);
        return;
    }
    window.dispatch_event(CustomBrowserEvent::new(event_name, detail));
}
