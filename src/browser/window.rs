use tokio::sync::broadcast;
use tracing::trace;

use super::event::CustomBrowserEvent;

/// The host window events are dispatched on.
pub trait BrowserWindow: Send + Sync {
    fn dispatch_event(&self, event: CustomBrowserEvent);

    /// False when running without a window (server-side rendering).
    fn is_available(&self) -> bool {
        true
    }
}

/// A window that fans events out to in-process subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastWindow {
    sender: broadcast::Sender<CustomBrowserEvent>,
}

impl BroadcastWindow {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CustomBrowserEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastWindow {
    fn default() -> Self {
        Self::new(64)
    }
}

impl BrowserWindow for BroadcastWindow {
    fn dispatch_event(&self, event: CustomBrowserEvent) {
        let name = event.name.clone();
        match self.sender.send(event) {
            Ok(receivers) => trace!("Dispatched '{}' to {} subscriber(s)", name, receivers),
            Err(_) => trace!("Dispatched '{}' with no subscribers", name),
        }
    }
}

/// No window at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWindow;

impl BrowserWindow for NoWindow {
    fn dispatch_event(&self, _event: CustomBrowserEvent) {}

    fn is_available(&self) -> bool {
        false
    }
}
