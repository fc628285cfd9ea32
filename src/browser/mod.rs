//! Bridge between store events and the host window.

pub mod event;
pub mod frame;
pub mod window;

pub use event::{dispatch_custom_browser_event, CustomBrowserEvent, EVENT_PREFIX};
pub use frame::FrameLoader;
pub use window::{BroadcastWindow, BrowserWindow, NoWindow};
