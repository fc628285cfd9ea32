pub mod actions;
pub mod listeners;
pub mod payload;
pub mod store;

// Re-export so we can do "use crate::auth::*;"
pub use listeners::{ErrorListener, OidcEventListeners, AUTOMATIC_SILENT_RENEW_ERROR, OIDC_ERROR};
pub use payload::{AuthenticatePayload, PopupPayload, SignInMode, SilentPayload};
pub use store::{OidcStore, OidcStoreBuilder};
