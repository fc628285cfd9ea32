pub mod base;
pub mod events;
pub mod factory;
pub mod memory_provider;

// Re-export so callers can "use crate::providers::*;"
pub use base::*;
pub use events::{EventDetail, EventListener, ListenerId, ProviderEvent, ProviderEvents};
pub use factory::{create_user_manager, get_effective_config, get_oidc_callback_path, EffectiveConfig};
pub use memory_provider::InMemoryProvider;
