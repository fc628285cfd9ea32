use std::sync::Arc;

use tracing::info;

use super::{memory_store::MemorySessionStore, no_store::NoStore};

/// Session-storage key holding the path to restore after a redirect sign-in.
pub const ACTIVE_ROUTE_KEY: &str = "vuex_oidc_active_route";

/// The SessionStore trait abstracts a session-lifetime key/value slot
/// (the browser's `sessionStorage` in a web front end).
pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
    fn is_enabled(&self) -> bool {
        // Real stores are always enabled; NoStore returns false so callers can log why
        // nothing was persisted.
        true
    }
}

/// Creates the default session store: in memory when `enabled`, otherwise NoStore.
pub fn create_session_store(enabled: bool) -> Arc<dyn SessionStore> {
    if !enabled {
        info!("Session storage is disabled. Using NoStore.");
        return Arc::new(NoStore::new());
    }
    Arc::new(MemorySessionStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_session_store_honours_enabled_flag() {
        assert!(create_session_store(true).is_enabled());
        assert!(!create_session_store(false).is_enabled());
    }
}
