use tracing::debug;

use super::SessionStore;

/// A no-op store for hosts without session storage (server-side rendering).
/// Writes are dropped and reads always miss.
pub struct NoStore;

impl NoStore {
    pub fn new() -> Self {
        NoStore
    }
}

impl Default for NoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for NoStore {
    fn get_item(&self, _key: &str) -> Option<String> {
        None
    }

    fn set_item(&self, key: &str, _value: &str) {
        debug!("Session storage is disabled, dropping '{}'", key);
    }

    fn remove_item(&self, _key: &str) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that a value written to NoStore is never read back.
    #[test]
    fn test_no_store_drops_writes() {
        let no_store = NoStore::new();
        no_store.set_item("vuex_oidc_active_route", "/protected");
        assert_eq!(no_store.get_item("vuex_oidc_active_route"), None);
    }

    /// Test that NoStore reports itself as disabled.
    #[test]
    fn test_no_store_is_disabled() {
        assert!(!NoStore::new().is_enabled());
    }
}
