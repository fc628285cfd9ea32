use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-route metadata flags.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RouteMeta {
    #[serde(default, rename = "isPublic")]
    pub is_public: bool,
    #[serde(default, rename = "isOidcCallback")]
    pub is_oidc_callback: bool,
    /// Application metadata this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RouteMeta {
    pub fn public() -> Self {
        RouteMeta {
            is_public: true,
            ..Default::default()
        }
    }

    pub fn oidc_callback() -> Self {
        RouteMeta {
            is_oidc_callback: true,
            ..Default::default()
        }
    }
}

/// A navigation target as seen by the guard.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub path: String,
    /// Path including query and hash; what gets restored after sign-in.
    #[serde(rename = "fullPath")]
    pub full_path: String,
    #[serde(default)]
    pub meta: RouteMeta,
    /// Metadata of every matched route record (parents included).
    #[serde(default)]
    pub matched: Vec<RouteMeta>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Route {
            full_path: path.clone(),
            path,
            ..Default::default()
        }
    }

    pub fn with_full_path(mut self, full_path: impl Into<String>) -> Self {
        self.full_path = full_path.into();
        self
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_matched(mut self, meta: RouteMeta) -> Self {
        self.matched.push(meta);
        self
    }

    /// `path` without its trailing slash.
    pub fn normalized_path(&self) -> &str {
        self.path.strip_suffix('/').unwrap_or(&self.path)
    }
}

/// Caller-supplied "is this route public?" predicate.
#[derive(Clone)]
pub struct RoutePredicate(Arc<dyn Fn(&Route) -> bool + Send + Sync>);

impl RoutePredicate {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Route) -> bool + Send + Sync + 'static,
    {
        RoutePredicate(Arc::new(predicate))
    }

    pub fn matches(&self, route: &Route) -> bool {
        (self.0)(route)
    }
}

impl fmt::Debug for RoutePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoutePredicate(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_deserializes_from_router_shape() {
        let route: Route = serde_json::from_value(json!({
            "path": "/admin/",
            "fullPath": "/admin/?tab=1",
            "meta": {"isPublic": false, "title": "Admin"},
            "matched": [{"isOidcCallback": true}]
        }))
        .unwrap();

        assert_eq!(route.normalized_path(), "/admin");
        assert_eq!(route.full_path, "/admin/?tab=1");
        assert_eq!(route.meta.extra.get("title"), Some(&json!("Admin")));
        assert!(route.matched[0].is_oidc_callback);
    }

    #[test]
    fn predicate_wraps_closure() {
        let predicate = RoutePredicate::new(|route| route.path.starts_with("/docs"));
        assert!(predicate.matches(&Route::new("/docs/intro")));
        assert!(!predicate.matches(&Route::new("/account")));
    }
}
