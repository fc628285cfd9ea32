use serde::Serialize;
use tracing::trace;

use crate::config::StoreSettings;
use crate::models::{Route, RoutePredicate};
use crate::providers::{get_oidc_callback_path, EffectiveConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteClassification {
    OidcCallback,
    Public,
    Protected,
}

/// Decides, per route, whether it is a sign-in callback, public or protected.
#[derive(Debug, Clone, Default)]
pub struct RouteClassifier {
    callback_paths: Vec<String>,
    public_paths: Vec<String>,
    is_public_route: Option<RoutePredicate>,
}

fn strip_trailing_slash(path: &str) -> &str {
    path.strip_suffix('/').unwrap_or(path)
}

impl RouteClassifier {
    /// Callback paths come from the redirect, popup and silent redirect URIs.
    pub fn new(config: &EffectiveConfig, settings: &StoreSettings) -> Self {
        let callback_paths = [
            config.redirect_uri(),
            config.popup_redirect_uri(),
            config.silent_redirect_uri(),
        ]
        .into_iter()
        .filter_map(|uri| get_oidc_callback_path(uri, &settings.route_base))
        .collect();

        Self {
            callback_paths,
            public_paths: settings
                .public_route_paths
                .iter()
                .map(|path| strip_trailing_slash(path).to_string())
                .collect(),
            is_public_route: settings.is_public_route.clone(),
        }
    }

    /// The redirect, popup and silent callback paths, in that order, where configured.
    pub fn callback_paths(&self) -> &[String] {
        &self.callback_paths
    }

    pub fn is_oidc_callback(&self, route: &Route) -> bool {
        if route.meta.is_oidc_callback || route.matched.iter().any(|meta| meta.is_oidc_callback) {
            return true;
        }
        let path = route.normalized_path();
        self.callback_paths.iter().any(|callback| callback == path)
    }

    pub fn is_public(&self, route: &Route) -> bool {
        if route.meta.is_public || route.matched.iter().any(|meta| meta.is_public) {
            return true;
        }
        let path = route.normalized_path();
        if self.public_paths.iter().any(|public| public == path) {
            return true;
        }
        self.is_public_route
            .as_ref()
            .is_some_and(|predicate| predicate.matches(route))
    }

    pub fn classify(&self, route: &Route) -> RouteClassification {
        let classification = if self.is_oidc_callback(route) {
            RouteClassification::OidcCallback
        } else if self.is_public(route) {
            RouteClassification::Public
        } else {
            RouteClassification::Protected
        };
        trace!("Route '{}' is {:?}", route.path, classification);
        classification
    }
}
