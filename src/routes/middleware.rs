//! Navigation guards around the store's access decision.
//!
//! Denial is a normal outcome: a denied guard simply does not proceed, the access check
//! has already started sign-in.

use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::auth::{OidcStore, SignInMode};
use crate::models::Route;

/// Something that can decide whether navigation to a route may proceed.
pub trait AccessCheck: Send + Sync {
    fn check_access<'a>(&'a self, route: &'a Route, mode: SignInMode) -> BoxFuture<'a, bool>;
}

impl AccessCheck for OidcStore {
    fn check_access<'a>(&'a self, route: &'a Route, mode: SignInMode) -> BoxFuture<'a, bool> {
        self.oidc_check_access_with(route, mode).boxed()
    }
}

async fn decide<S: AccessCheck + ?Sized>(
    store: &S,
    namespace: Option<&str>,
    route: &Route,
    mode: SignInMode,
) -> bool {
    let has_access = store.check_access(route, mode).await;
    debug!(
        namespace = namespace.unwrap_or_default(),
        path = %route.path,
        has_access,
        "Route access decided"
    );
    has_access
}

/// Guard for routers with a `(to, from, next)` hook.
pub struct RouterMiddleware<S = OidcStore> {
    store: S,
    namespace: Option<String>,
}

impl<S: AccessCheck> RouterMiddleware<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Calls `next` once if access to `to` is granted; returns the decision.
    pub async fn guard<F: FnOnce()>(&self, to: &Route, _from: &Route, next: F) -> bool {
        let has_access = decide(&self.store, self.namespace.as_deref(), to, SignInMode::Redirect).await;
        if has_access {
            next();
        }
        has_access
    }
}

/// Guard that signs in with a popup instead of leaving the page.
pub struct PopupMiddleware<S = OidcStore> {
    store: S,
    namespace: Option<String>,
}

impl<S: AccessCheck> PopupMiddleware<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub async fn guard<F: FnOnce()>(&self, to: &Route, _from: &Route, next: F) -> bool {
        let has_access = decide(&self.store, self.namespace.as_deref(), to, SignInMode::Popup).await;
        if has_access {
            next();
        }
        has_access
    }
}

/// What a context-style (server-rendered) framework hands its middleware.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    pub route: Route,
}

/// Middleware for frameworks that call `middleware(context)` and await the result.
pub struct ContextMiddleware<S = OidcStore> {
    store: S,
    namespace: Option<String>,
}

impl<S: AccessCheck> ContextMiddleware<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Resolves the access decision for `context.route`; never an error.
    pub async fn handle(&self, context: &RouteContext) -> bool {
        decide(
            &self.store,
            self.namespace.as_deref(),
            &context.route,
            SignInMode::Redirect,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedDecision {
        has_access: bool,
        modes: Mutex<Vec<SignInMode>>,
    }

    impl FixedDecision {
        fn new(has_access: bool) -> Self {
            Self {
                has_access,
                modes: Mutex::new(Vec::new()),
            }
        }
    }

    impl AccessCheck for FixedDecision {
        fn check_access<'a>(&'a self, _route: &'a Route, mode: SignInMode) -> BoxFuture<'a, bool> {
            self.modes.lock().unwrap().push(mode);
            futures::future::ready(self.has_access).boxed()
        }
    }

    #[tokio::test]
    async fn router_guard_proceeds_only_when_granted() {
        let calls = AtomicUsize::new(0);
        let granted = RouterMiddleware::new(FixedDecision::new(true)).with_namespace("auth");
        assert!(granted.guard(&Route::new("/a"), &Route::new("/"), || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let denied = RouterMiddleware::new(FixedDecision::new(false));
        assert!(!denied.guard(&Route::new("/a"), &Route::new("/"), || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn popup_guard_asks_for_popup_sign_in() {
        let popup = PopupMiddleware::new(FixedDecision::new(true));
        popup.guard(&Route::new("/a"), &Route::new("/"), || {}).await;
        assert_eq!(*popup.store.modes.lock().unwrap(), vec![SignInMode::Popup]);
    }

    #[tokio::test]
    async fn context_middleware_resolves_denial_as_false() {
        let middleware = ContextMiddleware::new(FixedDecision::new(false));
        let context = RouteContext {
            route: Route::new("/protected"),
        };
        assert!(!middleware.handle(&context).await);
        assert_eq!(*middleware.store.modes.lock().unwrap(), vec![SignInMode::Redirect]);
    }
}
