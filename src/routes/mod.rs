//! Route handling: classification, navigation guards and sign-in callback pages.

pub mod callback;
pub mod classify;
pub mod middleware;

pub use callback::{
    process_signin_callback, process_silent_signin_callback, Navigator, PopupCallbackHandler,
    SignInCallbackHandler, SignOutCallbackHandler,
};
pub use classify::{RouteClassification, RouteClassifier};
pub use middleware::{AccessCheck, ContextMiddleware, PopupMiddleware, RouteContext, RouterMiddleware};
