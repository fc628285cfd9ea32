pub mod route;
pub mod state;
pub mod user;

pub use route::{Route, RouteMeta, RoutePredicate};
pub use state::{AuthState, Mutation};
pub use user::{Profile, User};
