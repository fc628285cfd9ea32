//! Library exports for oidc-store, shared between the binary and tests.

pub mod auth;
pub mod browser;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod routes;
pub mod store;
pub mod utils;
