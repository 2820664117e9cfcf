//! # keygate_core
//!
//! Core domain logic for Keygate: credentials, token lifecycle, RBAC and
//! the authorization pipeline. Transport-independent; `keygate_api` wires
//! it to HTTP.

pub mod auth;
pub mod authz;
pub mod clock;
pub mod items;
pub mod migrate;
pub mod models;
pub mod rbac;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
