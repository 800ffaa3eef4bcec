//! HTTP API: routing, authorization extractor and request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;

pub use context::{AnyScope, HousesWrite, RequiredScopes, UsersRead, UsersWrite};
pub use middleware::Authorized;
