//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, verifier, codec, authenticator and guard
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request bodies that do not map 1:1 onto domain types
//! - `errors.rs`: consistent `{"detail": ...}` error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use westeros_infra::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(router(Arc::new(services)))
}

/// Router over already-built services (tests wire their own).
pub fn router(services: Arc<AppServices>) -> Router {
    routes::router().layer(ServiceBuilder::new().layer(Extension(services)))
}
