//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: in-process repositories and the catalog service
//! - `routes/`: handlers, one file per resource
//! - `dto.rs`: request parsing helpers shared by handlers
//! - `errors.rs`: the response envelope and error → status mapping

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(config: &ApiConfig) -> Router {
    let jwt = Arc::new(pricebook_auth::Hs256JwtValidator::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services(config));

    // Everything except /health needs a token.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
