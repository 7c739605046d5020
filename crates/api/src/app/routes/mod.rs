use axum::{routing::get, Router};

pub mod catalog;
pub mod pricing;
pub mod system;
pub mod tax;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/api/catalog", catalog::router())
        .nest("/api/tax-settings", tax::router())
        .nest("/functions/v1/catalog-items/multi-currency", pricing::router())
}
