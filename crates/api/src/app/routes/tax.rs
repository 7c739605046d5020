use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};

use pricebook_auth::Permission;
use pricebook_catalog::{TaxRateInput, TaxSettingsUpdate};

use crate::app::errors::{self, ApiError};
use crate::app::{dto, services::AppServices};
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_settings).put(update_settings))
        .route("/rates", post(add_rate))
        .route("/rates/:id", delete(delete_rate))
}

pub async fn get_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::TAX_READ)?;
    Ok(errors::ok(services.catalog.get_tax_settings(tenant.tenant_id())))
}

pub async fn update_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<TaxSettingsUpdate>, JsonRejection>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::TAX_WRITE)?;

    let Json(update) = body?;
    let settings = services
        .catalog
        .update_tax_settings(tenant.tenant_id(), update)?;
    Ok(errors::ok(settings))
}

pub async fn add_rate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<TaxRateInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::TAX_WRITE)?;

    let Json(input) = body?;
    let rate = services.catalog.add_tax_rate(tenant.tenant_id(), input)?;
    Ok(errors::created(rate))
}

pub async fn delete_rate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::TAX_WRITE)?;

    let id = dto::parse_rate_id(&id)?;
    let rate = services.catalog.delete_tax_rate(tenant.tenant_id(), id)?;
    Ok(errors::ok(rate))
}
