//! Multi-currency pricing function endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};

use pricebook_auth::Permission;
use pricebook_catalog::edge::EdgeMultiCurrencyPayload;
use pricebook_catalog::transform::{
    pricing_from_api, transform_catalog_item_for_edge, transform_pricing_data_for_api,
};

use crate::app::errors::{self, ApiError};
use crate::app::{dto, services::AppServices};
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(update_pricing))
        .route("/:catalog_id", get(get_pricing))
        .route("/:catalog_id/:currency", delete(remove_currency))
}

pub async fn get_pricing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(catalog_id): Path<String>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_READ)?;

    let id = dto::parse_item_id(&catalog_id)?;
    let pricing = services
        .catalog
        .get_multi_currency_pricing(tenant.tenant_id(), id)?;
    Ok(errors::ok(transform_pricing_data_for_api(id, &pricing)))
}

pub async fn update_pricing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<EdgeMultiCurrencyPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_WRITE)?;

    let Json(payload) = body?;
    let id = payload.catalog_id;
    let rows = pricing_from_api(payload)?;
    let item = services
        .catalog
        .update_multi_currency_pricing(tenant.tenant_id(), id, rows)?;
    Ok(errors::ok(transform_catalog_item_for_edge(&item)))
}

pub async fn remove_currency(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((catalog_id, currency)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_WRITE)?;

    let id = dto::parse_item_id(&catalog_id)?;
    let currency = dto::parse_currency(&currency)?;
    let item = services
        .catalog
        .remove_currency_pricing(tenant.tenant_id(), id, currency)?;
    Ok(errors::ok(transform_catalog_item_for_edge(&item)))
}
