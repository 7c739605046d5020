use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, RawQuery},
    response::Response,
    routing::{get, post},
    Json, Router,
};

use pricebook_auth::Permission;
use pricebook_catalog::edge::EdgeCatalogItemPayload;
use pricebook_catalog::transform::{
    catalog_changes_from_api, catalog_input_from_api, transform_catalog_item_for_edge,
};

use crate::app::errors::{self, ApiError};
use crate::app::{dto, services::AppServices};
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/restore", post(restore_item))
        .route("/:id/versions", get(version_history))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    RawQuery(raw): RawQuery,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_READ)?;

    let query = dto::list_query(raw.as_deref(), services.default_page_size);
    let page = services
        .catalog
        .list_catalog_items(tenant.tenant_id(), &query)
        .map(|item| transform_catalog_item_for_edge(&item));
    Ok(errors::ok(page))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<EdgeCatalogItemPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_WRITE)?;

    let Json(payload) = body?;
    let input = catalog_input_from_api(payload)?;
    let item = services
        .catalog
        .create_catalog_item(tenant.tenant_id(), Some(principal.user_id()), input)?;
    Ok(errors::created(transform_catalog_item_for_edge(&item)))
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_READ)?;

    let id = dto::parse_item_id(&id)?;
    let item = services.catalog.get_catalog_item(tenant.tenant_id(), id)?;
    Ok(errors::ok(transform_catalog_item_for_edge(&item)))
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<EdgeCatalogItemPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_WRITE)?;

    let id = dto::parse_item_id(&id)?;
    let Json(payload) = body?;
    let changes = catalog_changes_from_api(payload)?;
    let item = services.catalog.update_catalog_item(
        tenant.tenant_id(),
        Some(principal.user_id()),
        id,
        changes,
    )?;
    Ok(errors::ok(transform_catalog_item_for_edge(&item)))
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_WRITE)?;

    let id = dto::parse_item_id(&id)?;
    let item = services.catalog.delete_catalog_item(tenant.tenant_id(), id)?;
    Ok(errors::ok(transform_catalog_item_for_edge(&item)))
}

pub async fn restore_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_WRITE)?;

    let id = dto::parse_item_id(&id)?;
    let item = services.catalog.restore_catalog_item(tenant.tenant_id(), id)?;
    Ok(errors::ok(transform_catalog_item_for_edge(&item)))
}

pub async fn version_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, &Permission::CATALOG_READ)?;

    let id = dto::parse_item_id(&id)?;
    let versions = services
        .catalog
        .get_version_history(tenant.tenant_id(), id)?
        .iter()
        .map(transform_catalog_item_for_edge)
        .collect::<Vec<_>>();
    Ok(errors::ok(versions))
}
