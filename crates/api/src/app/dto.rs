//! Request parsing shared by handlers.

use pricebook_catalog::{CatalogItemId, CatalogListQuery, Currency};
use pricebook_core::EntityId;

use crate::app::errors::ApiError;

/// List query from the raw URL query; `default_limit` applies when the
/// request carries no `limit`.
pub fn list_query(raw: Option<&str>, default_limit: u32) -> CatalogListQuery {
    let raw = raw.unwrap_or("");
    let mut query = CatalogListQuery::from_query_string(raw);
    let has_limit = raw
        .split('&')
        .any(|pair| pair.split('=').next() == Some("limit"));
    if !has_limit {
        query.limit = default_limit;
    }
    query.normalized()
}

pub fn parse_item_id(raw: &str) -> Result<CatalogItemId, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidParam {
        field: "id",
        message: "not a valid catalog item id".to_string(),
    })
}

pub fn parse_rate_id(raw: &str) -> Result<EntityId, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidParam {
        field: "id",
        message: "not a valid tax rate id".to_string(),
    })
}

pub fn parse_currency(raw: &str) -> Result<Currency, ApiError> {
    raw.parse()
        .map_err(|message| ApiError::InvalidParam { field: "currency", message })
}
