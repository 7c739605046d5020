//! Response envelope and error mapping.
//!
//! Every response body is an [`ApiResponse`]: `success`, plus `data` on
//! success or `error`/`code`/`validation_errors` on failure.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use pricebook_auth::AuthzError;
use pricebook_catalog::{ApiResponse, CatalogError};
use pricebook_core::FieldErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// Path or query parameter that does not parse.
    #[error("invalid {field}: {message}")]
    InvalidParam { field: &'static str, message: String },

    #[error("malformed request body: {0}")]
    Body(String),
}

impl From<FieldErrors> for ApiError {
    fn from(value: FieldErrors) -> Self {
        ApiError::Catalog(CatalogError::Validation(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::Body(value.body_text())
    }
}

/// HTTP status for a catalog error.
pub fn catalog_status(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::Validation(_) | CatalogError::Pricing(_) | CatalogError::LastCurrency => {
            StatusCode::BAD_REQUEST
        }
        CatalogError::NotFound => StatusCode::NOT_FOUND,
        CatalogError::Unauthorized => StatusCode::FORBIDDEN,
        CatalogError::Conflict(_) => StatusCode::CONFLICT,
        CatalogError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        CatalogError::Network(_) => StatusCode::BAD_GATEWAY,
        CatalogError::Api { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Catalog(err) => {
                let status = catalog_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "catalog request failed");
                }
                let body = ApiResponse::<()>::failure(err.code(), err.to_string(), err.field_errors());
                (status, Json(body)).into_response()
            }
            ApiError::Forbidden(err) => json_error(StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string()),
            ApiError::InvalidParam { field, message } => {
                let errors = FieldErrors::single(field, message.clone());
                let body = ApiResponse::<()>::failure(
                    "VALIDATION_ERROR",
                    format!("invalid {field}: {message}"),
                    Some(errors),
                );
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::Body(message) => json_error(StatusCode::BAD_REQUEST, "INVALID_BODY", message),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::failure(code, message, None))).into_response()
}

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::ok(data))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricebook_catalog::PricingRuleError;

    #[test]
    fn rule_violations_are_bad_requests_and_conflicts_are_409() {
        assert_eq!(
            catalog_status(&CatalogError::Pricing(PricingRuleError::MultipleBaseCurrencies)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(catalog_status(&CatalogError::LastCurrency), StatusCode::BAD_REQUEST);
        assert_eq!(
            catalog_status(&CatalogError::Conflict("stale".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            catalog_status(&CatalogError::Api {
                status: 500,
                code: None,
                message: "boom".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
