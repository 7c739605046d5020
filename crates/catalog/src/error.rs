//! Catalog error taxonomy and the user-facing messages shown for each kind.

use thiserror::Error;

use pricebook_core::{DomainError, FieldErrors};

use crate::pricing::PricingRuleError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    /// Field-keyed validation failure, shown inline next to the inputs.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Pricing(#[from] PricingRuleError),

    /// The pricing form refused to drop its only currency.
    #[error("at least one currency is required")]
    LastCurrency,

    #[error("catalog item not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    /// Any other non-success response from the backend.
    #[error("api error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl CatalogError {
    /// Stable machine-readable code (matches the API envelope `code`).
    pub fn code(&self) -> &str {
        match self {
            CatalogError::Validation(_) => "VALIDATION_ERROR",
            CatalogError::Pricing(e) => e.code(),
            CatalogError::LastCurrency => "LAST_CURRENCY",
            CatalogError::NotFound => "NOT_FOUND",
            CatalogError::Unauthorized => "UNAUTHORIZED",
            CatalogError::Conflict(_) => "CONFLICT",
            CatalogError::RateLimited => "RATE_LIMITED",
            CatalogError::Network(_) => "NETWORK_ERROR",
            CatalogError::Api { code, .. } => code.as_deref().unwrap_or("API_ERROR"),
        }
    }

    /// Field-keyed messages, when the error has any.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            CatalogError::Validation(errors) => Some(errors.clone()),
            CatalogError::Pricing(e) => Some(e.field_errors()),
            _ => None,
        }
    }

    /// Whether a read may be retried with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Network(_) | CatalogError::RateLimited => true,
            CatalogError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short message suitable for a toast notification.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Validation(_) => "Please correct the highlighted fields".to_string(),
            CatalogError::Pricing(PricingRuleError::DuplicateCurrency(c)) => {
                format!("{c} is already priced; each currency can only be added once")
            }
            CatalogError::Pricing(PricingRuleError::MultipleBaseCurrencies) => {
                "Only one base currency is allowed".to_string()
            }
            CatalogError::Pricing(PricingRuleError::TooManyCurrencies { max, .. }) => {
                format!("A catalog item can have at most {max} currencies")
            }
            CatalogError::Pricing(PricingRuleError::MissingBaseCurrency) => {
                "Select a base currency".to_string()
            }
            CatalogError::Pricing(_) => "Please correct the pricing details".to_string(),
            CatalogError::LastCurrency => "At least one currency is required".to_string(),
            CatalogError::NotFound => "Catalog item not found".to_string(),
            CatalogError::Unauthorized => {
                "You are not authorized to perform this action".to_string()
            }
            CatalogError::Conflict(_) => {
                "This item was changed elsewhere. Reload and try again".to_string()
            }
            CatalogError::RateLimited => {
                "Too many requests. Please wait a moment and try again".to_string()
            }
            CatalogError::Network(_) => {
                "Network error. Please check your connection and try again".to_string()
            }
            CatalogError::Api { .. } => "An unexpected error occurred".to_string(),
        }
    }
}

/// Map any catalog error to the toast text shown to the user.
pub fn handle_catalog_error(err: &CatalogError) -> String {
    tracing::debug!(code = err.code(), error = %err, "catalog operation failed");
    err.user_message()
}

impl From<FieldErrors> for CatalogError {
    fn from(value: FieldErrors) -> Self {
        CatalogError::Validation(value)
    }
}

impl From<DomainError> for CatalogError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(errors) => CatalogError::Validation(errors),
            DomainError::NotFound => CatalogError::NotFound,
            DomainError::Conflict(msg) => CatalogError::Conflict(msg),
            DomainError::Unauthorized => CatalogError::Unauthorized,
            DomainError::InvalidId(msg) => CatalogError::Validation(FieldErrors::single("id", msg)),
            DomainError::InvariantViolation(msg) => CatalogError::Api {
                status: 500,
                code: Some("INVARIANT_VIOLATION".to_string()),
                message: msg,
            },
        }
    }
}
