//! Wire shapes of the catalog backend.
//!
//! These mirror the JSON exchanged with the HTTP layer: enum values travel as
//! backend codes and currencies as raw strings, so that unsupported values
//! surface as field-keyed validation errors instead of decode failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricebook_core::{EntityId, FieldErrors, TenantId, UserId};

use crate::item::CatalogItemId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePriceAttributes {
    /// Pricing type code (`FIXED`, `UNIT`, `HOUR`, `DAY`).
    #[serde(rename = "type")]
    pub pricing_type: String,
    pub base_amount: f64,
    pub currency: String,
    #[serde(default = "default_billing_mode")]
    pub billing_mode: String,
}

fn default_billing_mode() -> String {
    "manual".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePricing {
    pub currency: String,
    pub price: f64,
    #[serde(default)]
    pub is_base_currency: bool,
    #[serde(default)]
    pub tax_included: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate_id: Option<EntityId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Stored catalog item as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeCatalogItem {
    pub id: CatalogItemId,
    pub tenant_id: TenantId,
    pub service_type_code: u8,
    pub name: String,
    pub description_content: Option<String>,
    pub short_description: Option<String>,
    pub status: String,
    pub price_attributes: EdgePriceAttributes,
    pub pricing: Vec<EdgePricing>,
    pub version_number: u64,
    pub is_current_version: bool,
    pub original_id: CatalogItemId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// Create/update request body. Every field is optional on the wire; creation
/// checks that the required ones are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeCatalogItemPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type_code: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_attributes: Option<EdgePriceAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Vec<EdgePricing>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

/// Body of the multi-currency pricing function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMultiCurrencyPayload {
    pub catalog_id: CatalogItemId,
    pub currencies: Vec<EdgePricing>,
}

/// Envelope wrapping every API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            validation_errors: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>, validation_errors: Option<FieldErrors>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: Some(code.into()),
            validation_errors,
        }
    }
}
