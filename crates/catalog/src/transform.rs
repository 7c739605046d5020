//! Pure mappings between wire ("edge") shapes and domain shapes.

use pricebook_core::FieldErrors;

use crate::constants::{BillingMode, CatalogStatus, CatalogType, Currency, PricingType};
use crate::edge::{
    EdgeCatalogItem, EdgeCatalogItemPayload, EdgeMultiCurrencyPayload, EdgePriceAttributes,
    EdgePricing,
};
use crate::item::{CatalogItem, CatalogItemChanges, CatalogItemId, CatalogItemInput, DescriptionContent};
use crate::pricing::{CatalogPricing, PriceAttributes};

/// Stored record → domain item.
pub fn transform_catalog_item_for_ui(edge: EdgeCatalogItem) -> Result<CatalogItem, FieldErrors> {
    let mut errors = FieldErrors::new();

    let catalog_type = parse_type_code(edge.service_type_code, &mut errors);
    let status = parse_field::<CatalogStatus>("status", &edge.status, &mut errors);
    let price_attributes = price_attributes_from_edge(&edge.price_attributes, &mut errors);
    let pricing = pricing_rows_from_edge(edge.pricing, &mut errors);

    match (catalog_type, status, price_attributes) {
        (Some(catalog_type), Some(status), Some(price_attributes)) if errors.is_empty() => {
            Ok(CatalogItem {
                id: edge.id,
                tenant_id: edge.tenant_id,
                catalog_type,
                name: edge.name,
                description: DescriptionContent {
                    description: edge.description_content,
                    short_description: edge.short_description,
                },
                status,
                price_attributes,
                pricing,
                version_number: edge.version_number,
                is_current_version: edge.is_current_version,
                original_id: edge.original_id,
                created_at: edge.created_at,
                updated_at: edge.updated_at,
                created_by: edge.created_by,
            })
        }
        _ => Err(errors),
    }
}

/// Domain item → stored record.
pub fn transform_catalog_item_for_edge(item: &CatalogItem) -> EdgeCatalogItem {
    EdgeCatalogItem {
        id: item.id,
        tenant_id: item.tenant_id,
        service_type_code: item.catalog_type.api_code(),
        name: item.name.clone(),
        description_content: item.description.description.clone(),
        short_description: item.description.short_description.clone(),
        status: item.status.as_str().to_string(),
        price_attributes: price_attributes_for_edge(&item.price_attributes),
        pricing: item.pricing.iter().map(pricing_row_for_edge).collect(),
        version_number: item.version_number,
        is_current_version: item.is_current_version,
        original_id: item.original_id,
        created_at: item.created_at,
        updated_at: item.updated_at,
        created_by: item.created_by,
    }
}

/// Create input → request body.
pub fn transform_catalog_item_for_api(input: &CatalogItemInput) -> EdgeCatalogItemPayload {
    EdgeCatalogItemPayload {
        service_type_code: Some(input.catalog_type.api_code()),
        name: Some(input.name.clone()),
        description_content: input.description.description.clone(),
        short_description: input.description.short_description.clone(),
        status: Some(input.status.as_str().to_string()),
        price_attributes: Some(price_attributes_for_edge(&input.price_attributes)),
        pricing: if input.pricing.is_empty() {
            None
        } else {
            Some(input.pricing.iter().map(pricing_row_for_edge).collect())
        },
        expected_version: None,
    }
}

/// Update changes → request body.
pub fn transform_catalog_changes_for_api(changes: &CatalogItemChanges) -> EdgeCatalogItemPayload {
    let (description_content, short_description) = match &changes.description {
        Some(d) => (d.description.clone(), d.short_description.clone()),
        None => (None, None),
    };
    EdgeCatalogItemPayload {
        service_type_code: changes.catalog_type.map(CatalogType::api_code),
        name: changes.name.clone(),
        description_content,
        short_description,
        status: changes.status.map(|s| s.as_str().to_string()),
        price_attributes: changes.price_attributes.as_ref().map(price_attributes_for_edge),
        pricing: changes
            .pricing
            .as_ref()
            .map(|rows| rows.iter().map(pricing_row_for_edge).collect()),
        expected_version: changes.expected_version,
    }
}

/// Request body → create input. Missing required fields and unknown codes
/// are reported per field.
pub fn catalog_input_from_api(payload: EdgeCatalogItemPayload) -> Result<CatalogItemInput, FieldErrors> {
    let mut errors = FieldErrors::new();

    let catalog_type = match payload.service_type_code {
        Some(code) => parse_type_code(code, &mut errors),
        None => {
            errors.push("type", "catalog type is required");
            None
        }
    };
    if payload.name.is_none() {
        errors.push("name", "name is required");
    }
    let status = match payload.status.as_deref() {
        Some(s) => parse_field::<CatalogStatus>("status", s, &mut errors),
        None => Some(CatalogStatus::default()),
    };
    let price_attributes = match &payload.price_attributes {
        Some(attrs) => price_attributes_from_edge(attrs, &mut errors),
        None => {
            errors.push("base_amount", "price is required");
            None
        }
    };
    let pricing = payload
        .pricing
        .map(|rows| pricing_rows_from_edge(rows, &mut errors))
        .unwrap_or_default();

    match (catalog_type, payload.name, status, price_attributes) {
        (Some(catalog_type), Some(name), Some(status), Some(price_attributes)) if errors.is_empty() => {
            Ok(CatalogItemInput {
                catalog_type,
                name,
                description: DescriptionContent {
                    description: payload.description_content,
                    short_description: payload.short_description,
                },
                status,
                price_attributes,
                pricing,
            })
        }
        _ => Err(errors),
    }
}

/// Request body → update changes.
pub fn catalog_changes_from_api(payload: EdgeCatalogItemPayload) -> Result<CatalogItemChanges, FieldErrors> {
    let mut errors = FieldErrors::new();

    let catalog_type = payload
        .service_type_code
        .and_then(|code| parse_type_code(code, &mut errors));
    let status = payload
        .status
        .as_deref()
        .and_then(|s| parse_field::<CatalogStatus>("status", s, &mut errors));
    let price_attributes = payload
        .price_attributes
        .as_ref()
        .and_then(|attrs| price_attributes_from_edge(attrs, &mut errors));
    let pricing = payload
        .pricing
        .map(|rows| pricing_rows_from_edge(rows, &mut errors));
    let description = if payload.description_content.is_some() || payload.short_description.is_some() {
        Some(DescriptionContent {
            description: payload.description_content,
            short_description: payload.short_description,
        })
    } else {
        None
    };

    errors.into_result()?;
    Ok(CatalogItemChanges {
        catalog_type,
        name: payload.name,
        description,
        status,
        price_attributes,
        pricing,
        expected_version: payload.expected_version,
    })
}

/// Pricing rows → multi-currency function body.
pub fn transform_pricing_data_for_api(
    catalog_id: CatalogItemId,
    pricing: &[CatalogPricing],
) -> EdgeMultiCurrencyPayload {
    EdgeMultiCurrencyPayload {
        catalog_id,
        currencies: pricing.iter().map(pricing_row_for_edge).collect(),
    }
}

/// Multi-currency function body → pricing rows.
pub fn pricing_from_api(payload: EdgeMultiCurrencyPayload) -> Result<Vec<CatalogPricing>, FieldErrors> {
    let mut errors = FieldErrors::new();
    let rows = pricing_rows_from_edge(payload.currencies, &mut errors);
    errors.into_result().map(|_| rows)
}

fn parse_type_code(code: u8, errors: &mut FieldErrors) -> Option<CatalogType> {
    let parsed = CatalogType::from_api_code(code);
    if parsed.is_none() {
        errors.push("type", format!("unknown catalog type code {code}"));
    }
    parsed
}

fn parse_field<T: core::str::FromStr<Err = String>>(
    field: &str,
    raw: &str,
    errors: &mut FieldErrors,
) -> Option<T> {
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(msg) => {
            errors.push(field, msg);
            None
        }
    }
}

fn price_attributes_from_edge(edge: &EdgePriceAttributes, errors: &mut FieldErrors) -> Option<PriceAttributes> {
    let pricing_type = PricingType::from_api_code(&edge.pricing_type);
    if pricing_type.is_none() {
        errors.push("pricing_type", format!("unknown pricing type '{}'", edge.pricing_type));
    }
    let currency = parse_field::<Currency>("currency", &edge.currency, errors);
    let billing_mode = parse_field::<BillingMode>("billing_mode", &edge.billing_mode, errors);

    Some(PriceAttributes {
        pricing_type: pricing_type?,
        base_amount: edge.base_amount,
        currency: currency?,
        billing_mode: billing_mode?,
    })
}

fn price_attributes_for_edge(attrs: &PriceAttributes) -> EdgePriceAttributes {
    EdgePriceAttributes {
        pricing_type: attrs.pricing_type.api_code().to_string(),
        base_amount: attrs.base_amount,
        currency: attrs.currency.code().to_string(),
        billing_mode: attrs.billing_mode.as_str().to_string(),
    }
}

fn pricing_rows_from_edge(rows: Vec<EdgePricing>, errors: &mut FieldErrors) -> Vec<CatalogPricing> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let currency = parse_field::<Currency>(&format!("currency_{index}"), &row.currency, errors)?;
            Some(CatalogPricing {
                currency,
                price: row.price,
                is_base_currency: row.is_base_currency,
                tax_included: row.tax_included,
                tax_rate_id: row.tax_rate_id,
                is_active: row.is_active,
            })
        })
        .collect()
}

fn pricing_row_for_edge(row: &CatalogPricing) -> EdgePricing {
    EdgePricing {
        currency: row.currency.code().to_string(),
        price: row.price,
        is_base_currency: row.is_base_currency,
        tax_included: row.tax_included,
        tax_rate_id: row.tax_rate_id,
        is_active: row.is_active,
    }
}
