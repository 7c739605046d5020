//! Field-level business rules for catalog items.
//!
//! Validation collects every failing field so a form can show all messages at
//! once. Structural pricing rules (one base, unique currencies) live in
//! [`crate::pricing`].

use pricebook_core::FieldErrors;

use crate::constants::CATALOG_VALIDATION_LIMITS;
use crate::item::{CatalogItemChanges, CatalogItemInput, DescriptionContent};
use crate::pricing::{price_error, CatalogPricing, PriceAttributes};

/// Validate a create payload.
pub fn validate_catalog_item(input: &CatalogItemInput) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    check_name(&input.name, &mut errors);
    check_description(&input.description, &mut errors);
    check_price_attributes(&input.price_attributes, &mut errors);
    check_pricing_rows(&input.pricing, &mut errors);
    errors.into_result()
}

/// Validate an update payload; only the fields present are checked.
pub fn validate_catalog_changes(changes: &CatalogItemChanges) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if changes.is_empty() {
        errors.push("changes", "nothing to update");
    }
    if let Some(name) = &changes.name {
        check_name(name, &mut errors);
    }
    if let Some(desc) = &changes.description {
        check_description(desc, &mut errors);
    }
    if let Some(attrs) = &changes.price_attributes {
        check_price_attributes(attrs, &mut errors);
    }
    if let Some(rows) = &changes.pricing {
        check_pricing_rows(rows, &mut errors);
    }
    errors.into_result()
}

/// Pricing rows an input will be stored with.
pub fn effective_pricing(input: &CatalogItemInput) -> Vec<CatalogPricing> {
    if input.pricing.is_empty() {
        vec![CatalogPricing::base_from(&input.price_attributes)]
    } else {
        input.pricing.clone()
    }
}

fn check_name(name: &str, errors: &mut FieldErrors) {
    let limits = CATALOG_VALIDATION_LIMITS;
    let len = name.trim().chars().count();
    if len < limits.name_min {
        errors.push("name", "name is required");
    } else if len > limits.name_max {
        errors.push(
            "name",
            format!("name must be at most {} characters", limits.name_max),
        );
    }
}

fn check_description(desc: &DescriptionContent, errors: &mut FieldErrors) {
    let limits = CATALOG_VALIDATION_LIMITS;
    if let Some(d) = &desc.description
        && d.chars().count() > limits.description_max
    {
        errors.push(
            "description",
            format!("description must be at most {} characters", limits.description_max),
        );
    }
    if let Some(d) = &desc.short_description
        && d.chars().count() > limits.short_description_max
    {
        errors.push(
            "short_description",
            format!(
                "short description must be at most {} characters",
                limits.short_description_max
            ),
        );
    }
}

fn check_price_attributes(attrs: &PriceAttributes, errors: &mut FieldErrors) {
    if let Some(msg) = price_error(attrs.base_amount) {
        errors.push("base_amount", msg);
    }
}

fn check_pricing_rows(rows: &[CatalogPricing], errors: &mut FieldErrors) {
    for (index, row) in rows.iter().enumerate() {
        if let Some(msg) = price_error(row.price) {
            errors.push(format!("price_{index}"), msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BillingMode, CatalogStatus, CatalogType, Currency, PricingType};

    fn valid_input() -> CatalogItemInput {
        CatalogItemInput {
            catalog_type: CatalogType::Equipment,
            name: "Drill".to_string(),
            description: DescriptionContent::default(),
            status: CatalogStatus::Draft,
            price_attributes: PriceAttributes {
                pricing_type: PricingType::Daily,
                base_amount: 120.0,
                currency: Currency::Usd,
                billing_mode: BillingMode::Manual,
            },
            pricing: vec![],
        }
    }

    #[test]
    fn valid_input_passes() {
        validate_catalog_item(&valid_input()).unwrap();
    }

    #[test]
    fn collects_every_failing_field() {
        let mut input = valid_input();
        input.name = "   ".to_string();
        input.price_attributes.base_amount = -1.0;
        input.description.short_description = Some("x".repeat(501));
        input.pricing = vec![
            CatalogPricing::new(Currency::Usd, 10.0, true),
            CatalogPricing::new(Currency::Eur, -1.0, false),
        ];

        let errors = validate_catalog_item(&input).unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("base_amount"));
        assert!(errors.contains("short_description"));
        assert!(errors.contains("price_1"));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn name_length_limit_counts_characters() {
        let mut input = valid_input();
        input.name = "é".repeat(255);
        assert!(validate_catalog_item(&input).is_ok());
        input.name = "é".repeat(256);
        assert!(validate_catalog_item(&input).unwrap_err().contains("name"));
    }

    #[test]
    fn empty_changes_are_rejected() {
        let errors = validate_catalog_changes(&CatalogItemChanges::default()).unwrap_err();
        assert!(errors.contains("changes"));
    }

    #[test]
    fn effective_pricing_derives_base_from_attributes() {
        let rows = effective_pricing(&valid_input());
        assert_eq!(rows, vec![CatalogPricing::new(Currency::Usd, 120.0, true)]);
    }
}
