//! Multi-currency pricing rules.
//!
//! A catalog item carries one price per currency. Exactly one entry is the
//! base currency; the item's `PriceAttributes` mirror that entry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pricebook_core::{EntityId, FieldErrors};

use crate::constants::{BillingMode, Currency, PricingType, CATALOG_VALIDATION_LIMITS};

/// Headline price of a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAttributes {
    pub pricing_type: PricingType,
    pub base_amount: f64,
    pub currency: Currency,
    pub billing_mode: BillingMode,
}

impl Default for PriceAttributes {
    fn default() -> Self {
        Self {
            pricing_type: PricingType::Fixed,
            base_amount: 0.0,
            currency: Currency::default(),
            billing_mode: BillingMode::default(),
        }
    }
}

/// One currency's price for a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPricing {
    pub currency: Currency,
    pub price: f64,
    pub is_base_currency: bool,
    pub tax_included: bool,
    pub tax_rate_id: Option<EntityId>,
    pub is_active: bool,
}

impl CatalogPricing {
    pub fn new(currency: Currency, price: f64, is_base_currency: bool) -> Self {
        Self {
            currency,
            price,
            is_base_currency,
            tax_included: false,
            tax_rate_id: None,
            is_active: true,
        }
    }

    /// Single-entry base pricing derived from the headline price.
    pub fn base_from(attrs: &PriceAttributes) -> Self {
        Self::new(attrs.currency, attrs.base_amount, true)
    }
}

/// Violation of a multi-currency pricing rule.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PricingRuleError {
    #[error("at least one currency price is required")]
    EmptyPricing,

    #[error("only one currency can be the base currency")]
    MultipleBaseCurrencies,

    #[error("currency {0} appears more than once")]
    DuplicateCurrency(Currency),

    #[error("too many currencies ({count}, max {max})")]
    TooManyCurrencies { count: usize, max: usize },

    #[error("one currency must be marked as the base currency")]
    MissingBaseCurrency,

    #[error("invalid prices: {0}")]
    InvalidPrice(FieldErrors),
}

impl PricingRuleError {
    /// Stable machine-readable code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            PricingRuleError::EmptyPricing => "EMPTY_PRICING",
            PricingRuleError::MultipleBaseCurrencies => "MULTIPLE_BASE_CURRENCIES",
            PricingRuleError::DuplicateCurrency(_) => "DUPLICATE_CURRENCY",
            PricingRuleError::TooManyCurrencies { .. } => "TOO_MANY_CURRENCIES",
            PricingRuleError::MissingBaseCurrency => "MISSING_BASE_CURRENCY",
            PricingRuleError::InvalidPrice(_) => "VALIDATION_ERROR",
        }
    }

    /// Rebuild a rule failure from its wire `code` and the field errors that
    /// came with it. `None` for codes that are not pricing rules.
    pub fn from_code(code: &str, errors: &FieldErrors) -> Option<Self> {
        let words = || {
            errors
                .iter()
                .flat_map(|e| e.message.split(|c: char| !c.is_ascii_alphanumeric()))
                .filter(|w| !w.is_empty())
        };
        let max = CATALOG_VALIDATION_LIMITS.max_currencies;

        match code {
            "EMPTY_PRICING" => Some(PricingRuleError::EmptyPricing),
            "MULTIPLE_BASE_CURRENCIES" => Some(PricingRuleError::MultipleBaseCurrencies),
            "MISSING_BASE_CURRENCY" => Some(PricingRuleError::MissingBaseCurrency),
            "DUPLICATE_CURRENCY" => words()
                .filter(|w| w.len() == 3 && w.chars().all(|c| c.is_ascii_uppercase()))
                .find_map(|w| w.parse::<Currency>().ok())
                .map(PricingRuleError::DuplicateCurrency),
            "TOO_MANY_CURRENCIES" => {
                let count = words()
                    .find_map(|w| w.parse::<usize>().ok())
                    .unwrap_or(max + 1);
                Some(PricingRuleError::TooManyCurrencies { count, max })
            }
            _ => None,
        }
    }

    /// Field-keyed view for forms.
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            PricingRuleError::InvalidPrice(errors) => errors.clone(),
            PricingRuleError::MultipleBaseCurrencies | PricingRuleError::MissingBaseCurrency => {
                FieldErrors::single("base_currency", self.to_string())
            }
            _ => FieldErrors::single("pricing", self.to_string()),
        }
    }
}

/// Check a single price value; `None` when acceptable.
pub fn price_error(price: f64) -> Option<&'static str> {
    let limits = CATALOG_VALIDATION_LIMITS;
    if !price.is_finite() {
        Some("price must be a number")
    } else if price < limits.price_min {
        Some("price must not be negative")
    } else if price > limits.price_max {
        Some("price exceeds the maximum allowed value")
    } else {
        None
    }
}

/// Validate a pricing set, reporting the first rule it breaks.
pub fn validate_pricing_set(entries: &[CatalogPricing]) -> Result<(), PricingRuleError> {
    if entries.is_empty() {
        return Err(PricingRuleError::EmptyPricing);
    }

    let base_count = entries.iter().filter(|e| e.is_base_currency).count();
    if base_count > 1 {
        return Err(PricingRuleError::MultipleBaseCurrencies);
    }

    let mut seen = HashSet::new();
    for e in entries {
        if !seen.insert(e.currency) {
            return Err(PricingRuleError::DuplicateCurrency(e.currency));
        }
    }

    let max = CATALOG_VALIDATION_LIMITS.max_currencies;
    if entries.len() > max {
        return Err(PricingRuleError::TooManyCurrencies {
            count: entries.len(),
            max,
        });
    }

    if base_count == 0 {
        return Err(PricingRuleError::MissingBaseCurrency);
    }

    let mut errors = FieldErrors::new();
    for (index, e) in entries.iter().enumerate() {
        if let Some(msg) = price_error(e.price) {
            errors.push(format!("price_{index}"), msg);
        }
    }
    errors.into_result().map_err(PricingRuleError::InvalidPrice)
}

/// A pricing set that satisfies every rule in [`validate_pricing_set`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PricingSet(Vec<CatalogPricing>);

impl PricingSet {
    pub fn new(entries: Vec<CatalogPricing>) -> Result<Self, PricingRuleError> {
        validate_pricing_set(&entries)?;
        Ok(Self(entries))
    }

    pub fn base(&self) -> &CatalogPricing {
        // Validated sets always contain exactly one base entry.
        self.0
            .iter()
            .find(|e| e.is_base_currency)
            .unwrap_or(&self.0[0])
    }

    pub fn get(&self, currency: Currency) -> Option<&CatalogPricing> {
        self.0.iter().find(|e| e.currency == currency)
    }

    pub fn currencies(&self) -> impl Iterator<Item = Currency> + '_ {
        self.0.iter().map(|e| e.currency)
    }

    pub fn tax_rate_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.0.iter().filter_map(|e| e.tax_rate_id)
    }

    pub fn as_slice(&self) -> &[CatalogPricing] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<CatalogPricing> {
        self.0
    }

    /// Headline price consistent with the base entry, keeping type and billing mode.
    pub fn reconcile(&self, attrs: &PriceAttributes) -> PriceAttributes {
        let base = self.base();
        PriceAttributes {
            base_amount: base.price,
            currency: base.currency,
            ..attrs.clone()
        }
    }

    /// Set without `currency`; fails if that would break a rule.
    pub fn without(&self, currency: Currency) -> Result<PricingSet, PricingRuleError> {
        let remaining: Vec<CatalogPricing> = self
            .0
            .iter()
            .filter(|e| e.currency != currency)
            .cloned()
            .collect();
        PricingSet::new(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(currency: Currency, price: f64, base: bool) -> CatalogPricing {
        CatalogPricing::new(currency, price, base)
    }

    #[test]
    fn rule_failures_survive_the_wire_by_code() {
        for err in [
            PricingRuleError::EmptyPricing,
            PricingRuleError::MultipleBaseCurrencies,
            PricingRuleError::MissingBaseCurrency,
            PricingRuleError::DuplicateCurrency(Currency::Usd),
            PricingRuleError::TooManyCurrencies { count: 11, max: 10 },
        ] {
            assert_eq!(PricingRuleError::from_code(err.code(), &err.field_errors()), Some(err));
        }
        assert_eq!(
            PricingRuleError::from_code("VALIDATION_ERROR", &FieldErrors::single("price_0", "bad")),
            None
        );
    }

    #[test]
    fn accepts_single_base_with_unique_currencies() {
        let set = PricingSet::new(vec![
            entry(Currency::Inr, 1000.0, true),
            entry(Currency::Usd, 12.5, false),
        ])
        .unwrap();
        assert_eq!(set.base().currency, Currency::Inr);
        assert_eq!(set.get(Currency::Usd).map(|e| e.price), Some(12.5));
    }

    #[test]
    fn rejects_multiple_base_currencies() {
        let err = validate_pricing_set(&[
            entry(Currency::Inr, 1.0, true),
            entry(Currency::Usd, 1.0, true),
        ])
        .unwrap_err();
        assert_eq!(err, PricingRuleError::MultipleBaseCurrencies);
        assert_eq!(err.code(), "MULTIPLE_BASE_CURRENCIES");
    }

    #[test]
    fn rejects_duplicate_currency() {
        let err = validate_pricing_set(&[
            entry(Currency::Usd, 1.0, true),
            entry(Currency::Usd, 2.0, false),
        ])
        .unwrap_err();
        assert_eq!(err, PricingRuleError::DuplicateCurrency(Currency::Usd));
        assert_eq!(err.code(), "DUPLICATE_CURRENCY");
    }

    #[test]
    fn rejects_missing_base_and_empty_sets() {
        assert_eq!(
            validate_pricing_set(&[entry(Currency::Usd, 1.0, false)]),
            Err(PricingRuleError::MissingBaseCurrency)
        );
        assert_eq!(validate_pricing_set(&[]), Err(PricingRuleError::EmptyPricing));
    }

    #[test]
    fn negative_price_is_keyed_by_index() {
        let err = validate_pricing_set(&[
            entry(Currency::Inr, 10.0, true),
            entry(Currency::Usd, -1.0, false),
        ])
        .unwrap_err();
        let fields = err.field_errors();
        assert!(fields.contains("price_1"));
        assert!(!fields.contains("price_0"));
    }

    #[test]
    fn reconcile_copies_base_entry_into_attributes() {
        let set = PricingSet::new(vec![
            entry(Currency::Usd, 20.0, false),
            entry(Currency::Eur, 18.0, true),
        ])
        .unwrap();
        let attrs = PriceAttributes {
            pricing_type: PricingType::Hourly,
            base_amount: 1.0,
            currency: Currency::Inr,
            billing_mode: BillingMode::Automatic,
        };

        let reconciled = set.reconcile(&attrs);
        assert_eq!(reconciled.currency, Currency::Eur);
        assert_eq!(reconciled.base_amount, 18.0);
        assert_eq!(reconciled.pricing_type, PricingType::Hourly);
        assert_eq!(reconciled.billing_mode, BillingMode::Automatic);
    }

    #[test]
    fn removing_base_or_last_currency_fails() {
        let set = PricingSet::new(vec![
            entry(Currency::Inr, 10.0, true),
            entry(Currency::Usd, 1.0, false),
        ])
        .unwrap();
        assert!(set.without(Currency::Usd).is_ok());
        assert_eq!(
            set.without(Currency::Inr),
            Err(PricingRuleError::MissingBaseCurrency)
        );

        let single = PricingSet::new(vec![entry(Currency::Inr, 10.0, true)]).unwrap();
        assert_eq!(single.without(Currency::Inr), Err(PricingRuleError::EmptyPricing));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_entry() -> impl Strategy<Value = CatalogPricing> {
            (0usize..Currency::SUPPORTED.len(), 0.0f64..10_000.0, any::<bool>())
                .prop_map(|(i, price, base)| entry(Currency::SUPPORTED[i], price, base))
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: every accepted set has exactly one base and unique currencies.
            #[test]
            fn accepted_sets_hold_base_and_uniqueness(entries in prop::collection::vec(arb_entry(), 0..12)) {
                if validate_pricing_set(&entries).is_ok() {
                    let bases = entries.iter().filter(|e| e.is_base_currency).count();
                    prop_assert_eq!(bases, 1);

                    let unique: HashSet<_> = entries.iter().map(|e| e.currency).collect();
                    prop_assert_eq!(unique.len(), entries.len());
                }
            }

            /// Property: validation is deterministic.
            #[test]
            fn validation_is_deterministic(entries in prop::collection::vec(arb_entry(), 0..12)) {
                prop_assert_eq!(validate_pricing_set(&entries), validate_pricing_set(&entries));
            }
        }
    }
}
