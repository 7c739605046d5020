//! Editable multi-currency pricing state.
//!
//! Enforces the same rules as the service before anything is sent, so the
//! user gets feedback per row: exactly one base currency, no duplicate
//! currency, non-negative prices, and never zero rows.

use std::collections::HashSet;

use pricebook_core::{EntityId, FieldErrors};

use crate::constants::{Currency, CATALOG_VALIDATION_LIMITS};
use crate::error::CatalogError;
use crate::pricing::{price_error, CatalogPricing, PricingRuleError};

#[derive(Debug, Clone, PartialEq)]
pub struct PricingRow {
    pub currency: Currency,
    pub price: f64,
    pub is_base_currency: bool,
    pub tax_included: bool,
    pub tax_rate_id: Option<EntityId>,
}

impl From<&CatalogPricing> for PricingRow {
    fn from(p: &CatalogPricing) -> Self {
        Self {
            currency: p.currency,
            price: p.price,
            is_base_currency: p.is_base_currency,
            tax_included: p.tax_included,
            tax_rate_id: p.tax_rate_id,
        }
    }
}

impl From<&PricingRow> for CatalogPricing {
    fn from(r: &PricingRow) -> Self {
        CatalogPricing {
            currency: r.currency,
            price: r.price,
            is_base_currency: r.is_base_currency,
            tax_included: r.tax_included,
            tax_rate_id: r.tax_rate_id,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyPricingForm {
    rows: Vec<PricingRow>,
    errors: FieldErrors,
}

impl CurrencyPricingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pricing(pricing: &[CatalogPricing]) -> Self {
        Self {
            rows: pricing.iter().map(PricingRow::from).collect(),
            errors: FieldErrors::new(),
        }
    }

    pub fn rows(&self) -> &[PricingRow] {
        &self.rows
    }

    /// Errors from the last [`validate`](Self::validate) call.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Append a currency; the first row added becomes the base currency.
    pub fn add_currency(&mut self, currency: Currency, price: f64) -> Result<usize, CatalogError> {
        if self.rows.iter().any(|r| r.currency == currency) {
            return Err(PricingRuleError::DuplicateCurrency(currency).into());
        }
        let max = CATALOG_VALIDATION_LIMITS.max_currencies;
        if self.rows.len() >= max {
            return Err(PricingRuleError::TooManyCurrencies {
                count: self.rows.len() + 1,
                max,
            }
            .into());
        }

        self.rows.push(PricingRow {
            currency,
            price,
            is_base_currency: self.rows.is_empty(),
            tax_included: false,
            tax_rate_id: None,
        });
        Ok(self.rows.len() - 1)
    }

    /// Remove a row. The last remaining row cannot be removed; the form is
    /// left untouched in that case. Removing the base row promotes the first
    /// remaining row.
    pub fn remove_currency(&mut self, index: usize) -> Result<PricingRow, CatalogError> {
        self.ensure_index(index)?;
        if self.rows.len() == 1 {
            return Err(CatalogError::LastCurrency);
        }

        let removed = self.rows.remove(index);
        if removed.is_base_currency
            && let Some(first) = self.rows.first_mut()
        {
            first.is_base_currency = true;
        }
        self.errors = FieldErrors::new();
        Ok(removed)
    }

    /// Make `index` the only base currency.
    pub fn set_base_currency(&mut self, index: usize) -> Result<(), CatalogError> {
        self.ensure_index(index)?;
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.is_base_currency = i == index;
        }
        Ok(())
    }

    pub fn set_price(&mut self, index: usize, price: f64) -> Result<(), CatalogError> {
        self.ensure_index(index)?;
        self.rows[index].price = price;
        Ok(())
    }

    /// Change the currency of a row. Duplicates are allowed while editing and
    /// reported by [`validate`](Self::validate).
    pub fn set_currency(&mut self, index: usize, currency: Currency) -> Result<(), CatalogError> {
        self.ensure_index(index)?;
        self.rows[index].currency = currency;
        Ok(())
    }

    pub fn set_tax(
        &mut self,
        index: usize,
        tax_included: bool,
        tax_rate_id: Option<EntityId>,
    ) -> Result<(), CatalogError> {
        self.ensure_index(index)?;
        let row = &mut self.rows[index];
        row.tax_included = tax_included;
        row.tax_rate_id = tax_rate_id;
        Ok(())
    }

    /// Check every row and remember the errors for display.
    pub fn validate(&mut self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.rows.is_empty() {
            errors.push("pricing", "at least one currency is required");
        } else if self.rows.len() > CATALOG_VALIDATION_LIMITS.max_currencies {
            errors.push(
                "pricing",
                format!(
                    "at most {} currencies are allowed",
                    CATALOG_VALIDATION_LIMITS.max_currencies
                ),
            );
        }

        let base_count = self.rows.iter().filter(|r| r.is_base_currency).count();
        if !self.rows.is_empty() && base_count != 1 {
            errors.push("base_currency", "exactly one base currency is required");
        }

        let mut seen = HashSet::new();
        for (index, row) in self.rows.iter().enumerate() {
            if !seen.insert(row.currency) {
                errors.push(
                    format!("currency_{index}"),
                    format!("{} is already in the list", row.currency),
                );
            }
            if let Some(msg) = price_error(row.price) {
                errors.push(format!("price_{index}"), msg);
            }
        }

        self.errors = errors.clone();
        errors.into_result()
    }

    /// Validate and, only when valid, hand the rows to `on_save`.
    pub fn submit<R>(
        &mut self,
        on_save: impl FnOnce(Vec<CatalogPricing>) -> R,
    ) -> Result<R, FieldErrors> {
        self.validate()?;
        Ok(on_save(self.to_pricing()))
    }

    pub fn to_pricing(&self) -> Vec<CatalogPricing> {
        self.rows.iter().map(CatalogPricing::from).collect()
    }

    fn ensure_index(&self, index: usize) -> Result<(), CatalogError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(CatalogError::Validation(FieldErrors::single(
                "pricing",
                format!("no currency row at position {index}"),
            )))
        }
    }
}
