//! Tenant tax settings and price/tax arithmetic.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use pricebook_core::{EntityId, FieldErrors, TenantId};

use crate::constants::CATALOG_VALIDATION_LIMITS;

/// Whether list prices are shown with tax included.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxDisplayMode {
    Inclusive,
    #[default]
    Exclusive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: EntityId,
    pub name: String,
    /// Percentage, `0..=100`.
    pub rate: f64,
    pub is_default: bool,
    pub is_active: bool,
}

/// Tax rate as submitted by a client (no id yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRateInput {
    pub name: String,
    pub rate: f64,
    #[serde(default)]
    pub is_default: bool,
}

impl TaxRateInput {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_rate_fields(&self.name, self.rate, "", &mut errors);
        errors.into_result()
    }
}

/// Partial update of a tenant's tax settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<TaxDisplayMode>,
    /// Make this rate the tenant default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_rate_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSettings {
    pub tenant_id: TenantId,
    pub display_mode: TaxDisplayMode,
    pub rates: Vec<TaxRate>,
}

impl TaxSettings {
    pub fn empty(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            display_mode: TaxDisplayMode::default(),
            rates: Vec::new(),
        }
    }

    pub fn rate(&self, id: EntityId) -> Option<&TaxRate> {
        self.rates.iter().find(|r| r.id == id)
    }

    pub fn active_rate(&self, id: EntityId) -> Option<&TaxRate> {
        self.rate(id).filter(|r| r.is_active)
    }

    pub fn default_rate(&self) -> Option<&TaxRate> {
        self.rates.iter().find(|r| r.is_default && r.is_active)
    }

    /// Add a rate; a new default clears the flag on every other rate.
    pub fn add_rate(&mut self, input: TaxRateInput) -> Result<&TaxRate, FieldErrors> {
        input.validate()?;
        if self
            .rates
            .iter()
            .any(|r| r.name.trim().eq_ignore_ascii_case(input.name.trim()))
        {
            return Err(FieldErrors::single("name", "a tax rate with this name already exists"));
        }
        if input.is_default {
            for r in &mut self.rates {
                r.is_default = false;
            }
        }
        self.rates.push(TaxRate {
            id: EntityId::new(),
            name: input.name.trim().to_string(),
            rate: input.rate,
            is_default: input.is_default,
            is_active: true,
        });
        Ok(&self.rates[self.rates.len() - 1])
    }

    /// Apply a partial update; the document is unchanged on error.
    pub fn apply(&mut self, update: TaxSettingsUpdate) -> Result<(), FieldErrors> {
        if let Some(rate_id) = update.default_rate_id
            && self.active_rate(rate_id).is_none()
        {
            return Err(FieldErrors::single("default_rate_id", "unknown or inactive tax rate"));
        }
        if let Some(mode) = update.display_mode {
            self.display_mode = mode;
        }
        if let Some(rate_id) = update.default_rate_id {
            for r in &mut self.rates {
                r.is_default = r.id == rate_id;
            }
        }
        Ok(())
    }

    pub fn remove_rate(&mut self, id: EntityId) -> Option<TaxRate> {
        let pos = self.rates.iter().position(|r| r.id == id)?;
        Some(self.rates.remove(pos))
    }

    /// Whole-document validation (names unique and non-empty, rates in range,
    /// at most one default).
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut names = HashSet::new();
        for (index, r) in self.rates.iter().enumerate() {
            let suffix = format!("_{index}");
            check_rate_fields(&r.name, r.rate, &suffix, &mut errors);
            if !names.insert(r.name.trim().to_lowercase()) {
                errors.push(format!("name{suffix}"), "duplicate tax rate name");
            }
        }
        if self.rates.iter().filter(|r| r.is_default).count() > 1 {
            errors.push("default_rate", "only one default tax rate is allowed");
        }
        errors.into_result()
    }
}

fn check_rate_fields(name: &str, rate: f64, suffix: &str, errors: &mut FieldErrors) {
    if name.trim().is_empty() {
        errors.push(format!("name{suffix}"), "name is required");
    }
    if !rate.is_finite() || rate < 0.0 || rate > CATALOG_VALIDATION_LIMITS.tax_rate_max {
        errors.push(format!("rate{suffix}"), "rate must be between 0 and 100");
    }
}

/// Net / tax / gross split of a price.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub net: f64,
    pub tax: f64,
    pub gross: f64,
}

/// Split `price` at `rate` percent. When `tax_included`, `price` is gross.
/// Amounts are rounded to 2 decimals.
pub fn price_breakdown(price: f64, tax_included: bool, rate: f64) -> PriceBreakdown {
    let factor = rate / 100.0;
    let (net, gross) = if tax_included {
        (price / (1.0 + factor), price)
    } else {
        (price, price * (1.0 + factor))
    };
    let net = round2(net);
    let gross = round2(gross);
    PriceBreakdown {
        net,
        tax: round2(gross - net),
        gross,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gst(rate: f64, is_default: bool) -> TaxRateInput {
        TaxRateInput {
            name: format!("GST {rate}%"),
            rate,
            is_default,
        }
    }

    #[test]
    fn new_default_replaces_previous_default() {
        let mut settings = TaxSettings::empty(TenantId::new());
        let first = settings.add_rate(gst(5.0, true)).unwrap().id;
        let second = settings.add_rate(gst(18.0, true)).unwrap().id;

        assert!(!settings.rate(first).unwrap().is_default);
        assert_eq!(settings.default_rate().map(|r| r.id), Some(second));
        settings.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_and_duplicate_names() {
        let mut settings = TaxSettings::empty(TenantId::new());
        assert!(settings.add_rate(gst(120.0, false)).unwrap_err().contains("rate"));

        settings.add_rate(gst(12.0, false)).unwrap();
        let err = settings.add_rate(gst(12.0, false)).unwrap_err();
        assert!(err.contains("name"));
    }

    #[test]
    fn apply_rejects_unknown_default_without_touching_mode() {
        let mut settings = TaxSettings::empty(TenantId::new());
        let err = settings
            .apply(TaxSettingsUpdate {
                display_mode: Some(TaxDisplayMode::Inclusive),
                default_rate_id: Some(EntityId::new()),
            })
            .unwrap_err();
        assert!(err.contains("default_rate_id"));
        assert_eq!(settings.display_mode, TaxDisplayMode::Exclusive);
    }

    #[test]
    fn validate_flags_two_defaults() {
        let mut settings = TaxSettings::empty(TenantId::new());
        settings.add_rate(gst(5.0, true)).unwrap();
        settings.add_rate(gst(12.0, false)).unwrap();
        settings.rates[1].is_default = true;
        assert!(settings.validate().unwrap_err().contains("default_rate"));
    }

    #[test]
    fn breakdown_handles_inclusive_and_exclusive_prices() {
        let exclusive = price_breakdown(100.0, false, 18.0);
        assert_eq!(exclusive, PriceBreakdown { net: 100.0, tax: 18.0, gross: 118.0 });

        let inclusive = price_breakdown(118.0, true, 18.0);
        assert_eq!(inclusive, PriceBreakdown { net: 100.0, tax: 18.0, gross: 118.0 });
    }
}
