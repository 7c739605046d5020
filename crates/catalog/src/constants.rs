//! Catalog enums, their backend codes, and validation limits.
//!
//! The backend speaks numeric service-type codes and upper-case pricing codes;
//! the domain speaks typed enums. Each enum owns both directions of its map.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of catalog entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogType {
    Service,
    Equipment,
    SparePart,
    Asset,
}

impl CatalogType {
    pub const ALL: [CatalogType; 4] = [
        CatalogType::Service,
        CatalogType::Equipment,
        CatalogType::SparePart,
        CatalogType::Asset,
    ];

    /// Backend `service_type_code`.
    pub fn api_code(self) -> u8 {
        match self {
            CatalogType::Service => 1,
            CatalogType::Equipment => 2,
            CatalogType::SparePart => 3,
            CatalogType::Asset => 4,
        }
    }

    pub fn from_api_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.api_code() == code)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogType::Service => "service",
            CatalogType::Equipment => "equipment",
            CatalogType::SparePart => "spare_part",
            CatalogType::Asset => "asset",
        }
    }
}

impl FromStr for CatalogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown catalog type '{s}'"))
    }
}

/// How the base amount is charged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    Fixed,
    UnitPrice,
    Hourly,
    Daily,
}

impl PricingType {
    pub const ALL: [PricingType; 4] = [
        PricingType::Fixed,
        PricingType::UnitPrice,
        PricingType::Hourly,
        PricingType::Daily,
    ];

    pub fn api_code(self) -> &'static str {
        match self {
            PricingType::Fixed => "FIXED",
            PricingType::UnitPrice => "UNIT",
            PricingType::Hourly => "HOUR",
            PricingType::Daily => "DAY",
        }
    }

    pub fn from_api_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.api_code().eq_ignore_ascii_case(code))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    #[default]
    Manual,
    Automatic,
}

impl BillingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BillingMode::Manual => "manual",
            BillingMode::Automatic => "automatic",
        }
    }
}

impl FromStr for BillingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(BillingMode::Manual),
            "automatic" => Ok(BillingMode::Automatic),
            other => Err(format!("unknown billing mode '{other}'")),
        }
    }
}

/// Catalog item status lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogStatus {
    #[default]
    Active,
    Inactive,
    Draft,
}

impl CatalogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogStatus::Active => "active",
            CatalogStatus::Inactive => "inactive",
            CatalogStatus::Draft => "draft",
        }
    }
}

impl FromStr for CatalogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(CatalogStatus::Active),
            "inactive" => Ok(CatalogStatus::Inactive),
            "draft" => Ok(CatalogStatus::Draft),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Supported ISO 4217 currencies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
    Aud,
    Cad,
    Sgd,
    Aed,
    Jpy,
}

impl Currency {
    pub const SUPPORTED: [Currency; 9] = [
        Currency::Inr,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Aud,
        Currency::Cad,
        Currency::Sgd,
        Currency::Aed,
        Currency::Jpy,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Sgd => "SGD",
            Currency::Aed => "AED",
            Currency::Jpy => "JPY",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::SUPPORTED
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported currency '{s}'"))
    }
}

/// Field limits enforced by both the service and the pricing form.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ValidationLimits {
    pub name_min: usize,
    pub name_max: usize,
    pub description_max: usize,
    pub short_description_max: usize,
    pub price_min: f64,
    pub price_max: f64,
    pub max_currencies: usize,
    pub tax_rate_max: f64,
}

pub const CATALOG_VALIDATION_LIMITS: ValidationLimits = ValidationLimits {
    name_min: 1,
    name_max: 255,
    description_max: 10_000,
    short_description_max: 500,
    price_min: 0.0,
    price_max: 999_999_999.99,
    max_currencies: 10,
    tax_rate_max: 100.0,
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MIN_SEARCH_LEN: usize = 2;
pub const SEARCH_DEBOUNCE_MS: u64 = 300;
