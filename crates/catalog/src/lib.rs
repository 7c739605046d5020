//! Catalog domain: items, multi-currency pricing, tax settings.
//!
//! Everything here is deterministic domain logic (no IO, no HTTP, no storage):
//! the enum/code maps shared with the backend wire format, field-level
//! validation, pure transformations between wire and domain shapes, version
//! chain rules and the pricing form state machine.

pub mod constants;
pub mod edge;
pub mod error;
pub mod form;
pub mod item;
pub mod pricing;
pub mod query;
pub mod tax;
pub mod transform;
pub mod validation;

pub use constants::{
    BillingMode, CatalogStatus, CatalogType, Currency, PricingType, CATALOG_VALIDATION_LIMITS,
    ValidationLimits,
};
pub use edge::ApiResponse;
pub use error::{handle_catalog_error, CatalogError};
pub use form::{CurrencyPricingForm, PricingRow};
pub use item::{CatalogItem, CatalogItemChanges, CatalogItemId, CatalogItemInput, DescriptionContent, VersionChain};
pub use pricing::{validate_pricing_set, CatalogPricing, PriceAttributes, PricingRuleError, PricingSet};
pub use query::{CatalogListQuery, Page, Pagination, SortField, SortOrder};
pub use tax::{
    price_breakdown, PriceBreakdown, TaxDisplayMode, TaxRate, TaxRateInput, TaxSettings, TaxSettingsUpdate,
};
