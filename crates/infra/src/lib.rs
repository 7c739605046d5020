//! Infrastructure: tenant-isolated storage and the catalog application service.

pub mod catalog_store;
pub mod read_model;
pub mod service;
pub mod tax_store;

pub use catalog_store::{CatalogRepository, InMemoryCatalogRepository};
pub use service::CatalogService;
pub use tax_store::{InMemoryTaxSettingsRepository, TaxSettingsRepository};
