//! Catalog client: typed HTTP access to the pricebook API plus a list
//! controller with debounced search, request cancellation and optimistic
//! mutations.

pub mod api;
pub mod config;
pub mod items;
pub mod retry;

pub use api::{CatalogApi, HttpCatalogApi};
pub use config::ClientConfig;
pub use items::{CatalogItems, CatalogItemsState, ListParams};
pub use retry::RetryPolicy;
