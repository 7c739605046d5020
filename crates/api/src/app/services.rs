use std::sync::Arc;

use pricebook_infra::{CatalogService, InMemoryCatalogRepository, InMemoryTaxSettingsRepository};

use crate::config::ApiConfig;

/// Shared state handed to every handler.
pub struct AppServices {
    pub catalog: CatalogService,
    pub default_page_size: u32,
}

pub fn build_services(config: &ApiConfig) -> AppServices {
    let catalog = CatalogService::new(
        Arc::new(InMemoryCatalogRepository::new()),
        Arc::new(InMemoryTaxSettingsRepository::new()),
    );
    AppServices {
        catalog,
        default_page_size: config.default_page_size,
    }
}
