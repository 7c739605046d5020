//! Per-tenant tax settings storage.

use std::sync::Mutex;

use pricebook_catalog::{CatalogError, TaxSettings};
use pricebook_core::{DomainError, TenantId};

use crate::read_model::{InMemoryTenantStore, TenantStore};

pub trait TaxSettingsRepository: Send + Sync {
    fn get(&self, tenant_id: TenantId) -> Option<TaxSettings>;

    /// Run `change` on the tenant's settings (empty when none are stored) and
    /// store the result, as one step. Nothing is stored when `change` fails.
    fn update(
        &self,
        tenant_id: TenantId,
        change: &mut dyn FnMut(&mut TaxSettings) -> Result<(), CatalogError>,
    ) -> Result<TaxSettings, CatalogError>;
}

/// One settings document per tenant, keyed by the unit key.
#[derive(Debug, Default)]
pub struct InMemoryTaxSettingsRepository<S = InMemoryTenantStore<(), TaxSettings>> {
    store: S,
    write_guard: Mutex<()>,
}

impl InMemoryTaxSettingsRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryTenantStore::new(),
            write_guard: Mutex::new(()),
        }
    }
}

impl<S> TaxSettingsRepository for InMemoryTaxSettingsRepository<S>
where
    S: TenantStore<(), TaxSettings>,
{
    fn get(&self, tenant_id: TenantId) -> Option<TaxSettings> {
        self.store.get(tenant_id, &())
    }

    fn update(
        &self,
        tenant_id: TenantId,
        change: &mut dyn FnMut(&mut TaxSettings) -> Result<(), CatalogError>,
    ) -> Result<TaxSettings, CatalogError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| DomainError::invariant("tax settings write lock poisoned"))?;

        let mut settings = self
            .store
            .get(tenant_id, &())
            .unwrap_or_else(|| TaxSettings::empty(tenant_id));
        change(&mut settings)?;
        self.store.upsert(tenant_id, (), settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use pricebook_catalog::TaxRateInput;

    fn rate(name: String) -> TaxRateInput {
        TaxRateInput {
            name,
            rate: 5.0,
            is_default: false,
        }
    }

    #[test]
    fn failed_change_stores_nothing() {
        let repo = InMemoryTaxSettingsRepository::new();
        let tenant = TenantId::new();

        let err = repo
            .update(tenant, &mut |s| {
                s.add_rate(rate("GST".to_string()))?;
                Err(CatalogError::Conflict("abort".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, CatalogError::Conflict(_)));
        assert!(repo.get(tenant).is_none());
    }

    #[test]
    fn concurrent_rate_additions_are_all_kept() {
        let repo = Arc::new(InMemoryTaxSettingsRepository::new());
        let tenant = TenantId::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || {
                    repo.update(tenant, &mut |s| {
                        s.add_rate(rate(format!("Rate {i}")))?;
                        Ok(())
                    })
                    .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(repo.get(tenant).unwrap().rates.len(), 8);
    }
}
