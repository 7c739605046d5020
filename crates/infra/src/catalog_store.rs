//! Catalog item persistence: every revision of every version chain.

use std::sync::Mutex;

use pricebook_catalog::{CatalogItem, CatalogItemId, VersionChain};
use pricebook_core::{DomainError, TenantId};

use crate::read_model::{InMemoryTenantStore, TenantStore};

/// Storage for catalog item revisions.
pub trait CatalogRepository: Send + Sync {
    fn insert(&self, item: CatalogItem) -> Result<(), DomainError>;

    /// Any revision by id.
    fn get(&self, tenant_id: TenantId, id: CatalogItemId) -> Option<CatalogItem>;

    /// Every revision of the tenant (current and superseded).
    fn list(&self, tenant_id: TenantId) -> Vec<CatalogItem>;

    /// Revisions sharing `original_id`, oldest first.
    fn chain(&self, tenant_id: TenantId, original_id: CatalogItemId) -> VersionChain {
        VersionChain::new(
            self.list(tenant_id)
                .into_iter()
                .filter(|i| i.original_id == original_id)
                .collect(),
        )
    }

    /// Overwrite the current revision `read` in place with `item` (status and
    /// pricing changes). Fails with `Conflict` if the stored record no longer
    /// equals `read`.
    fn save(&self, read: &CatalogItem, item: CatalogItem) -> Result<(), DomainError>;

    /// Mark `previous` non-current and store `next` as the current revision,
    /// as one step. Fails with `Conflict` if `previous` is no longer current
    /// or was changed after it was read.
    fn supersede(&self, previous: &CatalogItem, next: CatalogItem) -> Result<(), DomainError>;
}

/// Catalog repository over a [`TenantStore`].
///
/// Writes are serialized: the compare against the revision a caller read and
/// the write that follows happen under one guard.
#[derive(Debug)]
pub struct InMemoryCatalogRepository<S = InMemoryTenantStore<CatalogItemId, CatalogItem>> {
    store: S,
    write_guard: Mutex<()>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::with_store(InMemoryTenantStore::new())
    }
}

impl Default for InMemoryCatalogRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> InMemoryCatalogRepository<S>
where
    S: TenantStore<CatalogItemId, CatalogItem>,
{
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            write_guard: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, DomainError> {
        self.write_guard
            .lock()
            .map_err(|_| DomainError::invariant("catalog write lock poisoned"))
    }

    /// The stored copy of `read`, provided it is still current and unchanged.
    fn unchanged(&self, read: &CatalogItem) -> Result<CatalogItem, DomainError> {
        let stored = self
            .store
            .get(read.tenant_id, &read.id)
            .ok_or_else(DomainError::not_found)?;
        if !stored.is_current_version {
            return Err(DomainError::conflict(format!(
                "revision {} was superseded concurrently",
                read.id
            )));
        }
        if stored != *read {
            return Err(DomainError::conflict(format!(
                "revision {} was modified concurrently",
                read.id
            )));
        }
        Ok(stored)
    }
}

impl<S> CatalogRepository for InMemoryCatalogRepository<S>
where
    S: TenantStore<CatalogItemId, CatalogItem>,
{
    fn insert(&self, item: CatalogItem) -> Result<(), DomainError> {
        let _guard = self.lock().inspect_err(|_| {
            tracing::error!(item_id = %item.id, "rejecting insert: catalog write lock poisoned");
        })?;
        if self.store.get(item.tenant_id, &item.id).is_some() {
            return Err(DomainError::conflict(format!("revision {} already exists", item.id)));
        }
        self.store.upsert(item.tenant_id, item.id, item);
        Ok(())
    }

    fn get(&self, tenant_id: TenantId, id: CatalogItemId) -> Option<CatalogItem> {
        self.store.get(tenant_id, &id)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<CatalogItem> {
        self.store.list(tenant_id)
    }

    fn save(&self, read: &CatalogItem, item: CatalogItem) -> Result<(), DomainError> {
        let _guard = self.lock()?;
        if item.id != read.id || item.tenant_id != read.tenant_id {
            return Err(DomainError::invariant("saved record does not match the revision read"));
        }
        let stored = self.unchanged(read)?;
        if !item.is_current_version || item.version_number != stored.version_number {
            return Err(DomainError::invariant("in-place save cannot change version fields"));
        }
        self.store.upsert(item.tenant_id, item.id, item);
        Ok(())
    }

    fn supersede(&self, previous: &CatalogItem, next: CatalogItem) -> Result<(), DomainError> {
        let _guard = self.lock()?;
        if previous.tenant_id != next.tenant_id {
            return Err(DomainError::invariant("next revision belongs to another tenant"));
        }
        let tenant_id = next.tenant_id;

        let mut prev = self.unchanged(previous)?;
        if prev.original_id != next.original_id || next.version_number != prev.version_number + 1 {
            return Err(DomainError::invariant("next revision does not extend the chain"));
        }

        prev.is_current_version = false;
        self.store.upsert(tenant_id, prev.id, prev);
        self.store.upsert(tenant_id, next.id, next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pricebook_catalog::{
        CatalogItemChanges, CatalogItemInput, CatalogPricing, CatalogStatus, CatalogType, Currency,
        DescriptionContent, PriceAttributes, PricingSet,
    };

    fn item(tenant_id: TenantId) -> CatalogItem {
        let input = CatalogItemInput {
            catalog_type: CatalogType::Asset,
            name: "Generator".to_string(),
            description: DescriptionContent::default(),
            status: CatalogStatus::Active,
            price_attributes: PriceAttributes::default(),
            pricing: vec![],
        };
        let pricing = PricingSet::new(vec![CatalogPricing::new(Currency::Inr, 0.0, true)]).unwrap();
        CatalogItem::create(tenant_id, input, pricing, None, Utc::now())
    }

    fn next(prev: &CatalogItem) -> CatalogItem {
        let pricing = PricingSet::new(prev.pricing.clone()).unwrap();
        prev.next_version(CatalogItemChanges::default(), pricing, None, Utc::now())
            .unwrap()
    }

    #[test]
    fn supersede_flips_current_flag_and_keeps_chain_valid() {
        let repo = InMemoryCatalogRepository::new();
        let tenant = TenantId::new();
        let v1 = item(tenant);
        repo.insert(v1.clone()).unwrap();

        let v2 = next(&v1);
        repo.supersede(&v1, v2.clone()).unwrap();

        assert!(!repo.get(tenant, v1.id).unwrap().is_current_version);
        let chain = repo.chain(tenant, v1.id);
        chain.verify().unwrap();
        assert_eq!(chain.current().map(|c| c.id), Some(v2.id));
    }

    #[test]
    fn second_supersede_of_same_revision_conflicts() {
        let repo = InMemoryCatalogRepository::new();
        let tenant = TenantId::new();
        let v1 = item(tenant);
        repo.insert(v1.clone()).unwrap();

        repo.supersede(&v1, next(&v1)).unwrap();
        let err = repo.supersede(&v1, next(&v1)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let repo = InMemoryCatalogRepository::new();
        let v1 = item(TenantId::new());
        repo.insert(v1.clone()).unwrap();
        assert!(matches!(repo.insert(v1), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn save_requires_existing_record_in_same_tenant() {
        let repo = InMemoryCatalogRepository::new();
        let v1 = item(TenantId::new());
        assert_eq!(repo.save(&v1, v1.clone()), Err(DomainError::NotFound));

        repo.insert(v1.clone()).unwrap();
        let mut moved = v1.clone();
        moved.tenant_id = TenantId::new();
        assert_eq!(repo.save(&moved, moved.clone()), Err(DomainError::NotFound));
        assert!(repo.get(v1.tenant_id, v1.id).is_some());
    }

    #[test]
    fn save_of_superseded_copy_conflicts_and_keeps_one_current_revision() {
        let repo = InMemoryCatalogRepository::new();
        let tenant = TenantId::new();
        let v1 = item(tenant);
        repo.insert(v1.clone()).unwrap();

        let stale = repo.get(tenant, v1.id).unwrap();
        repo.supersede(&v1, next(&v1)).unwrap();

        let mut deleted = stale.clone();
        deleted.status = CatalogStatus::Inactive;
        let err = repo.save(&stale, deleted).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let chain = repo.chain(tenant, v1.id);
        chain.verify().unwrap();
        assert_eq!(chain.revisions().iter().filter(|r| r.is_current_version).count(), 1);
    }

    #[test]
    fn save_of_copy_modified_since_read_conflicts() {
        let repo = InMemoryCatalogRepository::new();
        let tenant = TenantId::new();
        let v1 = item(tenant);
        repo.insert(v1.clone()).unwrap();

        let mut first = v1.clone();
        first.status = CatalogStatus::Inactive;
        repo.save(&v1, first.clone()).unwrap();

        let mut second = v1.clone();
        second.name = "Generator XL".to_string();
        assert!(matches!(repo.save(&v1, second), Err(DomainError::Conflict(_))));
        assert_eq!(repo.get(tenant, v1.id), Some(first));

        // A supersede built from the pre-save copy is rejected too.
        assert!(matches!(repo.supersede(&v1, next(&v1)), Err(DomainError::Conflict(_))));
    }
}
