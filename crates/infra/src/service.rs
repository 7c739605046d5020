//! Catalog application service: validate, persist, and shape results.
//!
//! Every method is tenant-scoped. Business rules come from
//! `pricebook-catalog`; this layer adds lookups that need storage (current
//! revision, tax rate references) and logs each mutation.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use pricebook_catalog::validation::{effective_pricing, validate_catalog_changes, validate_catalog_item};
use pricebook_catalog::{
    CatalogError, CatalogItem, CatalogItemChanges, CatalogItemId, CatalogItemInput, CatalogListQuery,
    CatalogPricing, CatalogStatus, Currency, Page, PricingSet, SortField, SortOrder, TaxRate,
    TaxRateInput, TaxSettings, TaxSettingsUpdate,
};
use pricebook_core::{AggregateRoot, DomainError, EntityId, ExpectedVersion, FieldErrors, TenantId, UserId};

use crate::catalog_store::CatalogRepository;
use crate::tax_store::TaxSettingsRepository;

pub struct CatalogService {
    items: Arc<dyn CatalogRepository>,
    tax: Arc<dyn TaxSettingsRepository>,
    /// Pricing writes hold it shared from the tax reference check until the
    /// write lands; deleting a rate holds it exclusively.
    tax_refs: RwLock<()>,
}

impl CatalogService {
    pub fn new(items: Arc<dyn CatalogRepository>, tax: Arc<dyn TaxSettingsRepository>) -> Self {
        Self {
            items,
            tax,
            tax_refs: RwLock::new(()),
        }
    }

    pub fn create_catalog_item(
        &self,
        tenant_id: TenantId,
        actor: Option<UserId>,
        input: CatalogItemInput,
    ) -> Result<CatalogItem, CatalogError> {
        validate_catalog_item(&input)?;
        let pricing = PricingSet::new(effective_pricing(&input))?;
        let _refs = self.pricing_write()?;
        self.check_tax_references(tenant_id, &pricing)?;

        let item = CatalogItem::create(tenant_id, input, pricing, actor, Utc::now());
        self.items.insert(item.clone())?;

        tracing::info!(
            tenant_id = %tenant_id,
            item_id = %item.id,
            catalog_type = item.catalog_type.as_str(),
            "catalog item created"
        );
        Ok(item)
    }

    /// Any revision by id.
    pub fn get_catalog_item(&self, tenant_id: TenantId, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        self.items.get(tenant_id, id).ok_or(CatalogError::NotFound)
    }

    pub fn list_catalog_items(&self, tenant_id: TenantId, query: &CatalogListQuery) -> Page<CatalogItem> {
        let query = query.clone().normalized();
        let mut items: Vec<CatalogItem> = self
            .items
            .list(tenant_id)
            .into_iter()
            .filter(|i| query.include_history || i.is_current_version)
            .filter(|i| match query.status {
                Some(status) => i.status == status,
                None => query.include_inactive || i.status != CatalogStatus::Inactive,
            })
            .filter(|i| query.catalog_type.is_none_or(|t| i.catalog_type == t))
            .filter(|i| query.search.as_deref().is_none_or(|s| i.matches_search(s)))
            .collect();

        items.sort_by(|a, b| {
            let ord = match query.sort_by {
                SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            let ord = ord.then_with(|| a.id.cmp(&b.id));
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        Page::slice(items, query.page, query.limit)
    }

    /// Append a new revision with `changes` applied.
    pub fn update_catalog_item(
        &self,
        tenant_id: TenantId,
        actor: Option<UserId>,
        id: CatalogItemId,
        changes: CatalogItemChanges,
    ) -> Result<CatalogItem, CatalogError> {
        validate_catalog_changes(&changes)?;
        let current = self.get_catalog_item(tenant_id, id)?;
        ExpectedVersion::from_option(changes.expected_version).check(current.version())?;

        let rows = match (&changes.pricing, &changes.price_attributes) {
            (Some(rows), _) => rows.clone(),
            (None, Some(attrs)) => rebase_pricing(&current.pricing, attrs.currency, attrs.base_amount),
            (None, None) => current.pricing.clone(),
        };
        let pricing = PricingSet::new(rows)?;
        let _refs = self.pricing_write()?;
        self.check_tax_references(tenant_id, &pricing)?;

        let next = current.next_version(changes, pricing, actor, Utc::now())?;
        self.items.supersede(&current, next.clone())?;

        tracing::info!(
            tenant_id = %tenant_id,
            original_id = %next.original_id,
            previous_id = %current.id,
            item_id = %next.id,
            version = next.version_number,
            "catalog item versioned"
        );
        Ok(next)
    }

    /// Soft delete: the current revision becomes `inactive`.
    pub fn delete_catalog_item(&self, tenant_id: TenantId, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        self.transition_status(tenant_id, id, CatalogStatus::Inactive, "catalog item deleted")
    }

    pub fn restore_catalog_item(&self, tenant_id: TenantId, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        self.transition_status(tenant_id, id, CatalogStatus::Active, "catalog item restored")
    }

    /// All revisions of the chain `id` belongs to, oldest first.
    pub fn get_version_history(&self, tenant_id: TenantId, id: CatalogItemId) -> Result<Vec<CatalogItem>, CatalogError> {
        let item = self.get_catalog_item(tenant_id, id)?;
        let chain = self.items.chain(tenant_id, item.original_id);
        if let Err(e) = chain.verify() {
            tracing::error!(tenant_id = %tenant_id, original_id = %item.original_id, error = %e, "corrupt version chain");
            return Err(e.into());
        }
        Ok(chain.revisions().to_vec())
    }

    pub fn get_multi_currency_pricing(
        &self,
        tenant_id: TenantId,
        id: CatalogItemId,
    ) -> Result<Vec<CatalogPricing>, CatalogError> {
        Ok(self.get_catalog_item(tenant_id, id)?.pricing)
    }

    /// Replace the pricing set of the current revision.
    pub fn update_multi_currency_pricing(
        &self,
        tenant_id: TenantId,
        id: CatalogItemId,
        rows: Vec<CatalogPricing>,
    ) -> Result<CatalogItem, CatalogError> {
        let pricing = match PricingSet::new(rows) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(tenant_id = %tenant_id, item_id = %id, code = e.code(), "pricing rejected");
                return Err(e.into());
            }
        };
        let _refs = self.pricing_write()?;
        self.check_tax_references(tenant_id, &pricing)?;

        let read = self.current_revision(tenant_id, id)?;
        let mut item = read.clone();
        item.price_attributes = pricing.reconcile(&item.price_attributes);
        item.pricing = pricing.into_inner();
        item.updated_at = Utc::now();
        self.items.save(&read, item.clone())?;

        tracing::info!(
            tenant_id = %tenant_id,
            item_id = %id,
            currencies = item.pricing.len(),
            "multi-currency pricing updated"
        );
        Ok(item)
    }

    /// Drop one currency. The base currency and the last currency stay.
    pub fn remove_currency_pricing(
        &self,
        tenant_id: TenantId,
        id: CatalogItemId,
        currency: Currency,
    ) -> Result<CatalogItem, CatalogError> {
        let item = self.current_revision(tenant_id, id)?;
        if !item.pricing.iter().any(|p| p.currency == currency) {
            return Err(CatalogError::Validation(FieldErrors::single(
                "currency",
                format!("{currency} is not priced for this item"),
            )));
        }
        if item.pricing.len() == 1 {
            return Err(CatalogError::LastCurrency);
        }

        let remaining = PricingSet::new(item.pricing.clone())?.without(currency)?;
        self.update_multi_currency_pricing(tenant_id, id, remaining.into_inner())
    }

    pub fn get_tax_settings(&self, tenant_id: TenantId) -> TaxSettings {
        self.tax
            .get(tenant_id)
            .unwrap_or_else(|| TaxSettings::empty(tenant_id))
    }

    pub fn update_tax_settings(
        &self,
        tenant_id: TenantId,
        update: TaxSettingsUpdate,
    ) -> Result<TaxSettings, CatalogError> {
        let settings = self.tax.update(tenant_id, &mut |settings| {
            settings.apply(update.clone())?;
            settings.validate()?;
            Ok(())
        })?;

        tracing::info!(tenant_id = %tenant_id, "tax settings updated");
        Ok(settings)
    }

    pub fn add_tax_rate(&self, tenant_id: TenantId, input: TaxRateInput) -> Result<TaxRate, CatalogError> {
        let mut added = None;
        self.tax.update(tenant_id, &mut |settings| {
            added = Some(settings.add_rate(input.clone())?.clone());
            Ok(())
        })?;
        let rate = added.ok_or_else(|| DomainError::invariant("tax rate was not added"))?;

        tracing::info!(tenant_id = %tenant_id, rate_id = %rate.id, rate = rate.rate, "tax rate added");
        Ok(rate)
    }

    /// Remove a tax rate unless a current catalog revision still prices with it.
    pub fn delete_tax_rate(&self, tenant_id: TenantId, rate_id: EntityId) -> Result<TaxRate, CatalogError> {
        let _refs = self.rate_removal()?;
        let in_use = self
            .items
            .list(tenant_id)
            .iter()
            .filter(|i| i.is_current_version)
            .any(|i| i.pricing.iter().any(|p| p.tax_rate_id == Some(rate_id)));
        if in_use {
            return Err(CatalogError::Conflict(
                "tax rate is referenced by catalog pricing".to_string(),
            ));
        }

        let mut removed = None;
        self.tax.update(tenant_id, &mut |settings| {
            removed = Some(settings.remove_rate(rate_id).ok_or(CatalogError::NotFound)?);
            Ok(())
        })?;
        let removed = removed.ok_or(CatalogError::NotFound)?;

        tracing::info!(tenant_id = %tenant_id, rate_id = %rate_id, "tax rate deleted");
        Ok(removed)
    }

    fn current_revision(&self, tenant_id: TenantId, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        let item = self.get_catalog_item(tenant_id, id)?;
        if !item.is_current_version {
            return Err(CatalogError::Conflict(format!(
                "revision {id} has been superseded"
            )));
        }
        Ok(item)
    }

    fn transition_status(
        &self,
        tenant_id: TenantId,
        id: CatalogItemId,
        target: CatalogStatus,
        message: &'static str,
    ) -> Result<CatalogItem, CatalogError> {
        let read = self.current_revision(tenant_id, id)?;
        let mut item = read.clone();
        let allowed = match target {
            CatalogStatus::Inactive => item.status != CatalogStatus::Inactive,
            _ => item.status == CatalogStatus::Inactive,
        };
        if !allowed {
            return Err(CatalogError::Conflict(format!(
                "catalog item is {}",
                item.status.as_str()
            )));
        }

        item.status = target;
        item.updated_at = Utc::now();
        self.items.save(&read, item.clone())?;

        tracing::info!(tenant_id = %tenant_id, item_id = %id, "{message}");
        Ok(item)
    }

    fn pricing_write(&self) -> Result<RwLockReadGuard<'_, ()>, CatalogError> {
        self.tax_refs
            .read()
            .map_err(|_| DomainError::invariant("tax reference lock poisoned").into())
    }

    fn rate_removal(&self) -> Result<RwLockWriteGuard<'_, ()>, CatalogError> {
        self.tax_refs
            .write()
            .map_err(|_| DomainError::invariant("tax reference lock poisoned").into())
    }

    fn check_tax_references(&self, tenant_id: TenantId, pricing: &PricingSet) -> Result<(), CatalogError> {
        if pricing.tax_rate_ids().next().is_none() {
            return Ok(());
        }
        let settings = self.get_tax_settings(tenant_id);
        let mut errors = FieldErrors::new();
        for (index, row) in pricing.as_slice().iter().enumerate() {
            if let Some(rate_id) = row.tax_rate_id
                && settings.active_rate(rate_id).is_none()
            {
                errors.push(format!("tax_rate_id_{index}"), "unknown or inactive tax rate");
            }
        }
        errors.into_result().map_err(CatalogError::Validation)
    }
}

/// Make `currency` the base at `amount`, keeping the other currencies.
///
/// A row already priced in `currency` becomes the base and the old base is
/// demoted; otherwise the base row is re-denominated.
fn rebase_pricing(rows: &[CatalogPricing], currency: Currency, amount: f64) -> Vec<CatalogPricing> {
    let mut rows = rows.to_vec();
    if let Some(target) = rows.iter().position(|r| r.currency == currency) {
        for (index, row) in rows.iter_mut().enumerate() {
            row.is_base_currency = index == target;
        }
        rows[target].price = amount;
        return rows;
    }
    match rows.iter_mut().find(|r| r.is_base_currency) {
        Some(base) => {
            base.currency = currency;
            base.price = amount;
        }
        None => rows.push(CatalogPricing::new(currency, amount, true)),
    }
    rows
}
