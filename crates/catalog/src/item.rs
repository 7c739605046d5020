//! Catalog item model and its append-only version chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricebook_core::{AggregateRoot, DomainError, EntityId, TenantId, UserId};

use crate::constants::{CatalogStatus, CatalogType};
use crate::pricing::{CatalogPricing, PriceAttributes, PricingSet};

/// Identifier of one catalog item revision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogItemId(pub EntityId);

impl CatalogItemId {
    pub fn new() -> Self {
        Self(EntityId::new())
    }
}

impl Default for CatalogItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for CatalogItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for CatalogItemId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionContent {
    pub description: Option<String>,
    pub short_description: Option<String>,
}

impl DescriptionContent {
    /// Overlay the sub-fields set in `self` onto `current`.
    pub fn merged_onto(self, current: &DescriptionContent) -> DescriptionContent {
        DescriptionContent {
            description: self.description.or_else(|| current.description.clone()),
            short_description: self
                .short_description
                .or_else(|| current.short_description.clone()),
        }
    }
}

/// A single revision of a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub tenant_id: TenantId,
    pub catalog_type: CatalogType,
    pub name: String,
    pub description: DescriptionContent,
    pub status: CatalogStatus,
    pub price_attributes: PriceAttributes,
    pub pricing: Vec<CatalogPricing>,
    pub version_number: u64,
    pub is_current_version: bool,
    /// Root of the version chain (equal to `id` for the first revision).
    pub original_id: CatalogItemId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// Everything needed to create a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemInput {
    pub catalog_type: CatalogType,
    pub name: String,
    #[serde(default)]
    pub description: DescriptionContent,
    #[serde(default)]
    pub status: CatalogStatus,
    pub price_attributes: PriceAttributes,
    /// Explicit multi-currency pricing; empty means "derive from `price_attributes`".
    #[serde(default)]
    pub pricing: Vec<CatalogPricing>,
}

/// Partial update; `None` leaves a field as it is on the current revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItemChanges {
    pub catalog_type: Option<CatalogType>,
    pub name: Option<String>,
    pub description: Option<DescriptionContent>,
    pub status: Option<CatalogStatus>,
    pub price_attributes: Option<PriceAttributes>,
    pub pricing: Option<Vec<CatalogPricing>>,
    /// Optimistic concurrency guard against the current `version_number`.
    pub expected_version: Option<u64>,
}

impl CatalogItemChanges {
    pub fn is_empty(&self) -> bool {
        self.catalog_type.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.price_attributes.is_none()
            && self.pricing.is_none()
    }
}

impl CatalogItem {
    /// First revision of a new version chain.
    ///
    /// `pricing` must already be validated; the headline price is reconciled
    /// against its base entry.
    pub fn create(
        tenant_id: TenantId,
        input: CatalogItemInput,
        pricing: PricingSet,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        let id = CatalogItemId::new();
        let price_attributes = pricing.reconcile(&input.price_attributes);
        Self {
            id,
            tenant_id,
            catalog_type: input.catalog_type,
            name: input.name.trim().to_string(),
            description: input.description,
            status: input.status,
            price_attributes,
            pricing: pricing.into_inner(),
            version_number: 1,
            is_current_version: true,
            original_id: id,
            created_at: now,
            updated_at: now,
            created_by,
        }
    }

    /// Build the revision that supersedes `self`.
    ///
    /// `self` is left untouched; the caller persists the returned revision and
    /// marks `self` non-current in the same step. `pricing` is the validated
    /// set for the new revision (the previous set carried over when the
    /// changes do not replace it).
    pub fn next_version(
        &self,
        changes: CatalogItemChanges,
        pricing: PricingSet,
        updated_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !self.is_current_version {
            return Err(DomainError::conflict(format!(
                "revision {} of {} is not the current version",
                self.version_number, self.original_id
            )));
        }

        let attrs = changes
            .price_attributes
            .unwrap_or_else(|| self.price_attributes.clone());

        Ok(Self {
            id: CatalogItemId::new(),
            tenant_id: self.tenant_id,
            catalog_type: changes.catalog_type.unwrap_or(self.catalog_type),
            name: changes
                .name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| self.name.clone()),
            description: match changes.description {
                Some(update) => update.merged_onto(&self.description),
                None => self.description.clone(),
            },
            status: changes.status.unwrap_or(self.status),
            price_attributes: pricing.reconcile(&attrs),
            pricing: pricing.into_inner(),
            version_number: self.version_number + 1,
            is_current_version: true,
            original_id: self.original_id,
            created_at: self.created_at,
            updated_at: now,
            created_by: updated_by.or(self.created_by),
        })
    }

    pub fn is_root(&self) -> bool {
        self.id == self.original_id
    }

    pub fn base_pricing(&self) -> Option<&CatalogPricing> {
        self.pricing.iter().find(|p| p.is_base_currency)
    }

    /// Case-insensitive match on name or description text.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let in_opt = |s: &Option<String>| {
            s.as_deref()
                .map(|v| v.to_lowercase().contains(&needle))
                .unwrap_or(false)
        };
        self.name.to_lowercase().contains(&needle)
            || in_opt(&self.description.description)
            || in_opt(&self.description.short_description)
    }
}

impl AggregateRoot for CatalogItem {
    type Id = CatalogItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version_number
    }
}

/// All revisions sharing one `original_id`, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionChain {
    revisions: Vec<CatalogItem>,
}

impl VersionChain {
    pub fn new(mut revisions: Vec<CatalogItem>) -> Self {
        revisions.sort_by_key(|r| r.version_number);
        Self { revisions }
    }

    pub fn revisions(&self) -> &[CatalogItem] {
        &self.revisions
    }

    pub fn current(&self) -> Option<&CatalogItem> {
        self.revisions.iter().find(|r| r.is_current_version)
    }

    /// Check the chain: one root, one current revision (the latest), and
    /// version numbers 1..=n without gaps.
    pub fn verify(&self) -> Result<(), DomainError> {
        let Some(root) = self.revisions.first() else {
            return Err(DomainError::not_found());
        };

        if !root.is_root() {
            return Err(DomainError::invariant("first revision is not the chain root"));
        }

        for (index, rev) in self.revisions.iter().enumerate() {
            if rev.original_id != root.original_id {
                return Err(DomainError::invariant("revision belongs to another chain"));
            }
            if rev.version_number != index as u64 + 1 {
                return Err(DomainError::invariant(format!(
                    "version numbers are not contiguous at {}",
                    rev.version_number
                )));
            }
        }

        let current: Vec<_> = self.revisions.iter().filter(|r| r.is_current_version).collect();
        match current.as_slice() {
            [only] if only.version_number == self.revisions.len() as u64 => Ok(()),
            [_] => Err(DomainError::invariant("current revision is not the latest")),
            _ => Err(DomainError::invariant(format!(
                "expected exactly one current revision, found {}",
                current.len()
            ))),
        }
    }
}
