//! Catalog list controller.
//!
//! Holds the list params (mirrored to a URL query string), the last fetched
//! page, loading and error flags. Param changes start a new fetch and abort
//! the one in flight; search input is debounced; delete/restore/pricing edits
//! are applied to the cached page immediately and rolled back if the server
//! rejects them.
//!
//! Spawns tokio tasks, so it must be used inside a runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};

use pricebook_catalog::{
    handle_catalog_error, CatalogError, CatalogItem, CatalogItemId, CatalogListQuery, CatalogPricing,
    CatalogStatus, CatalogType, Page, Pagination, PricingSet, SortField, SortOrder,
};

use crate::api::CatalogApi;
use crate::config::ClientConfig;

/// List parameters; encoded to and from URL search params.
pub type ListParams = CatalogListQuery;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogItemsState {
    pub params: ListParams,
    pub items: Vec<CatalogItem>,
    pub pagination: Option<Pagination>,
    pub loading: bool,
    pub error: Option<CatalogError>,
}

/// Previous version of an optimistically edited row and where it sat.
type Snapshot = Option<(usize, CatalogItem)>;

struct Inner<A> {
    api: Arc<A>,
    state: Mutex<CatalogItemsState>,
    generation: AtomicU64,
    fetch: Mutex<Option<AbortHandle>>,
    pending_search: Mutex<Option<AbortHandle>>,
    debounce: Duration,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: CatalogApi> Inner<A> {
    fn start_fetch(self: &Arc<Self>) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let params = {
            let mut state = lock(&self.state);
            state.loading = true;
            state.error = None;
            state.params.clone()
        };

        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let result = inner.api.list_catalog_items(&params).await;
            inner.finish_fetch(generation, result);
        });

        if let Some(previous) = lock(&self.fetch).replace(handle.abort_handle()) {
            previous.abort();
            tracing::debug!(generation, "aborted superseded catalog fetch");
        }
        handle
    }

    fn finish_fetch(&self, generation: u64, result: Result<Page<CatalogItem>, CatalogError>) {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "dropping stale catalog page");
            return;
        }
        let mut state = lock(&self.state);
        state.loading = false;
        match result {
            Ok(page) => {
                state.items = page.items;
                state.pagination = Some(page.pagination);
            }
            Err(e) => {
                tracing::debug!(error = %e, "catalog fetch failed");
                state.error = Some(e);
            }
        }
    }

    /// Replace the params and refetch when they actually changed.
    fn apply_params(self: &Arc<Self>, params: ListParams) -> Option<JoinHandle<()>> {
        let params = params.normalized();
        {
            let mut state = lock(&self.state);
            if state.params == params && state.pagination.is_some() {
                return None;
            }
            state.params = params;
        }
        Some(self.start_fetch())
    }
}

pub struct CatalogItems<A: CatalogApi> {
    inner: Arc<Inner<A>>,
}

impl<A: CatalogApi> CatalogItems<A> {
    pub fn new(api: Arc<A>, params: ListParams, debounce: Duration) -> Self {
        let state = CatalogItemsState {
            params: params.normalized(),
            ..Default::default()
        };
        Self {
            inner: Arc::new(Inner {
                api,
                state: Mutex::new(state),
                generation: AtomicU64::new(0),
                fetch: Mutex::new(None),
                pending_search: Mutex::new(None),
                debounce,
            }),
        }
    }

    pub fn from_config(api: Arc<A>, config: &ClientConfig) -> Self {
        let params = ListParams {
            limit: config.page_size,
            ..Default::default()
        };
        Self::new(api, params, config.search_debounce)
    }

    /// Restore params from a URL query string (e.g. after a page reload).
    pub fn from_url_query(api: Arc<A>, query: &str, config: &ClientConfig) -> Self {
        let mut params = ListParams::from_query_string(query);
        let has_limit = query
            .trim_start_matches('?')
            .split('&')
            .any(|kv| kv.split('=').next() == Some("limit"));
        if !has_limit {
            params.limit = config.page_size;
        }
        Self::new(api, params, config.search_debounce)
    }

    pub fn state(&self) -> CatalogItemsState {
        lock(&self.inner.state).clone()
    }

    pub fn params(&self) -> ListParams {
        lock(&self.inner.state).params.clone()
    }

    /// Current params as URL search params (defaults omitted).
    pub fn url_query(&self) -> String {
        lock(&self.inner.state).params.to_query_string()
    }

    /// Toast text for the last error, if any.
    pub fn error_message(&self) -> Option<String> {
        lock(&self.inner.state).error.as_ref().map(handle_catalog_error)
    }

    /// Fetch the current page, aborting any fetch in flight.
    pub fn refresh(&self) -> JoinHandle<()> {
        self.inner.start_fetch()
    }

    /// Replace all params. Returns `None` when nothing changed.
    pub fn set_params(&self, params: ListParams) -> Option<JoinHandle<()>> {
        self.inner.apply_params(params)
    }

    pub fn set_page(&self, page: u32) -> Option<JoinHandle<()>> {
        let params = self.params().with_page(page);
        self.set_params(params)
    }

    /// Change the type/status filters; resets to the first page.
    pub fn set_filters(
        &self,
        catalog_type: Option<CatalogType>,
        status: Option<CatalogStatus>,
    ) -> Option<JoinHandle<()>> {
        let params = ListParams {
            catalog_type,
            status,
            page: 1,
            ..self.params()
        };
        self.set_params(params)
    }

    pub fn set_sort(&self, sort_by: SortField, sort_order: SortOrder) -> Option<JoinHandle<()>> {
        let params = ListParams {
            sort_by,
            sort_order,
            ..self.params()
        };
        self.set_params(params)
    }

    /// Debounced search. A newer call within the debounce window drops this
    /// one; terms shorter than the minimum search length clear the search.
    pub fn set_search(&self, term: impl Into<String>) -> JoinHandle<()> {
        let term: String = term.into();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            let params = {
                let state = lock(&inner.state);
                let trimmed = term.trim();
                ListParams {
                    search: (!trimmed.is_empty()).then(|| trimmed.to_string()),
                    page: 1,
                    ..state.params.clone()
                }
            };
            if let Some(fetch) = inner.apply_params(params) {
                let _ = fetch.await;
            }
        });

        if let Some(previous) = lock(&self.inner.pending_search).replace(handle.abort_handle()) {
            previous.abort();
        }
        handle
    }

    /// Soft-delete an item. The row leaves the cached page at once (or turns
    /// inactive when inactive rows are listed) and comes back on failure.
    pub async fn delete(&self, id: CatalogItemId) -> Result<(), CatalogError> {
        let snapshot = self.optimistic(id, |state, index| {
            if state.params.include_inactive || state.params.status == Some(CatalogStatus::Inactive) {
                state.items[index].status = CatalogStatus::Inactive;
            } else {
                state.items.remove(index);
            }
        });
        let result = self.inner.api.delete_catalog_item(id).await;
        self.settle("delete", snapshot, result).await.map(|_| ())
    }

    pub async fn restore(&self, id: CatalogItemId) -> Result<(), CatalogError> {
        let snapshot = self.optimistic(id, |state, index| {
            state.items[index].status = CatalogStatus::Active;
        });
        let result = self.inner.api.restore_catalog_item(id).await;
        self.settle("restore", snapshot, result).await.map(|_| ())
    }

    /// Replace an item's multi-currency pricing. Rule violations are reported
    /// before anything is sent or changed.
    pub async fn update_pricing(
        &self,
        id: CatalogItemId,
        pricing: Vec<CatalogPricing>,
    ) -> Result<CatalogItem, CatalogError> {
        let set = PricingSet::new(pricing)?;
        let snapshot = self.optimistic(id, |state, index| {
            let item = &mut state.items[index];
            item.price_attributes = set.reconcile(&item.price_attributes);
            item.pricing = set.as_slice().to_vec();
        });
        let result = self
            .inner
            .api
            .update_multi_currency_pricing(id, set.as_slice())
            .await;
        self.settle("update_pricing", snapshot, result).await
    }

    /// Apply `edit` to the cached row for `id`, returning what to roll back to.
    fn optimistic(
        &self,
        id: CatalogItemId,
        edit: impl FnOnce(&mut CatalogItemsState, usize),
    ) -> Snapshot {
        let mut state = lock(&self.inner.state);
        let index = state.items.iter().position(|i| i.id == id)?;
        let previous = state.items[index].clone();
        edit(&mut state, index);
        Some((index, previous))
    }

    async fn settle(
        &self,
        operation: &'static str,
        snapshot: Snapshot,
        result: Result<CatalogItem, CatalogError>,
    ) -> Result<CatalogItem, CatalogError> {
        match result {
            Ok(item) => {
                {
                    let mut state = lock(&self.inner.state);
                    if let Some(row) = state.items.iter_mut().find(|i| i.id == item.id) {
                        *row = item.clone();
                    }
                }
                // A newer fetch may abort this one; its result wins either way.
                let _ = self.refresh().await;
                Ok(item)
            }
            Err(e) => {
                tracing::debug!(operation, error = %e, "rolling back optimistic update");
                let mut state = lock(&self.inner.state);
                if let Some((index, previous)) = snapshot {
                    match state.items.iter().position(|i| i.id == previous.id) {
                        Some(pos) => state.items[pos] = previous,
                        None => {
                            let at = index.min(state.items.len());
                            state.items.insert(at, previous);
                        }
                    }
                }
                state.error = Some(e.clone());
                Err(e)
            }
        }
    }
}

impl<A: CatalogApi> Drop for CatalogItems<A> {
    fn drop(&mut self) {
        if let Some(h) = lock(&self.inner.fetch).take() {
            h.abort();
        }
        if let Some(h) = lock(&self.inner.pending_search).take() {
            h.abort();
        }
    }
}
