use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use pricebook_catalog::{
    CatalogError, CatalogItem, CatalogItemChanges, CatalogItemId, CatalogItemInput, CatalogListQuery,
    CatalogPricing, CatalogStatus, CatalogType, Currency, DescriptionContent, Page, PriceAttributes,
    PricingRuleError, PricingSet, SortField, SortOrder, TaxRate, TaxRateInput, TaxSettings,
    TaxSettingsUpdate,
};
use pricebook_client::{CatalogApi, CatalogItems, ClientConfig, ListParams};
use pricebook_core::{EntityId, TenantId};

/// In-process stand-in for the HTTP API.
#[derive(Default)]
struct FakeApi {
    items: Mutex<Vec<CatalogItem>>,
    list_calls: Mutex<Vec<CatalogListQuery>>,
    list_delay: Duration,
    fail_writes: AtomicBool,
    pricing_calls: AtomicU32,
}

impl FakeApi {
    fn with_items(names: &[&str], list_delay: Duration) -> Arc<Self> {
        let tenant = TenantId::new();
        let items = names
            .iter()
            .map(|name| {
                let input = CatalogItemInput {
                    catalog_type: CatalogType::Service,
                    name: name.to_string(),
                    description: DescriptionContent::default(),
                    status: CatalogStatus::Active,
                    price_attributes: PriceAttributes::default(),
                    pricing: vec![],
                };
                let pricing = PricingSet::new(vec![CatalogPricing::new(Currency::Inr, 0.0, true)]).unwrap();
                CatalogItem::create(tenant, input, pricing, None, Utc::now())
            })
            .collect();
        Arc::new(Self {
            items: Mutex::new(items),
            list_delay,
            ..Default::default()
        })
    }

    fn list_calls(&self) -> Vec<CatalogListQuery> {
        self.list_calls.lock().unwrap().clone()
    }

    fn id_of(&self, name: &str) -> CatalogItemId {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.name == name)
            .unwrap()
            .id
    }

    fn write<F: FnOnce(&mut CatalogItem)>(&self, id: CatalogItemId, f: F) -> Result<CatalogItem, CatalogError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CatalogError::Network("connection reset".into()));
        }
        let mut items = self.items.lock().unwrap();
        let item = items.iter_mut().find(|i| i.id == id).ok_or(CatalogError::NotFound)?;
        f(item);
        Ok(item.clone())
    }
}

#[async_trait]
impl CatalogApi for FakeApi {
    async fn list_catalog_items(&self, query: &CatalogListQuery) -> Result<Page<CatalogItem>, CatalogError> {
        self.list_calls.lock().unwrap().push(query.clone());
        tokio::time::sleep(self.list_delay).await;
        let mut items: Vec<CatalogItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| query.include_inactive || i.status != CatalogStatus::Inactive)
            .filter(|i| query.search.as_deref().is_none_or(|s| i.matches_search(s)))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Page::slice(items, query.page, query.limit))
    }

    async fn get_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound)
    }

    async fn create_catalog_item(&self, _input: &CatalogItemInput) -> Result<CatalogItem, CatalogError> {
        Err(CatalogError::Unauthorized)
    }

    async fn update_catalog_item(
        &self,
        _id: CatalogItemId,
        _changes: &CatalogItemChanges,
    ) -> Result<CatalogItem, CatalogError> {
        Err(CatalogError::Unauthorized)
    }

    async fn delete_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        self.write(id, |i| i.status = CatalogStatus::Inactive)
    }

    async fn restore_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        self.write(id, |i| i.status = CatalogStatus::Active)
    }

    async fn get_version_history(&self, id: CatalogItemId) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(vec![self.get_catalog_item(id).await?])
    }

    async fn get_multi_currency_pricing(&self, id: CatalogItemId) -> Result<Vec<CatalogPricing>, CatalogError> {
        Ok(self.get_catalog_item(id).await?.pricing)
    }

    async fn update_multi_currency_pricing(
        &self,
        id: CatalogItemId,
        pricing: &[CatalogPricing],
    ) -> Result<CatalogItem, CatalogError> {
        self.pricing_calls.fetch_add(1, Ordering::SeqCst);
        self.write(id, |i| i.pricing = pricing.to_vec())
    }

    async fn remove_currency_pricing(
        &self,
        _id: CatalogItemId,
        _currency: Currency,
    ) -> Result<CatalogItem, CatalogError> {
        Err(CatalogError::LastCurrency)
    }

    async fn get_tax_settings(&self) -> Result<TaxSettings, CatalogError> {
        Ok(TaxSettings::empty(TenantId::new()))
    }

    async fn update_tax_settings(&self, _update: &TaxSettingsUpdate) -> Result<TaxSettings, CatalogError> {
        Err(CatalogError::Unauthorized)
    }

    async fn add_tax_rate(&self, _input: &TaxRateInput) -> Result<TaxRate, CatalogError> {
        Err(CatalogError::Unauthorized)
    }

    async fn delete_tax_rate(&self, _id: EntityId) -> Result<TaxRate, CatalogError> {
        Err(CatalogError::NotFound)
    }
}

fn controller(api: &Arc<FakeApi>) -> CatalogItems<FakeApi> {
    CatalogItems::from_config(Arc::clone(api), &ClientConfig::new("http://unused"))
}

#[tokio::test(start_paused = true)]
async fn rapid_search_input_issues_one_request() {
    let api = FakeApi::with_items(&["AC service", "AC repair", "Boiler check"], Duration::ZERO);
    let items = controller(&api);

    let first = items.set_search("a");
    let second = items.set_search("ac");
    let last = items.set_search("ac r");

    assert!(first.await.unwrap_err().is_cancelled());
    assert!(second.await.unwrap_err().is_cancelled());
    last.await.unwrap();

    let calls = api.list_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].search.as_deref(), Some("ac r"));

    let state = items.state();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].name, "AC repair");
    assert!(!state.loading);
}

#[tokio::test(start_paused = true)]
async fn param_change_aborts_fetch_in_flight() {
    let api = FakeApi::with_items(&["a-one", "b-two", "c-three"], Duration::from_secs(1));
    let items = controller(&api);
    items.set_params(ListParams { limit: 2, ..Default::default() }).unwrap().await.unwrap();

    let slow = items.refresh();
    let page_two = items.set_page(2).unwrap();

    assert!(slow.await.unwrap_err().is_cancelled());
    page_two.await.unwrap();

    let state = items.state();
    assert_eq!(state.params.page, 2);
    assert_eq!(state.items.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(), vec!["c-three"]);
    assert_eq!(items.url_query(), "page=2&limit=2");
}

#[tokio::test(start_paused = true)]
async fn unchanged_params_do_not_refetch() {
    let api = FakeApi::with_items(&["x"], Duration::ZERO);
    let items = controller(&api);
    items.refresh().await.unwrap();

    assert!(items.set_sort(SortField::UpdatedAt, SortOrder::Desc).is_none());
    assert!(items.set_sort(SortField::Name, SortOrder::Asc).is_some());
}

#[tokio::test]
async fn failed_delete_rolls_back_and_reports() {
    let api = FakeApi::with_items(&["Drill", "Pump"], Duration::ZERO);
    let items = controller(&api);
    items.refresh().await.unwrap();

    api.fail_writes.store(true, Ordering::SeqCst);
    let id = api.id_of("Drill");
    let err = items.delete(id).await.unwrap_err();
    assert!(matches!(err, CatalogError::Network(_)));

    let state = items.state();
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.items[0].id, id);
    assert_eq!(
        items.error_message().as_deref(),
        Some("Network error. Please check your connection and try again")
    );
}

#[tokio::test]
async fn successful_delete_and_restore_refetch() {
    let api = FakeApi::with_items(&["Drill", "Pump"], Duration::ZERO);
    let items = controller(&api);
    items.refresh().await.unwrap();
    let id = api.id_of("Drill");

    items.delete(id).await.unwrap();
    assert_eq!(items.state().items.len(), 1);
    assert_eq!(api.list_calls().len(), 2);

    items.set_params(ListParams { include_inactive: true, ..items.params() }).unwrap().await.unwrap();
    items.restore(id).await.unwrap();
    let state = items.state();
    let restored = state.items.iter().find(|i| i.id == id).unwrap();
    assert_eq!(restored.status, CatalogStatus::Active);
}

#[tokio::test]
async fn invalid_pricing_is_rejected_before_any_request() {
    let api = FakeApi::with_items(&["Drill"], Duration::ZERO);
    let items = controller(&api);
    items.refresh().await.unwrap();
    let id = api.id_of("Drill");

    let err = items
        .update_pricing(
            id,
            vec![
                CatalogPricing::new(Currency::Inr, 100.0, true),
                CatalogPricing::new(Currency::Usd, 1.2, true),
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(err, CatalogError::Pricing(PricingRuleError::MultipleBaseCurrencies));
    assert_eq!(api.pricing_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_pricing_update_restores_previous_pricing() {
    let api = FakeApi::with_items(&["Drill"], Duration::ZERO);
    let items = controller(&api);
    items.refresh().await.unwrap();
    let id = api.id_of("Drill");
    let before = items.state().items[0].clone();

    api.fail_writes.store(true, Ordering::SeqCst);
    let result = items
        .update_pricing(
            id,
            vec![
                CatalogPricing::new(Currency::Inr, 100.0, true),
                CatalogPricing::new(Currency::Eur, 1.1, false),
            ],
        )
        .await;
    assert!(result.is_err());
    assert_eq!(api.pricing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(items.state().items[0], before);

    api.fail_writes.store(false, Ordering::SeqCst);
    let updated = items
        .update_pricing(
            id,
            vec![
                CatalogPricing::new(Currency::Inr, 100.0, true),
                CatalogPricing::new(Currency::Eur, 1.1, false),
            ],
        )
        .await
        .unwrap();
    assert_eq!(updated.pricing.len(), 2);
    assert_eq!(items.state().items[0].pricing.len(), 2);
}

#[tokio::test]
async fn params_restore_from_url_query() {
    let api = FakeApi::with_items(&[], Duration::ZERO);
    let config = ClientConfig::new("http://unused");
    let items = CatalogItems::from_url_query(
        Arc::clone(&api),
        "?page=3&search=drill%20bit&type=spare_part&sort_by=name&sort_order=asc",
        &config,
    );

    let params = items.params();
    assert_eq!(params.page, 3);
    assert_eq!(params.search.as_deref(), Some("drill bit"));
    assert_eq!(params.catalog_type, Some(CatalogType::SparePart));
    assert_eq!(params.sort_by, SortField::Name);
    assert_eq!(ListParams::from_query_string(&items.url_query()), params);
}
