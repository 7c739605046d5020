//! Typed access to the catalog HTTP API.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use pricebook_catalog::edge::{EdgeCatalogItem, EdgeMultiCurrencyPayload};
use pricebook_catalog::transform::{
    pricing_from_api, transform_catalog_changes_for_api,
    transform_catalog_item_for_api, transform_catalog_item_for_ui, transform_pricing_data_for_api,
};
use pricebook_catalog::validation::{effective_pricing, validate_catalog_changes, validate_catalog_item};
use pricebook_catalog::{
    validate_pricing_set, ApiResponse, CatalogError, CatalogItem, CatalogItemChanges, CatalogItemId,
    CatalogItemInput, CatalogListQuery, CatalogPricing, Currency, Page, PricingRuleError, TaxRate,
    TaxRateInput, TaxSettings, TaxSettingsUpdate,
};
use pricebook_core::{EntityId, FieldErrors};

use crate::config::ClientConfig;
use crate::retry::RetryPolicy;

/// Everything the UI layer can ask of the catalog backend.
#[async_trait]
pub trait CatalogApi: Send + Sync + 'static {
    async fn list_catalog_items(&self, query: &CatalogListQuery) -> Result<Page<CatalogItem>, CatalogError>;
    async fn get_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError>;
    async fn create_catalog_item(&self, input: &CatalogItemInput) -> Result<CatalogItem, CatalogError>;
    async fn update_catalog_item(
        &self,
        id: CatalogItemId,
        changes: &CatalogItemChanges,
    ) -> Result<CatalogItem, CatalogError>;
    async fn delete_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError>;
    async fn restore_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError>;
    async fn get_version_history(&self, id: CatalogItemId) -> Result<Vec<CatalogItem>, CatalogError>;
    async fn get_multi_currency_pricing(&self, id: CatalogItemId) -> Result<Vec<CatalogPricing>, CatalogError>;
    async fn update_multi_currency_pricing(
        &self,
        id: CatalogItemId,
        pricing: &[CatalogPricing],
    ) -> Result<CatalogItem, CatalogError>;
    async fn remove_currency_pricing(
        &self,
        id: CatalogItemId,
        currency: Currency,
    ) -> Result<CatalogItem, CatalogError>;
    async fn get_tax_settings(&self) -> Result<TaxSettings, CatalogError>;
    async fn update_tax_settings(&self, update: &TaxSettingsUpdate) -> Result<TaxSettings, CatalogError>;
    async fn add_tax_rate(&self, input: &TaxRateInput) -> Result<TaxRate, CatalogError>;
    async fn delete_tax_rate(&self, id: EntityId) -> Result<TaxRate, CatalogError>;
}

const MULTI_CURRENCY_PATH: &str = "/functions/v1/catalog-items/multi-currency";

/// [`CatalogApi`] over `reqwest`.
///
/// Reads are retried according to the configured [`RetryPolicy`]; writes are
/// sent once.
#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl HttpCatalogApi {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            retry: config.retry,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn read<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        self.retry
            .run(path, || self.send::<T>(self.request(Method::GET, path)))
            .await
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, CatalogError> {
        let res = req
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        decode_envelope(status, &body)
    }
}

/// Decode an API envelope, mapping failures to [`CatalogError`] by status.
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, CatalogError> {
    let envelope = serde_json::from_str::<ApiResponse<T>>(body);

    if status.is_success() {
        return match envelope {
            Ok(ApiResponse { data: Some(data), .. }) => Ok(data),
            Ok(_) => Err(api_error(status, Some("EMPTY_RESPONSE".to_string()), "response carried no data")),
            Err(e) => Err(api_error(status, Some("INVALID_RESPONSE".to_string()), e.to_string())),
        };
    }

    let (code, message, validation_errors) = match envelope {
        Ok(env) => (
            env.code,
            env.error.unwrap_or_else(|| status.to_string()),
            env.validation_errors,
        ),
        Err(_) => (None, body.to_string(), None),
    };

    if status == StatusCode::BAD_REQUEST
        && let Some(rule) = code.as_deref().and_then(|c| {
            PricingRuleError::from_code(c, validation_errors.as_ref().unwrap_or(&FieldErrors::new()))
        })
    {
        return Err(CatalogError::Pricing(rule));
    }

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CatalogError::Unauthorized,
        StatusCode::NOT_FOUND => CatalogError::NotFound,
        StatusCode::CONFLICT => CatalogError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited,
        StatusCode::BAD_REQUEST if code.as_deref() == Some("LAST_CURRENCY") => CatalogError::LastCurrency,
        StatusCode::BAD_REQUEST if validation_errors.is_some() => {
            CatalogError::Validation(validation_errors.unwrap_or_default())
        }
        _ => api_error(status, code, message),
    })
}

fn api_error(status: StatusCode, code: Option<String>, message: impl Into<String>) -> CatalogError {
    CatalogError::Api {
        status: status.as_u16(),
        code,
        message: message.into(),
    }
}

fn to_ui(edge: EdgeCatalogItem) -> Result<CatalogItem, CatalogError> {
    transform_catalog_item_for_ui(edge).map_err(|errors| {
        api_error(
            StatusCode::OK,
            Some("INVALID_RECORD".to_string()),
            format!("unreadable catalog record: {errors}"),
        )
    })
}

fn validate_rows(rows: &[CatalogPricing]) -> Result<(), CatalogError> {
    validate_pricing_set(rows).map_err(CatalogError::from)
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_catalog_items(&self, query: &CatalogListQuery) -> Result<Page<CatalogItem>, CatalogError> {
        let qs = query.to_query_string();
        let path = if qs.is_empty() {
            "/api/catalog".to_string()
        } else {
            format!("/api/catalog?{qs}")
        };
        let page: Page<EdgeCatalogItem> = self.read(&path).await?;
        let pagination = page.pagination;
        let items = page
            .items
            .into_iter()
            .map(to_ui)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, pagination })
    }

    async fn get_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        to_ui(self.read(&format!("/api/catalog/{id}")).await?)
    }

    async fn create_catalog_item(&self, input: &CatalogItemInput) -> Result<CatalogItem, CatalogError> {
        validate_catalog_item(input)?;
        validate_rows(&effective_pricing(input))?;

        let req = self
            .request(Method::POST, "/api/catalog")
            .json(&transform_catalog_item_for_api(input));
        to_ui(self.send(req).await?)
    }

    async fn update_catalog_item(
        &self,
        id: CatalogItemId,
        changes: &CatalogItemChanges,
    ) -> Result<CatalogItem, CatalogError> {
        validate_catalog_changes(changes)?;
        if let Some(rows) = &changes.pricing {
            validate_rows(rows)?;
        }

        let req = self
            .request(Method::PUT, &format!("/api/catalog/{id}"))
            .json(&transform_catalog_changes_for_api(changes));
        to_ui(self.send(req).await?)
    }

    async fn delete_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        let req = self.request(Method::DELETE, &format!("/api/catalog/{id}"));
        to_ui(self.send(req).await?)
    }

    async fn restore_catalog_item(&self, id: CatalogItemId) -> Result<CatalogItem, CatalogError> {
        let req = self.request(Method::POST, &format!("/api/catalog/{id}/restore"));
        to_ui(self.send(req).await?)
    }

    async fn get_version_history(&self, id: CatalogItemId) -> Result<Vec<CatalogItem>, CatalogError> {
        let versions: Vec<EdgeCatalogItem> = self.read(&format!("/api/catalog/{id}/versions")).await?;
        versions.into_iter().map(to_ui).collect()
    }

    async fn get_multi_currency_pricing(&self, id: CatalogItemId) -> Result<Vec<CatalogPricing>, CatalogError> {
        let payload: EdgeMultiCurrencyPayload = self.read(&format!("{MULTI_CURRENCY_PATH}/{id}")).await?;
        Ok(pricing_from_api(payload)?)
    }

    async fn update_multi_currency_pricing(
        &self,
        id: CatalogItemId,
        pricing: &[CatalogPricing],
    ) -> Result<CatalogItem, CatalogError> {
        validate_rows(pricing)?;

        let req = self
            .request(Method::POST, MULTI_CURRENCY_PATH)
            .json(&transform_pricing_data_for_api(id, pricing));
        to_ui(self.send(req).await?)
    }

    async fn remove_currency_pricing(
        &self,
        id: CatalogItemId,
        currency: Currency,
    ) -> Result<CatalogItem, CatalogError> {
        let req = self.request(Method::DELETE, &format!("{MULTI_CURRENCY_PATH}/{id}/{currency}"));
        to_ui(self.send(req).await?)
    }

    async fn get_tax_settings(&self) -> Result<TaxSettings, CatalogError> {
        self.read("/api/tax-settings").await
    }

    async fn update_tax_settings(&self, update: &TaxSettingsUpdate) -> Result<TaxSettings, CatalogError> {
        let req = self.request(Method::PUT, "/api/tax-settings").json(update);
        self.send(req).await
    }

    async fn add_tax_rate(&self, input: &TaxRateInput) -> Result<TaxRate, CatalogError> {
        input.validate()?;
        let req = self.request(Method::POST, "/api/tax-settings/rates").json(input);
        self.send(req).await
    }

    async fn delete_tax_rate(&self, id: EntityId) -> Result<TaxRate, CatalogError> {
        let req = self.request(Method::DELETE, &format!("/api/tax-settings/rates/{id}"));
        self.send(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricebook_catalog::handle_catalog_error;

    #[test]
    fn error_statuses_map_to_catalog_errors() {
        let not_found = r#"{"success":false,"error":"catalog item not found","code":"NOT_FOUND"}"#;
        assert_eq!(
            decode_envelope::<()>(StatusCode::NOT_FOUND, not_found),
            Err(CatalogError::NotFound)
        );
        assert_eq!(
            decode_envelope::<()>(StatusCode::FORBIDDEN, "{}"),
            Err(CatalogError::Unauthorized)
        );
        assert_eq!(
            decode_envelope::<()>(StatusCode::TOO_MANY_REQUESTS, ""),
            Err(CatalogError::RateLimited)
        );

        let invalid = r#"{"success":false,"error":"validation failed","code":"VALIDATION_ERROR",
            "validation_errors":[{"field":"name","message":"name is required"}]}"#;
        match decode_envelope::<()>(StatusCode::BAD_REQUEST, invalid) {
            Err(CatalogError::Validation(errors)) => assert!(errors.contains("name")),
            other => panic!("unexpected {other:?}"),
        }

        let missing_base = r#"{"success":false,"error":"one currency must be marked as the base currency",
            "code":"MISSING_BASE_CURRENCY",
            "validation_errors":[{"field":"base_currency","message":"one currency must be marked as the base currency"}]}"#;
        let err = decode_envelope::<()>(StatusCode::BAD_REQUEST, missing_base).unwrap_err();
        assert_eq!(err, CatalogError::Pricing(PricingRuleError::MissingBaseCurrency));
        assert_eq!(err.code(), "MISSING_BASE_CURRENCY");
        assert_eq!(handle_catalog_error(&err), "Select a base currency");

        let duplicate = r#"{"success":false,"error":"currency USD appears more than once",
            "code":"DUPLICATE_CURRENCY",
            "validation_errors":[{"field":"pricing","message":"currency USD appears more than once"}]}"#;
        assert_eq!(
            decode_envelope::<()>(StatusCode::BAD_REQUEST, duplicate),
            Err(CatalogError::Pricing(PricingRuleError::DuplicateCurrency(Currency::Usd)))
        );

        match decode_envelope::<()>(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") {
            Err(e @ CatalogError::Api { status: 500, .. }) => assert!(e.is_transient()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn success_envelope_yields_data() {
        let body = r#"{"success":true,"data":{"x":1}}"#;
        let v: serde_json::Value = decode_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(v["x"], 1);

        assert!(matches!(
            decode_envelope::<serde_json::Value>(StatusCode::OK, r#"{"success":true}"#),
            Err(CatalogError::Api { .. })
        ));
    }
}
