use std::time::Duration;

use pricebook_catalog::constants::{DEFAULT_PAGE_SIZE, SEARCH_DEBOUNCE_MS};

use crate::retry::RetryPolicy;

/// Connection and behaviour settings for the catalog client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// API origin without a trailing slash, e.g. `http://localhost:8080`.
    pub base_url: String,
    pub token: Option<String>,
    pub page_size: u32,
    pub search_debounce: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(SEARCH_DEBOUNCE_MS),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let cfg = ClientConfig::new("http://localhost:8080/").with_token("t");
        assert_eq!(cfg.base_url, "http://localhost:8080");
        assert_eq!(cfg.token.as_deref(), Some("t"));
        assert_eq!(cfg.search_debounce, Duration::from_millis(300));
    }
}
