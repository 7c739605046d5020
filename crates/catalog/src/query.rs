//! List query parameters and pagination.
//!
//! The same query travels as URL search params between the client and the
//! server, so encoding and decoding both live here.

use serde::{Deserialize, Serialize};

use crate::constants::{CatalogStatus, CatalogType, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_SEARCH_LEN};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SortField::Name),
            "created_at" => Some(SortField::CreatedAt),
            "updated_at" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogListQuery {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub catalog_type: Option<CatalogType>,
    pub status: Option<CatalogStatus>,
    /// Include soft-deleted (inactive) items when no status filter is set.
    pub include_inactive: bool,
    /// Include superseded revisions, not only current versions.
    pub include_history: bool,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for CatalogListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            catalog_type: None,
            status: None,
            include_inactive: false,
            include_history: false,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl CatalogListQuery {
    /// Clamp page/limit into range and drop search terms that are too short.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| s.chars().count() >= MIN_SEARCH_LEN);
        self
    }

    /// Build from decoded key/value pairs. Unknown keys and unparsable values
    /// are ignored so a hand-edited URL still yields a usable query.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut q = Self::default();
        for (key, value) in pairs {
            match key {
                "page" => {
                    if let Ok(v) = value.parse() {
                        q.page = v;
                    }
                }
                "limit" => {
                    if let Ok(v) = value.parse() {
                        q.limit = v;
                    }
                }
                "search" => q.search = Some(value.to_string()),
                "type" => q.catalog_type = value.parse().ok(),
                "status" => q.status = value.parse().ok(),
                "include_inactive" => q.include_inactive = value == "true",
                "include_history" => q.include_history = value == "true",
                "sort_by" => {
                    if let Some(v) = SortField::parse(value) {
                        q.sort_by = v;
                    }
                }
                "sort_order" => {
                    q.sort_order = if value.eq_ignore_ascii_case("asc") {
                        SortOrder::Asc
                    } else {
                        SortOrder::Desc
                    }
                }
                _ => {}
            }
        }
        q.normalized()
    }

    /// Parse a URL query string (with or without the leading `?`).
    pub fn from_query_string(qs: &str) -> Self {
        let decoded: Vec<(String, String)> = qs
            .trim_start_matches('?')
            .split('&')
            .filter(|kv| !kv.is_empty())
            .map(|kv| {
                let (k, v) = kv.split_once('=').unwrap_or((kv, ""));
                (decode_component(k), decode_component(v))
            })
            .collect();
        Self::from_pairs(decoded.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Encode as URL search params, omitting values equal to the defaults.
    pub fn to_query_string(&self) -> String {
        let defaults = Self::default();
        let mut parts: Vec<String> = Vec::new();

        if self.page != defaults.page {
            parts.push(format!("page={}", self.page));
        }
        if self.limit != defaults.limit {
            parts.push(format!("limit={}", self.limit));
        }
        if let Some(search) = &self.search {
            parts.push(format!("search={}", urlencoding::encode(search)));
        }
        if let Some(t) = self.catalog_type {
            parts.push(format!("type={}", t.as_str()));
        }
        if let Some(s) = self.status {
            parts.push(format!("status={}", s.as_str()));
        }
        if self.include_inactive {
            parts.push("include_inactive=true".to_string());
        }
        if self.include_history {
            parts.push("include_history=true".to_string());
        }
        if self.sort_by != defaults.sort_by {
            parts.push(format!("sort_by={}", self.sort_by.as_str()));
        }
        if self.sort_order != defaults.sort_order {
            parts.push(format!("sort_order={}", self.sort_order.as_str()));
        }
        parts.join("&")
    }

    /// Same query on another page; every other param is kept.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|c| c.into_owned())
        .unwrap_or(spaced)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        let limit = limit.max(1);
        let total_pages = total.div_ceil(u64::from(limit)) as u32;
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Index range of `page` inside the full result list.
    pub fn window(&self) -> core::ops::Range<usize> {
        let start = (self.page.saturating_sub(1) as u64 * self.limit as u64).min(self.total) as usize;
        let end = (start as u64 + self.limit as u64).min(self.total) as usize;
        start..end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// Cut one page out of the full, already sorted result list.
    pub fn slice(all: Vec<T>, page: u32, limit: u32) -> Self {
        let pagination = Pagination::new(all.len() as u64, page.max(1), limit);
        let range = pagination.window();
        let items = all
            .into_iter()
            .skip(range.start)
            .take(range.end - range.start)
            .collect();
        Self { items, pagination }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_round_trips_non_default_params() {
        let q = CatalogListQuery {
            page: 3,
            limit: 50,
            search: Some("ac service & repair".to_string()),
            catalog_type: Some(CatalogType::SparePart),
            status: Some(CatalogStatus::Inactive),
            include_inactive: true,
            include_history: false,
            sort_by: SortField::Name,
            sort_order: SortOrder::Asc,
        };
        let qs = q.to_query_string();
        assert!(qs.contains("search=ac%20service%20%26%20repair"));
        assert_eq!(CatalogListQuery::from_query_string(&format!("?{qs}")), q);
    }

    #[test]
    fn defaults_encode_to_empty_string() {
        assert_eq!(CatalogListQuery::default().to_query_string(), "");
    }

    #[test]
    fn parsing_is_lenient_and_normalizes() {
        let q = CatalogListQuery::from_query_string("page=0&limit=500&search=+a+&type=bogus&foo=bar");
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 100);
        assert_eq!(q.search, None);
        assert_eq!(q.catalog_type, None);
    }

    #[test]
    fn pagination_math() {
        let p = Pagination::new(45, 3, 20);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.window(), 40..45);

        assert_eq!(Pagination::new(0, 1, 20).total_pages, 0);
        assert_eq!(Pagination::new(40, 5, 20).window(), 40..40);
    }

    #[test]
    fn page_slice_takes_requested_window() {
        let page = Page::slice((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.pagination.total, 25);
        assert!(page.pagination.has_next);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: total_pages == ceil(total / limit).
            #[test]
            fn total_pages_is_ceiling(total in 0u64..100_000, limit in 1u32..=100, page in 1u32..50) {
                let p = Pagination::new(total, page, limit);
                let expected = (total as f64 / limit as f64).ceil() as u32;
                prop_assert_eq!(p.total_pages, expected);
            }

            /// Property: a page never holds more than `limit` items.
            #[test]
            fn page_holds_at_most_limit(len in 0usize..500, limit in 1u32..=100, page in 1u32..20) {
                let sliced = Page::slice(vec![0u8; len], page, limit);
                prop_assert!(sliced.items.len() <= limit as usize);
            }
        }
    }
}
