use axum::extract::{rejection::QueryRejection, Query};
use serde::Deserialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw `?page=&pageSize=` query. Kept as strings so that garbage normalizes to
/// the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

/// A normalized, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Page {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p,
            _ => DEFAULT_PAGE,
        };
        let page_size = match page_size {
            Some(s) if s > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            Some(s) if s >= 1 => s,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, page_size }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// A page query that does not deserialize at all (a repeated key, say)
    /// normalizes to the defaults like any other bad value.
    pub fn from_query(query: Result<Query<PageQuery>, QueryRejection>) -> Self {
        match query {
            Ok(Query(q)) => Page::from(&q),
            Err(e) => {
                tracing::debug!(error = %e, "unreadable page query, using defaults");
                Page::default()
            }
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl From<&PageQuery> for Page {
    fn from(q: &PageQuery) -> Self {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Page::new(parse(&q.page), parse(&q.page_size))
    }
}
