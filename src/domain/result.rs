//! Fetch results: pages of rows, accumulated streams, and failures

use std::fmt;

use thiserror::Error;

/// One record as delivered by an endpoint, keys in delivery order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Opaque pagination cursor handed back by an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(pub String);

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of rows plus the cursor of the following page, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub rows: Vec<Row>,
    pub next: Option<Cursor>,
}

impl Page {
    /// Last page: no cursor to follow.
    pub fn last(rows: Vec<Row>) -> Self {
        Self { rows, next: None }
    }

    pub fn with_next(rows: Vec<Row>, next: impl Into<String>) -> Self {
        Self {
            rows,
            next: Some(Cursor(next.into())),
        }
    }
}

/// The endpoint (or one of its pages) reported an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{endpoint}{}: {reason}", page_suffix(.page))]
pub struct FetchFailure {
    pub endpoint: String,
    /// 1-based page number during exhaustive fetches.
    pub page: Option<usize>,
    pub reason: String,
}

impl FetchFailure {
    pub fn new(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            page: None,
            reason: reason.into(),
        }
    }

    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

fn page_suffix(page: &Option<usize>) -> String {
    page.map(|p| format!(" page {p}")).unwrap_or_default()
}

/// Outcome of one dispatch, matched exhaustively by every consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// A single page, as returned by a non-exhaustive fetch.
    Page(Vec<Row>),
    /// Every page of an exhaustive fetch, in delivery order.
    Stream(Vec<Vec<Row>>),
    Failure(FetchFailure),
}

impl FetchResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, FetchResult::Failure(_))
    }

    /// Total number of rows; zero for failures.
    pub fn row_count(&self) -> usize {
        match self {
            FetchResult::Page(rows) => rows.len(),
            FetchResult::Stream(pages) => pages.iter().map(Vec::len).sum(),
            FetchResult::Failure(_) => 0,
        }
    }

    /// Rows in delivery order; empty for failures.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        let pages: &[Vec<Row>] = match self {
            FetchResult::Page(rows) => std::slice::from_ref(rows),
            FetchResult::Stream(pages) => pages,
            FetchResult::Failure(_) => &[],
        };
        pages.iter().flatten()
    }
}
