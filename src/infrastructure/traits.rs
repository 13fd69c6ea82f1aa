//! I/O boundary traits for testability
//!
//! These traits abstract the remote statistics API, allowing the dispatch
//! pipeline to be tested with in-memory implementations.

use crate::domain::{Cursor, FetchFailure, Page, Request};

/// One remote endpoint: takes a request, returns one page or a failure.
pub trait Endpoint: Send + Sync {
    /// Endpoint name, as used in URLs and diagnostics.
    fn name(&self) -> &str;

    /// Fetch the page at `cursor` (`None` = first page).
    ///
    /// Implementations must not retry; the caller decides what a failure means.
    fn fetch_page(&self, request: &Request, cursor: Option<&Cursor>)
        -> Result<Page, FetchFailure>;
}

/// Hands out endpoints by name.
pub trait ApiClient: Send + Sync {
    fn endpoint(&self, name: &str) -> Box<dyn Endpoint>;
}
