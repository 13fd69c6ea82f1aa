//! Single-page vs. exhaustive dispatch of a request to an endpoint

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use crate::domain::{Cursor, FetchFailure, FetchResult, Request};
use crate::infrastructure::traits::Endpoint;

/// Send `request` to `endpoint`.
///
/// Non-exhaustive: exactly one fetch, returned as [`FetchResult::Page`] even
/// when the source reports more pages. Exhaustive: follow cursors until the
/// source reports none and return every page as one [`FetchResult::Stream`].
/// A failing page turns the whole fetch into a single
/// [`FetchResult::Failure`]; pages fetched before it are dropped. No retries.
#[instrument(level = "debug", skip(endpoint, request), fields(endpoint = endpoint.name()))]
pub fn dispatch(endpoint: &dyn Endpoint, request: &Request, exhaustive: bool) -> FetchResult {
    if !exhaustive {
        return match endpoint.fetch_page(request, None) {
            Ok(page) => {
                debug!(
                    rows = page.rows.len(),
                    more = page.next.is_some(),
                    "fetched single page"
                );
                FetchResult::Page(page.rows)
            }
            Err(failure) => FetchResult::Failure(failure),
        };
    }
    fetch_all(endpoint, request)
}

fn fetch_all(endpoint: &dyn Endpoint, request: &Request) -> FetchResult {
    let mut pages: Vec<Vec<_>> = Vec::new();
    let mut seen: HashSet<Cursor> = HashSet::new();
    let mut cursor: Option<Cursor> = None;

    loop {
        let number = pages.len() + 1;
        let page = match endpoint.fetch_page(request, cursor.as_ref()) {
            Ok(page) => page,
            Err(failure) => {
                warn!(
                    page = number,
                    discarded_pages = pages.len(),
                    "page fetch failed, discarding partial result"
                );
                return FetchResult::Failure(failure.on_page(number));
            }
        };
        info!(page = number, rows = page.rows.len(), "fetched page");
        pages.push(page.rows);

        match page.next {
            None => break,
            Some(next) => {
                if !seen.insert(next.clone()) {
                    return FetchResult::Failure(
                        FetchFailure::new(
                            endpoint.name(),
                            format!("cursor '{next}' repeated, source is looping"),
                        )
                        .on_page(number),
                    );
                }
                cursor = Some(next);
            }
        }
    }

    debug!(pages = pages.len(), "pagination complete");
    FetchResult::Stream(pages)
}
