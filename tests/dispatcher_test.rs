//! Integration tests for single-page and exhaustive dispatch against in-memory endpoints.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::json;

use natstat_cli::application::{dispatch, Outcome, Renderer};
use natstat_cli::domain::{
    Cursor, FetchFailure, FetchResult, FieldDecl, Page, Request, Row, Schema, TypeSpec,
};
use natstat_cli::infrastructure::traits::Endpoint;

/// Serves a fixed list of pages; page `n` links to `n + 1`.
struct PagedEndpoint {
    pages: Vec<Result<Vec<Row>, String>>,
    calls: AtomicUsize,
    cursors: Mutex<Vec<Option<String>>>,
}

impl PagedEndpoint {
    fn new(pages: Vec<Result<Vec<Row>, String>>) -> Self {
        Self {
            pages,
            calls: AtomicUsize::new(0),
            cursors: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Endpoint for PagedEndpoint {
    fn name(&self) -> &str {
        "teams"
    }

    fn fetch_page(
        &self,
        _request: &Request,
        cursor: Option<&Cursor>,
    ) -> Result<Page, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.cursors
            .lock()
            .unwrap()
            .push(cursor.map(|c| c.0.clone()));
        let index = cursor.map(|c| c.0.parse::<usize>().unwrap()).unwrap_or(0);
        let rows = self.pages[index]
            .clone()
            .map_err(|reason| FetchFailure::new("teams", reason))?;
        if index + 1 < self.pages.len() {
            Ok(Page::with_next(rows, (index + 1).to_string()))
        } else {
            Ok(Page::last(rows))
        }
    }
}

/// Always hands back the same cursor.
struct LoopingEndpoint;

impl Endpoint for LoopingEndpoint {
    fn name(&self) -> &str {
        "games"
    }

    fn fetch_page(
        &self,
        _request: &Request,
        _cursor: Option<&Cursor>,
    ) -> Result<Page, FetchFailure> {
        Ok(Page::with_next(vec![row(0)], "again"))
    }
}

fn row(id: i64) -> Row {
    match json!({"id": id, "name": format!("team {id}")}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn request() -> Request {
    Schema::builder("teams")
        .field(FieldDecl::new("sport", TypeSpec::string()).default("MBB"))
        .build()
        .unwrap()
        .default_request()
        .unwrap()
}

fn three_pages() -> Vec<Result<Vec<Row>, String>> {
    vec![
        Ok(vec![row(1), row(2)]),
        Ok(vec![row(3), row(4)]),
        Ok(vec![row(5), row(6)]),
    ]
}

#[test]
fn given_three_pages_when_dispatching_exhaustively_then_stream_of_six_rows_in_order() {
    let endpoint = PagedEndpoint::new(three_pages());

    let result = dispatch(&endpoint, &request(), true);

    let FetchResult::Stream(pages) = &result else {
        panic!("expected stream, got {result:?}");
    };
    assert_eq!(pages.len(), 3);
    let ids: Vec<i64> = result
        .rows()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(endpoint.calls(), 3);
    assert_eq!(
        *endpoint.cursors.lock().unwrap(),
        vec![None, Some("1".to_string()), Some("2".to_string())]
    );
}

#[test]
fn given_second_page_fails_when_dispatching_exhaustively_then_single_failure() {
    let endpoint = PagedEndpoint::new(vec![
        Ok(vec![row(1), row(2)]),
        Err("HTTP 502".to_string()),
        Ok(vec![row(5), row(6)]),
    ]);

    let result = dispatch(&endpoint, &request(), true);

    match &result {
        FetchResult::Failure(failure) => {
            assert_eq!(failure.reason, "HTTP 502");
            assert_eq!(failure.page, Some(2));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(result.row_count(), 0);
    assert_eq!(endpoint.calls(), 2);

    let mut sink = Vec::new();
    let outcome = Renderer::default().render("team data", &result, &mut sink);
    assert_eq!(outcome, Outcome::FetchFailed);
    assert!(sink.is_empty(), "no rows may be rendered from a failed fetch");
}

#[test]
fn given_more_pages_when_dispatching_single_then_exactly_one_fetch() {
    let endpoint = PagedEndpoint::new(three_pages());

    let result = dispatch(&endpoint, &request(), false);

    assert_eq!(endpoint.calls(), 1);
    assert_eq!(result, FetchResult::Page(vec![row(1), row(2)]));
}

#[test]
fn given_first_page_fails_when_dispatching_single_then_failure_without_page_number() {
    let endpoint = PagedEndpoint::new(vec![Err("invalid key".to_string())]);

    let result = dispatch(&endpoint, &request(), false);

    assert_eq!(
        result,
        FetchResult::Failure(FetchFailure::new("teams", "invalid key"))
    );
}

#[test]
fn given_repeating_cursor_when_dispatching_exhaustively_then_failure() {
    let result = dispatch(&LoopingEndpoint, &request(), true);

    match result {
        FetchResult::Failure(failure) => {
            assert!(failure.reason.contains("repeated"), "{}", failure.reason);
            assert_eq!(failure.endpoint, "games");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn given_single_last_page_when_dispatching_exhaustively_then_stream_of_one_page() {
    let endpoint = PagedEndpoint::new(vec![Ok(vec![row(1)])]);

    let result = dispatch(&endpoint, &request(), true);

    assert_eq!(result, FetchResult::Stream(vec![vec![row(1)]]));
    assert_eq!(endpoint.calls(), 1);
}
