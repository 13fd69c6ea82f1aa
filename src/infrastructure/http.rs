//! Blocking HTTP/JSON implementation of the endpoint traits.
//!
//! `GET {base_url}/{endpoint}?<request fields>&key=<api key>&page=<cursor>`.
//! The body is either a JSON array (one final page) or an object with a
//! `data` array and an optional `next` cursor. An object with a non-null
//! `error` member is a failure.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::{Cursor, FetchFailure, Page, Request, Row, Value};
use crate::infrastructure::traits::{ApiClient, Endpoint};
use crate::infrastructure::{InfraError, InfraResult};

/// Query parameter carrying the API key.
pub const API_KEY_PARAM: &str = "key";
/// Query parameter carrying the page cursor.
pub const CURSOR_PARAM: &str = "page";

const MAX_ERROR_BODY: usize = 200;

struct Inner {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Shared HTTP client; cheap to hand out endpoints from.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl HttpClient {
    pub fn new(settings: &Settings) -> InfraResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("natstat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| InfraError::Http {
                context: "build HTTP client".to_string(),
                source,
            })?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                api_key: settings.api_key.clone(),
            }),
        })
    }
}

impl ApiClient for HttpClient {
    fn endpoint(&self, name: &str) -> Box<dyn Endpoint> {
        Box::new(HttpEndpoint {
            name: name.to_string(),
            inner: Arc::clone(&self.inner),
        })
    }
}

pub struct HttpEndpoint {
    name: String,
    inner: Arc<Inner>,
}

impl HttpEndpoint {
    fn failure(&self, reason: impl Into<String>) -> FetchFailure {
        FetchFailure::new(self.name.clone(), reason)
    }
}

impl Endpoint for HttpEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(level = "debug", skip(self, request), fields(endpoint = %self.name))]
    fn fetch_page(
        &self,
        request: &Request,
        cursor: Option<&Cursor>,
    ) -> Result<Page, FetchFailure> {
        let url = format!("{}/{}", self.inner.base_url, self.name);
        let query = query_pairs(request, cursor, self.inner.api_key.as_deref());
        debug!(url = %url, params = query.len(), "GET");

        let response = self
            .inner
            .http
            .get(&url)
            .query(&query)
            .send()
            .map_err(|e| self.failure(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(self.failure(format!("HTTP {status}: {}", snippet.trim())));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| self.failure(format!("invalid JSON response: {e}")))?;
        parse_page(&self.name, body)
    }
}

/// Query parameters for one page request.
///
/// Null fields are omitted, list items become repeated keys, tuples are
/// comma-joined, dates are `YYYY-MM-DD`.
pub fn query_pairs(
    request: &Request,
    cursor: Option<&Cursor>,
    api_key: Option<&str>,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (name, value) in request.iter() {
        match value {
            Value::Null => {}
            Value::List(items) => {
                pairs.extend(items.iter().map(|item| (name.to_string(), item.to_string())));
            }
            other => pairs.push((name.to_string(), other.to_string())),
        }
    }
    if let Some(key) = api_key {
        pairs.push((API_KEY_PARAM.to_string(), key.to_string()));
    }
    if let Some(cursor) = cursor {
        pairs.push((CURSOR_PARAM.to_string(), cursor.to_string()));
    }
    pairs
}

/// Decode a response body into a page.
pub fn parse_page(endpoint: &str, body: serde_json::Value) -> Result<Page, FetchFailure> {
    let failure = |reason: String| FetchFailure::new(endpoint, reason);
    match body {
        serde_json::Value::Array(items) => Ok(Page::last(into_rows(items).map_err(failure)?)),
        serde_json::Value::Object(mut map) => {
            match map.get("error") {
                None | Some(serde_json::Value::Null) => {}
                Some(serde_json::Value::String(message)) => return Err(failure(message.clone())),
                Some(other) => return Err(failure(other.to_string())),
            }
            let rows = match map.remove("data") {
                Some(serde_json::Value::Array(items)) => into_rows(items).map_err(failure)?,
                _ => return Err(failure("response has no 'data' array".to_string())),
            };
            let next = match map.remove("next") {
                None | Some(serde_json::Value::Null) => None,
                Some(serde_json::Value::String(s)) if s.is_empty() => None,
                Some(serde_json::Value::String(s)) => Some(Cursor(s)),
                Some(serde_json::Value::Number(n)) => Some(Cursor(n.to_string())),
                Some(other) => return Err(failure(format!("unsupported cursor {other}"))),
            };
            Ok(Page { rows, next })
        }
        other => Err(failure(format!(
            "unexpected response of type {}",
            json_kind(&other)
        ))),
    }
}

fn into_rows(items: Vec<serde_json::Value>) -> Result<Vec<Row>, String> {
    items
        .into_iter()
        .enumerate()
        .map(|(n, item)| match item {
            serde_json::Value::Object(row) => Ok(row),
            other => Err(format!("row {} is a {}, not an object", n + 1, json_kind(&other))),
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
