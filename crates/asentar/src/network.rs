//! Deterministic request/response stubbing for tests.
//!
//! The [`FixtureServer`] is the network collaborator of the harness: a
//! base table of routes registered once per suite, a per-test override
//! stack consulted first (newest override wins), and a `reset()` that
//! restores the base handler set between tests. Dispatch is synchronous
//! and deterministic; an unmatched request yields a 404 JSON error
//! response rather than touching any real network. Every dispatched
//! request is captured for later request assertions.
//!
//! Application handlers that stub a backend call typically dispatch here
//! synchronously and enqueue the response application on the scheduler's
//! deferred lane, so the response "arrives" at the next settlement.

use crate::result::{AsentarError, AsentarResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

// =============================================================================
// HTTP METHOD
// =============================================================================

/// HTTP methods for request matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
    /// PATCH request
    Patch,
    /// Any method
    Any,
}

impl HttpMethod {
    /// Parse from a method name; unknown names match any method
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            _ => Self::Any,
        }
    }

    /// Get the method name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Any => "*",
        }
    }

    /// Whether this method matches another (`Any` matches everything)
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        *self == Self::Any || *other == Self::Any || *self == *other
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// URL PATTERN
// =============================================================================

/// Pattern for matching request URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regex match
    Regex(String),
    /// Glob pattern (e.g. `**/api/login`)
    Glob(String),
    /// Match any URL
    Any,
}

impl UrlPattern {
    /// Whether a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern),
            Self::Contains(pattern) => url.contains(pattern),
            Self::Regex(pattern) => regex::Regex::new(pattern)
                .map(|regex| regex.is_match(url))
                .unwrap_or(false),
            Self::Glob(pattern) => glob_matches(pattern, url),
            Self::Any => true,
        }
    }
}

/// Simple `*`-wildcard matching for URLs: every literal segment between
/// wildcards must appear in order; a leading or trailing literal is
/// anchored.
fn glob_matches(pattern: &str, url: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let mut position = 0;
    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        match url[position..].find(segment) {
            Some(found) => {
                if index == 0 && found != 0 {
                    return false;
                }
                position += found + segment.len();
            }
            None => return false,
        }
    }
    pattern.ends_with('*') || position == url.len()
}

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

/// A stubbed HTTP request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: Option<Vec<u8>>,
}

impl StubRequest {
    /// Create a request
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Create a POST request
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set a raw body
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a JSON body
    pub fn with_json<T: Serialize>(mut self, data: &T) -> AsentarResult<Self> {
        self.body = Some(serde_json::to_vec(data)?);
        Ok(self)
    }

    /// Get the body as a string
    #[must_use]
    pub fn body_string(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|body| String::from_utf8_lossy(body).to_string())
    }

    /// Parse the body as JSON
    pub fn body_json<T: DeserializeOwned>(&self) -> AsentarResult<T> {
        let body = self
            .body
            .as_ref()
            .ok_or_else(|| AsentarError::invalid_state("request has no body"))?;
        Ok(serde_json::from_slice(body)?)
    }
}

/// A stubbed HTTP response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Vec<u8>,
    /// Content type
    pub content_type: String,
}

impl Default for StubResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HashMap::new(),
            body: Vec::new(),
            content_type: "application/json".to_string(),
        }
    }
}

impl StubResponse {
    /// Create an empty 200 response
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a 200 JSON response
    pub fn json<T: Serialize>(data: &T) -> AsentarResult<Self> {
        Ok(Self {
            body: serde_json::to_vec(data)?,
            ..Self::default()
        })
    }

    /// Create a 200 plain-text response
    #[must_use]
    pub fn text(content: &str) -> Self {
        Self {
            body: content.as_bytes().to_vec(),
            content_type: "text/plain".to_string(),
            ..Self::default()
        }
    }

    /// Create an error response with a JSON `{"message": …}` body
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }).to_string().into_bytes(),
            ..Self::default()
        }
    }

    /// Set the status code
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Whether the status is in the 2xx range
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Get the body as a string
    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the body as JSON
    pub fn body_json<T: DeserializeOwned>(&self) -> AsentarResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

// =============================================================================
// ROUTES
// =============================================================================

/// Response producer for a matched route
pub type Responder = Rc<dyn Fn(&StubRequest) -> AsentarResult<StubResponse>>;

/// A route: method + URL pattern + responder, with an optional match budget
pub struct Route {
    method: HttpMethod,
    pattern: UrlPattern,
    responder: Responder,
    times: Option<usize>,
    match_count: usize,
}

impl Route {
    /// Create a route with a responder function
    pub fn new(
        method: HttpMethod,
        pattern: UrlPattern,
        responder: impl Fn(&StubRequest) -> AsentarResult<StubResponse> + 'static,
    ) -> Self {
        Self {
            method,
            pattern,
            responder: Rc::new(responder),
            times: None,
            match_count: 0,
        }
    }

    /// Create a route that always returns the same response
    #[must_use]
    pub fn fixed(method: HttpMethod, pattern: UrlPattern, response: StubResponse) -> Self {
        Self::new(method, pattern, move |_| Ok(response.clone()))
    }

    /// Limit how many requests this route will serve before it is
    /// exhausted and skipped
    #[must_use]
    pub const fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Whether this route matches a request and still has budget
    #[must_use]
    pub fn matches(&self, request: &StubRequest) -> bool {
        !self.is_exhausted()
            && self.method.matches(&request.method)
            && self.pattern.matches(&request.url)
    }

    /// Whether the match budget is used up
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.times.is_some_and(|max| self.match_count >= max)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("times", &self.times)
            .field("match_count", &self.match_count)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// FIXTURE SERVER
// =============================================================================

/// Deterministic request/response stub with per-test override and reset.
///
/// Single-threaded interior mutability throughout: registration and
/// dispatch both take `&self`, so handlers can hold an `Rc` of the server.
#[derive(Debug, Default)]
pub struct FixtureServer {
    base: RefCell<Vec<Route>>,
    overrides: RefCell<Vec<Route>>,
    captured: RefCell<Vec<StubRequest>>,
}

impl FixtureServer {
    /// Create an empty server
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a base route
    pub fn route(&self, route: Route) {
        self.base.borrow_mut().push(route);
    }

    /// Register a base GET route with a fixed response; the pattern is
    /// matched by containment
    pub fn get(&self, pattern: &str, response: StubResponse) {
        self.route(Route::fixed(
            HttpMethod::Get,
            UrlPattern::Contains(pattern.to_string()),
            response,
        ));
    }

    /// Register a base POST route with a fixed response; the pattern is
    /// matched by containment
    pub fn post(&self, pattern: &str, response: StubResponse) {
        self.route(Route::fixed(
            HttpMethod::Post,
            UrlPattern::Contains(pattern.to_string()),
            response,
        ));
    }

    /// Register a base route with a responder function; the pattern is
    /// matched by containment
    pub fn respond_with(
        &self,
        method: HttpMethod,
        pattern: &str,
        responder: impl Fn(&StubRequest) -> AsentarResult<StubResponse> + 'static,
    ) {
        self.route(Route::new(
            method,
            UrlPattern::Contains(pattern.to_string()),
            responder,
        ));
    }

    /// Push a per-test override, consulted before the base routes.
    /// The newest override wins.
    pub fn use_override(&self, route: Route) {
        self.overrides.borrow_mut().push(route);
    }

    /// Restore the base handler set: drop overrides, reset match budgets,
    /// forget captured requests. Call between tests.
    pub fn reset(&self) {
        self.overrides.borrow_mut().clear();
        self.captured.borrow_mut().clear();
        for route in self.base.borrow_mut().iter_mut() {
            route.match_count = 0;
        }
    }

    /// Dispatch a request: capture it, find the first matching
    /// non-exhausted route (newest override first, then base routes in
    /// registration order), and run its responder. An unmatched request
    /// yields a 404 JSON error; a responder failure yields a 500 carrying
    /// the failure message. Never touches a real network.
    pub fn dispatch(&self, request: StubRequest) -> StubResponse {
        self.captured.borrow_mut().push(request.clone());

        let responder = self.select_responder(&request);
        let response = match responder {
            Some(responder) => responder(&request)
                .unwrap_or_else(|err| StubResponse::error(500, &err.to_string())),
            None => StubResponse::error(
                404,
                &format!("no route matched {} {}", request.method, request.url),
            ),
        };
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            "fixture dispatch"
        );
        response
    }

    /// Pick a responder and record the match, releasing all borrows before
    /// the responder runs so it may re-enter the server.
    fn select_responder(&self, request: &StubRequest) -> Option<Responder> {
        {
            let mut overrides = self.overrides.borrow_mut();
            if let Some(route) = overrides.iter_mut().rev().find(|route| route.matches(request)) {
                route.match_count += 1;
                return Some(Rc::clone(&route.responder));
            }
        }
        let mut base = self.base.borrow_mut();
        if let Some(route) = base.iter_mut().find(|route| route.matches(request)) {
            route.match_count += 1;
            return Some(Rc::clone(&route.responder));
        }
        None
    }

    /// All captured requests, in dispatch order
    #[must_use]
    pub fn captured_requests(&self) -> Vec<StubRequest> {
        self.captured.borrow().clone()
    }

    /// Captured requests whose URL matches a pattern
    #[must_use]
    pub fn requests_matching(&self, pattern: &UrlPattern) -> Vec<StubRequest> {
        self.captured
            .borrow()
            .iter()
            .filter(|request| pattern.matches(&request.url))
            .cloned()
            .collect()
    }

    /// Assert at least one request matching the pattern was dispatched
    pub fn assert_requested(&self, pattern: &UrlPattern) -> AsentarResult<()> {
        if self.requests_matching(pattern).is_empty() {
            return Err(AsentarError::assertion(format!(
                "expected a request matching {pattern:?}, but none was dispatched"
            )));
        }
        Ok(())
    }

    /// Assert exactly `times` requests matching the pattern were dispatched
    pub fn assert_requested_times(&self, pattern: &UrlPattern, times: usize) -> AsentarResult<()> {
        let found = self.requests_matching(pattern).len();
        if found != times {
            return Err(AsentarError::assertion(format!(
                "expected {times} requests matching {pattern:?}, found {found}"
            )));
        }
        Ok(())
    }

    /// Assert no request matching the pattern was dispatched
    pub fn assert_not_requested(&self, pattern: &UrlPattern) -> AsentarResult<()> {
        let found = self.requests_matching(pattern).len();
        if found != 0 {
            return Err(AsentarError::assertion(format!(
                "expected no requests matching {pattern:?}, found {found}"
            )));
        }
        Ok(())
    }

    /// Number of base routes
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.base.borrow().len()
    }

    /// Number of active overrides
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.borrow().len()
    }
}
