//! Per-request objects handed to loaders, filters and content functions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::route::strip_query;

/// Shared flag the host flips when a request goes away
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The incoming request as seen by blocks
#[derive(Debug, Clone)]
pub struct Request {
    url: String,
    /// Session / user data
    pub session: Map<String, Value>,
    /// Request-scoped data, typically filled in by block loaders
    pub data: Map<String, Value>,
    abort: AbortHandle,
}

impl Request {
    /// Create a request for `url` (path plus optional query string)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session: Map::new(),
            data: Map::new(),
            abort: AbortHandle::default(),
        }
    }

    /// Add a session entry
    pub fn with_session(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }

    /// The full request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL path, without query string
    pub fn path(&self) -> &str {
        strip_query(&self.url)
    }

    pub fn session_value(&self, key: &str) -> Option<&Value> {
        self.session.get(key)
    }

    pub fn data_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Handle the host can keep to abort this request later
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }
}

/// The outgoing response as seen by blocks
#[derive(Debug, Clone, Default)]
pub struct Response {
    /// Template variables for the page render
    pub locals: Map<String, Value>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_local(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.locals.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_strips_query() {
        let req = Request::new("/docs/intro?lang=en");
        assert_eq!(req.path(), "/docs/intro");
        assert_eq!(req.url(), "/docs/intro?lang=en");
    }

    #[test]
    fn test_session_values() {
        let req = Request::new("/").with_session("role", "admin");
        assert_eq!(req.session_value("role"), Some(&json!("admin")));
        assert!(req.session_value("missing").is_none());
    }

    #[test]
    fn test_abort_handle_is_shared() {
        let req = Request::new("/");
        let handle = req.abort_handle();
        assert!(!req.is_aborted());

        handle.abort();
        assert!(req.is_aborted());
    }
}
