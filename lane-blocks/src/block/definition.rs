//! Block definitions as written by application code

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ContentError, LoaderError};
use crate::request::{Request, Response};
use crate::route::MATCH_ALL;

/// Request preprocessing step run before a block's filter
pub type LoaderFn =
    dyn Fn(&mut Request, &mut Response) -> Result<(), LoaderError> + Send + Sync;

/// Request-time inclusion predicate
pub type FilterFn = dyn Fn(&Request, &Response) -> bool + Send + Sync;

/// Lazily computed block content
pub type ContentFn =
    dyn Fn(&Request, &Response) -> Result<Value, ContentError> + Send + Sync;

/// What a block shows
#[derive(Clone)]
pub enum BlockContent {
    /// Fixed value, cloned into every request
    Static(Value),
    /// Computed per request from the request and response
    Computed(Arc<ContentFn>),
}

impl BlockContent {
    /// Content computed by `f` at resolution time
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Request, &Response) -> Result<Value, ContentError> + Send + Sync + 'static,
    {
        BlockContent::Computed(Arc::new(f))
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, BlockContent::Computed(_))
    }
}

impl Default for BlockContent {
    fn default() -> Self {
        BlockContent::Static(Value::Object(Map::new()))
    }
}

impl From<Value> for BlockContent {
    fn from(value: Value) -> Self {
        BlockContent::Static(value)
    }
}

impl From<&str> for BlockContent {
    fn from(value: &str) -> Self {
        BlockContent::Static(Value::String(value.to_string()))
    }
}

impl From<String> for BlockContent {
    fn from(value: String) -> Self {
        BlockContent::Static(Value::String(value))
    }
}

impl fmt::Debug for BlockContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockContent::Static(value) => f.debug_tuple("Static").field(value).finish(),
            BlockContent::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

/// A block as handed to the registry
///
/// Start from [`BlockDefinition::new`] and chain the setters; anything left
/// unset takes the registry default (`route = "*"`, the configured default
/// region, no loaders, no filter, `weight = 0`, empty object content).
#[derive(Clone)]
pub struct BlockDefinition {
    /// Route pattern the request path must match
    pub route: String,
    /// Target region; `None` means the configured default region
    pub region: Option<String>,
    /// Preprocessing steps, run in order
    pub loaders: Vec<Arc<LoaderFn>>,
    /// Inclusion predicate; `None` means always included
    pub filter: Option<Arc<FilterFn>>,
    /// Ordering key, lower first
    pub weight: f64,
    /// Static or computed content
    pub content: BlockContent,
    /// Template to render the resolved content through
    pub template: Option<String>,
    /// Display fields merged under the content when rendering
    pub fields: Map<String, Value>,
}

impl BlockDefinition {
    pub fn new() -> Self {
        Self {
            route: MATCH_ALL.to_string(),
            region: None,
            loaders: Vec::new(),
            filter: None,
            weight: 0.0,
            content: BlockContent::default(),
            template: None,
            fields: Map::new(),
        }
    }

    pub fn route(mut self, pattern: impl Into<String>) -> Self {
        self.route = pattern.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Append a loader
    pub fn loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) -> Result<(), LoaderError> + Send + Sync + 'static,
    {
        self.loaders.push(Arc::new(loader));
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Request, &Response) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn content(mut self, content: impl Into<BlockContent>) -> Self {
        self.content = content.into();
        self
    }

    /// Content computed per request
    pub fn computed<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, &Response) -> Result<Value, ContentError> + Send + Sync + 'static,
    {
        self.content = BlockContent::computed(f);
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl Default for BlockDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BlockDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockDefinition")
            .field("route", &self.route)
            .field("region", &self.region)
            .field("loaders", &self.loaders.len())
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("weight", &self.weight)
            .field("content", &self.content)
            .field("template", &self.template)
            .field("fields", &self.fields)
            .finish()
    }
}
