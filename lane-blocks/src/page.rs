//! Page composition - the surface the template layer talks to
//!
//! A [`Composer`] is built once at startup from the frozen registry and the
//! host renderer, then shared by every request. [`Composer::begin`] opens a
//! [`Page`] for one request: it runs the matcher (loaders, dedup, filters,
//! subscriptions) and owns all per-request state until [`Page::finish`].
//!
//! Templates ask a page for its regions through [`Page::blocks_for`] (or the
//! `blocks_<region>` helpers), which collects, orders and resolves in one go.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use crate::block::RegisteredBlock;
use crate::collector::CollectionState;
use crate::config::BlocksConfig;
use crate::error::{BlockError, Result};
use crate::matcher::{AttachReport, BlockMatcher};
use crate::orderer::BlockOrderer;
use crate::registry::BlockRegistry;
use crate::render::{RenderOptions, TemplateRenderer};
use crate::request::{Request, Response};
use crate::resolver::{ContentResolver, ResolvedBlock};

/// Prefix of the per-region template helpers
pub const REGION_HELPER_PREFIX: &str = "blocks_";

/// Shared, read-only composition engine
#[derive(Clone)]
pub struct Composer {
    registry: Arc<BlockRegistry>,
    renderer: Arc<dyn TemplateRenderer>,
    matcher: BlockMatcher,
    orderer: BlockOrderer,
    resolver: ContentResolver,
}

impl Composer {
    /// Create a composer over a frozen registry
    pub fn new(registry: Arc<BlockRegistry>, renderer: Arc<dyn TemplateRenderer>) -> Self {
        Self {
            registry,
            renderer,
            matcher: BlockMatcher::new(),
            orderer: BlockOrderer::new(),
            resolver: ContentResolver::new(),
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BlocksConfig {
        self.registry.config()
    }

    pub fn renderer(&self) -> &dyn TemplateRenderer {
        self.renderer.as_ref()
    }

    /// Open a page for one request without running the matcher
    ///
    /// Call [`Page::dispatch`] next. If it fails, [`Page::finish`] still
    /// hands back the request and response, for example to render an error
    /// page from the session.
    pub fn open(&self, request: Request, response: Response) -> Page<'_> {
        Page {
            composer: self,
            request,
            response,
            state: CollectionState::new(),
            depth: 0,
        }
    }

    /// Start composing a page for one request
    ///
    /// Shorthand for [`Composer::open`] followed by [`Page::dispatch`]. A
    /// failing loader drops the request and response with the page.
    pub fn begin(&self, request: Request, response: Response) -> Result<Page<'_>> {
        let mut page = self.open(request, response);
        page.dispatch()?;
        Ok(page)
    }
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("registry", &self.registry)
            .field("renderer", &"<renderer>")
            .finish()
    }
}

/// Per-request composition state
#[derive(Debug)]
pub struct Page<'c> {
    composer: &'c Composer,
    request: Request,
    response: Response,
    state: CollectionState,
    depth: usize,
}

impl<'c> Page<'c> {
    /// Run the matcher over the registry again
    ///
    /// Safe to call any number of times; blocks already considered this
    /// request are skipped.
    pub fn dispatch(&mut self) -> Result<AttachReport> {
        let composer = self.composer;
        composer.matcher.attach(
            &composer.registry,
            &mut self.request,
            &mut self.response,
            &mut self.state,
        )
    }

    pub fn composer(&self) -> &'c Composer {
        self.composer
    }

    pub fn config(&self) -> &'c BlocksConfig {
        let composer: &'c Composer = self.composer;
        composer.config()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    /// Current nesting of region collections
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Drain a region's channel without ordering or resolving
    pub fn collect(&mut self, region: &str) -> Vec<RegisteredBlock> {
        self.state.collect(region)
    }

    /// Collected, ordered and resolved items for a region
    ///
    /// The region's channel is drained, so asking again in the same request
    /// returns an empty list. Items whose content or template fails are left
    /// out. Fails with [`BlockError::Aborted`] if the request was aborted,
    /// and with [`BlockError::RecursionLimit`] when called from templates
    /// nested deeper than the configured limit.
    pub fn blocks_for(&mut self, region: &str) -> Result<Vec<ResolvedBlock>> {
        if self.request.is_aborted() {
            return Err(BlockError::Aborted);
        }
        let limit = self.config().max_render_depth;
        if self.depth >= limit {
            return Err(BlockError::RecursionLimit {
                region: region.to_string(),
                depth: self.depth,
            });
        }

        self.depth += 1;
        let result = self.compose_region(region);
        self.depth -= 1;

        let items = result?;
        if self.request.is_aborted() {
            return Err(BlockError::Aborted);
        }
        Ok(items)
    }

    fn compose_region(&mut self, region: &str) -> Result<Vec<ResolvedBlock>> {
        let composer = self.composer;
        let collected = self.state.collect(region);
        let ordered = composer.orderer.order(collected);

        trace!(region = %region, blocks = ordered.len(), depth = self.depth, "composing region");

        composer.resolver.resolve_all(&ordered, self)
    }

    /// A region's items rendered to markup, joined by newlines
    ///
    /// Items whose value isn't a string are skipped.
    pub fn render_region(&mut self, region: &str) -> Result<String> {
        let items = self.blocks_for(region)?;
        let parts: Vec<&str> = items.iter().filter_map(ResolvedBlock::markup).collect();
        Ok(parts.join("\n"))
    }

    /// Dispatch a `blocks_<region>` helper
    ///
    /// Returns `Ok(None)` if `name` isn't a helper for a configured region.
    pub fn helper(&mut self, name: &str) -> Result<Option<Vec<ResolvedBlock>>> {
        let Some(region) = name.strip_prefix(REGION_HELPER_PREFIX) else {
            return Ok(None);
        };
        if !self.config().has_region(region) {
            return Ok(None);
        }
        self.blocks_for(region).map(Some)
    }

    /// Names of the per-region helpers
    pub fn helper_names(&self) -> Vec<String> {
        self.region_names()
            .iter()
            .map(|region| format!("{}{}", REGION_HELPER_PREFIX, region))
            .collect()
    }

    pub fn region_names(&self) -> &'c [String] {
        &self.config().regions
    }

    pub fn site_title(&self) -> &'c str {
        &self.config().site_title
    }

    pub fn current_url(&self) -> &str {
        self.request.url()
    }

    pub fn body_classes(&self) -> String {
        body_classes(self.request.path())
    }

    /// Render a full page through the host renderer
    ///
    /// The template sees the response locals plus `site_title`,
    /// `body_classes` and `current_url`.
    pub fn render(&mut self, template: &str) -> Result<String> {
        let mut locals: Map<String, Value> = self.response.locals.clone();
        locals.insert("site_title".to_string(), Value::from(self.site_title()));
        locals.insert("body_classes".to_string(), Value::from(self.body_classes()));
        locals.insert("current_url".to_string(), Value::from(self.current_url()));

        let composer = self.composer;
        composer.renderer().render(template, &RenderOptions::page(locals), self)
    }

    /// End the request, dropping all collection state
    pub fn finish(self) -> (Request, Response) {
        (self.request, self.response)
    }
}

/// CSS classes describing a path
///
/// `"front"` for the site root, otherwise one class per path prefix:
/// `/docs/guide/setup` gives `"docs docs-guide docs-guide-setup"`.
pub fn body_classes(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "front".to_string();
    }

    (1..=segments.len())
        .map(|n| segments[..n].join("-"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockDefinition, MenuItem};
    use crate::error::{ContentError, LoaderError};
    use crate::render::PlaceholderRenderer;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn renderer() -> PlaceholderRenderer {
        PlaceholderRenderer::new()
            .with_template("menu_item", "<a href=\"{{href}}\">{{title}}</a>")
            .with_template("layout", "<nav>{{ blocks:menu }}</nav><main>{{ body }}</main>")
            .with_template("home", "{{site_title}} ({{body_classes}})")
            .with_layout("layout")
    }

    fn composer(setup: impl FnOnce(&mut BlockRegistry)) -> Composer {
        let mut registry = BlockRegistry::with_defaults();
        setup(&mut registry);
        Composer::new(registry.freeze(), Arc::new(renderer()))
    }

    fn values(items: &[ResolvedBlock]) -> Vec<Value> {
        items.iter().map(|item| item.value.clone()).collect()
    }

    #[test]
    fn test_blocks_for_orders_by_weight() {
        let composer = composer(|registry| {
            registry
                .register(BlockDefinition::new().region("menu").weight(5.0).content("Home"))
                .unwrap();
            registry
                .register(BlockDefinition::new().region("menu").weight(1.0).content("About"))
                .unwrap();
        });
        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();

        let items = page.blocks_for("menu").unwrap();
        assert_eq!(values(&items), vec![json!("About"), json!("Home")]);
    }

    #[test]
    fn test_blocks_for_is_consume_once() {
        let composer = composer(|registry| {
            registry.register(BlockDefinition::new().region("header")).unwrap();
        });
        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();

        assert_eq!(page.blocks_for("header").unwrap().len(), 1);
        assert!(page.blocks_for("header").unwrap().is_empty());
        assert_eq!(page.state().collected("header").len(), 1);
    }

    #[test]
    fn test_redispatch_adds_nothing() {
        let composer = composer(|registry| {
            registry.register(BlockDefinition::new().region("header")).unwrap();
        });
        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();

        let report = page.dispatch().unwrap();
        assert_eq!(report.duplicates, 1);
        assert_eq!(page.blocks_for("header").unwrap().len(), 1);
    }

    #[test]
    fn test_content_function_called_once_per_collection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let composer = composer(move |registry| {
            registry
                .register(BlockDefinition::new().region("left").computed(move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("counted"))
                }))
                .unwrap();
        });

        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();
        page.dispatch().unwrap();
        page.blocks_for("left").unwrap();
        page.blocks_for("left").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_menu_items_render_through_template() {
        let composer = composer(|registry| {
            registry
                .register_menu_item(MenuItem::new("Docs", "/docs").weight(2.0))
                .unwrap();
            registry
                .register_menu_item(MenuItem::new("Home", "/").weight(1.0))
                .unwrap();
        });
        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();

        let markup = page.render_region("menu").unwrap();
        assert_eq!(markup, "<a href=\"/\">Home</a>\n<a href=\"/docs\">Docs</a>");
    }

    #[test]
    fn test_full_page_render() {
        let composer = composer(|registry| {
            registry.register_menu_item(MenuItem::new("Home", "/")).unwrap();
        });
        let mut page = composer
            .begin(Request::new("/docs/guide"), Response::new())
            .unwrap();

        let html = page.render("home").unwrap();
        assert_eq!(
            html,
            "<nav><a href=\"/\">Home</a></nav><main>Express Lane (docs docs-guide)</main>"
        );
    }

    #[test]
    fn test_helper_dispatch() {
        let composer = composer(|registry| {
            registry
                .register(BlockDefinition::new().region("footer").content("(c)"))
                .unwrap();
        });
        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();

        assert!(page.helper("blocks_sidebar").unwrap().is_none());
        assert!(page.helper("site_title").unwrap().is_none());
        let items = page.helper("blocks_footer").unwrap().unwrap();
        assert_eq!(values(&items), vec![json!("(c)")]);
        assert!(page.helper_names().contains(&"blocks_footer".to_string()));
    }

    #[test]
    fn test_self_referencing_template_is_bounded() {
        let mut registry = BlockRegistry::with_defaults();
        registry
            .register(BlockDefinition::new().region("left").template("nest").content("outer"))
            .unwrap();
        registry
            .register(BlockDefinition::new().region("right").template("nest").content("inner"))
            .unwrap();
        let renderer = PlaceholderRenderer::new()
            .with_template("nest", "[{{ blocks:left }}{{ blocks:right }}]");
        let composer = Composer::new(registry.freeze(), Arc::new(renderer));
        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();

        // left's template asks for left again (already drained) and right.
        let markup = page.render_region("left").unwrap();
        assert_eq!(markup, "[[]]");
    }

    #[test]
    fn test_recursion_limit() {
        let config = BlocksConfig::builder().max_render_depth(2).build().unwrap();
        let mut registry = BlockRegistry::new(Arc::new(config)).unwrap();
        registry
            .register(BlockDefinition::new().region("left").template("a").content("a"))
            .unwrap();
        registry
            .register(BlockDefinition::new().region("right").template("b").content("b"))
            .unwrap();
        registry
            .register(BlockDefinition::new().region("footer").content("deep"))
            .unwrap();
        let renderer = PlaceholderRenderer::new()
            .with_template("a", "a({{ blocks:right }})")
            .with_template("b", "b({{ blocks:footer }})");
        let composer = Composer::new(registry.freeze(), Arc::new(renderer));
        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();

        // left (depth 1) -> right (depth 2) -> footer would be depth 3: the
        // right block fails and is left out of left's template.
        assert_eq!(page.render_region("left").unwrap(), "a()");
        assert_eq!(page.depth(), 0);
    }

    #[test]
    fn test_failing_block_is_left_out() {
        let composer = composer(|registry| {
            registry
                .register(BlockDefinition::new().region("content").content("first"))
                .unwrap();
            registry
                .register(
                    BlockDefinition::new()
                        .region("content")
                        .computed(|_, _| Err(ContentError::new("broken plugin"))),
                )
                .unwrap();
            registry
                .register(BlockDefinition::new().region("content").content("last"))
                .unwrap();
        });
        let mut page = composer.begin(Request::new("/"), Response::new()).unwrap();

        let items = page.blocks_for("content").unwrap();
        assert_eq!(values(&items), vec![json!("first"), json!("last")]);
    }

    #[test]
    fn test_aborted_page() {
        let composer = composer(|registry| {
            registry.register(BlockDefinition::new().region("header")).unwrap();
        });
        let request = Request::new("/");
        let handle = request.abort_handle();
        let mut page = composer.begin(request, Response::new()).unwrap();

        handle.abort();
        assert!(matches!(page.blocks_for("header"), Err(BlockError::Aborted)));
    }

    #[test]
    fn test_finish_returns_request_data() {
        let composer = composer(|registry| {
            registry
                .register(BlockDefinition::new().loader(|req, _| {
                    req.data.insert("seen".to_string(), json!(true));
                    Ok(())
                }))
                .unwrap();
        });
        let page = composer.begin(Request::new("/"), Response::new()).unwrap();
        let (request, _) = page.finish();
        assert_eq!(request.data_value("seen"), Some(&json!(true)));
    }

    #[test]
    fn test_open_keeps_request_after_loader_failure() {
        let composer = composer(|registry| {
            registry
                .register(BlockDefinition::new().loader(|req, _| {
                    req.data.insert("attempted".to_string(), json!(true));
                    Err(LoaderError::new("upstream down"))
                }))
                .unwrap();
        });

        let request = Request::new("/checkout").with_session("user", "ada");
        let response = Response::new().with_local("title", "Checkout");
        let mut page = composer.open(request, response);
        assert_eq!(page.state().loaded_count(), 0);

        let err = page.dispatch().unwrap_err();
        assert!(matches!(err, BlockError::LoaderFailed { .. }));

        let (request, response) = page.finish();
        assert_eq!(request.session_value("user"), Some(&json!("ada")));
        assert_eq!(request.data_value("attempted"), Some(&json!(true)));
        assert_eq!(response.locals.get("title"), Some(&json!("Checkout")));
    }

    #[test]
    fn test_body_classes() {
        assert_eq!(body_classes("/"), "front");
        assert_eq!(body_classes(""), "front");
        assert_eq!(body_classes("/docs"), "docs");
        assert_eq!(body_classes("/docs/guide/setup"), "docs docs-guide docs-guide-setup");
        assert_eq!(body_classes("//docs//guide/"), "docs docs-guide");
    }
}
