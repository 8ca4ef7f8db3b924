//! Content Resolver - turns collected blocks into renderable items
//!
//! Resolution never touches the registered block: content is cloned (static)
//! or computed fresh (function), merged under the block's display fields,
//! and, for templated blocks, rendered through the host renderer with the
//! layout suppressed.
//!
//! A block that fails to resolve is logged and left out; the rest of its
//! region still resolves.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::block::{BlockContent, BlockId, RegisteredBlock};
use crate::error::{BlockError, Result};
use crate::page::Page;
use crate::render::RenderOptions;
use crate::request::{Request, Response};

/// A block ready for the template layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBlock {
    pub id: BlockId,
    pub region: String,
    pub weight: f64,
    /// Template the value was rendered through, after overrides
    pub template: Option<String>,
    /// Display fields merged with the resolved content object
    pub locals: Map<String, Value>,
    /// Final value: rendered markup for templated blocks, the content otherwise
    pub value: Value,
}

impl ResolvedBlock {
    /// Markup for this item, if it resolved to a string
    pub fn markup(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// Resolves block content for one request
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentResolver;

impl ContentResolver {
    pub fn new() -> Self {
        Self
    }

    /// The block's content for this request
    pub fn content(
        &self,
        block: &RegisteredBlock,
        request: &Request,
        response: &Response,
    ) -> Result<Value> {
        match &block.definition().content {
            BlockContent::Static(value) => Ok(value.clone()),
            BlockContent::Computed(f) => f(request, response).map_err(|e| BlockError::ContentFailed {
                block: block.id(),
                reason: e.to_string(),
            }),
        }
    }

    /// Template locals: display fields, overlaid with an object content's keys
    pub fn locals(&self, block: &RegisteredBlock, content: &Value) -> Map<String, Value> {
        let mut locals = block.definition().fields.clone();
        if let Value::Object(entries) = content {
            for (key, value) in entries {
                locals.insert(key.clone(), value.clone());
            }
        }
        locals
    }

    /// Resolve one block, rendering its template if it has one
    pub fn resolve(&self, block: &RegisteredBlock, page: &mut Page<'_>) -> Result<ResolvedBlock> {
        let content = self.content(block, page.request(), page.response())?;
        let locals = self.locals(block, &content);

        let (template, value) = match block.template() {
            None => (None, content),
            Some(name) => {
                let template = page.config().template_for(name).to_string();
                let options = RenderOptions::partial(locals.clone());
                let composer = page.composer();
                let markup = composer.renderer().render(&template, &options, page)?;
                (Some(template), Value::String(markup))
            }
        };

        trace!(block = %block.id(), region = %block.region(), "block resolved");

        Ok(ResolvedBlock {
            id: block.id(),
            region: block.region().to_string(),
            weight: block.weight(),
            template,
            locals,
            value,
        })
    }

    /// Resolve an ordered list, dropping blocks that fail
    ///
    /// Contained failures are logged and skipped. Anything else (an aborted
    /// request, for one) stops resolution and discards the partial list.
    pub fn resolve_all(
        &self,
        blocks: &[RegisteredBlock],
        page: &mut Page<'_>,
    ) -> Result<Vec<ResolvedBlock>> {
        let mut resolved = Vec::with_capacity(blocks.len());

        for block in blocks {
            if page.request().is_aborted() {
                return Err(BlockError::Aborted);
            }
            match self.resolve(block, page) {
                Ok(item) => resolved.push(item),
                Err(e) if e.is_contained() => {
                    warn!(
                        block = %block.id(),
                        region = %block.region(),
                        code = e.code(),
                        error = %e,
                        "block left out of region"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(resolved)
    }
}
