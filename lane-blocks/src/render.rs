//! Template rendering seam
//!
//! The host's templating engine plugs in through [`TemplateRenderer`]. It is
//! handed the [`Page`] being composed so a template can ask for other regions
//! while it renders.
//!
//! [`PlaceholderRenderer`] is a small engine for tests and the CLI. Its
//! templates are plain text with `{{ name }}` placeholders:
//! - `{{ key }}` inserts a local (strings as-is, other JSON as JSON text,
//!   missing or `null` as nothing)
//! - `{{ blocks:region }}` inserts the rendered items of a region
//!
//! A layout, when set, wraps full-page renders and receives the page body as
//! `{{ body }}`.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BlockError, Result};
use crate::page::Page;

/// Options for one render call
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderOptions {
    /// Render without the surrounding layout
    pub suppress_layout: bool,
    /// Template variables
    pub locals: Map<String, Value>,
}

impl RenderOptions {
    /// Options for a nested render of one block
    pub fn partial(locals: Map<String, Value>) -> Self {
        Self {
            suppress_layout: true,
            locals,
        }
    }

    /// Options for a full page render
    pub fn page(locals: Map<String, Value>) -> Self {
        Self {
            suppress_layout: false,
            locals,
        }
    }
}

/// Host templating engine
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` with `options`
    ///
    /// Failures should be reported as [`BlockError::RenderFailed`]; errors
    /// coming back from `page` must be returned unchanged.
    fn render(&self, template: &str, options: &RenderOptions, page: &mut Page<'_>) -> Result<String>;
}

/// Minimal `{{ placeholder }}` engine
#[derive(Debug, Clone, Default)]
pub struct PlaceholderRenderer {
    templates: HashMap<String, String>,
    layout: Option<String>,
}

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template
    pub fn with_template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(name.into(), source.into());
        self
    }

    /// Wrap full-page renders in the named template
    pub fn with_layout(mut self, name: impl Into<String>) -> Self {
        self.layout = Some(name.into());
        self
    }

    fn source(&self, template: &str) -> Result<&str> {
        self.templates
            .get(template)
            .map(String::as_str)
            .ok_or_else(|| BlockError::RenderFailed {
                template: template.to_string(),
                reason: "template not found".to_string(),
            })
    }

    fn expand(
        &self,
        template: &str,
        locals: &Map<String, Value>,
        page: &mut Page<'_>,
    ) -> Result<String> {
        let source = self.source(template)?;
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                return Err(BlockError::RenderFailed {
                    template: template.to_string(),
                    reason: "unterminated placeholder".to_string(),
                });
            };

            let key = after[..end].trim();
            if let Some(region) = key.strip_prefix("blocks:") {
                out.push_str(&page.render_region(region.trim())?);
            } else if let Some(value) = locals.get(key) {
                push_value(&mut out, value);
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, options: &RenderOptions, page: &mut Page<'_>) -> Result<String> {
        let body = self.expand(template, &options.locals, page)?;

        match &self.layout {
            Some(layout) if !options.suppress_layout && layout != template => {
                let mut locals = options.locals.clone();
                locals.insert("body".to_string(), Value::String(body));
                self.expand(layout, &locals, page)
            }
            _ => Ok(body),
        }
    }
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}
