//! Menu items - blocks with menu defaults and link fields

use serde_json::Value;

use crate::config::BlocksConfig;
use crate::request::{Request, Response};

use super::definition::{BlockContent, BlockDefinition};

/// A menu entry
///
/// Converted into a plain [`BlockDefinition`] at registration: the region
/// defaults to the configured menu region, the template to the configured
/// menu template, and `href` / `title` become template fields.
#[derive(Debug, Clone, Default)]
pub struct MenuItem {
    block: BlockDefinition,
    href: Option<String>,
    title: Option<String>,
}

impl MenuItem {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            block: BlockDefinition::new(),
            href: Some(href.into()),
            title: Some(title.into()),
        }
    }

    pub fn href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn route(mut self, pattern: impl Into<String>) -> Self {
        self.block = self.block.route(pattern);
        self
    }

    /// Put the item somewhere other than the menu region
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.block = self.block.region(region);
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.block = self.block.weight(weight);
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Request, &Response) -> bool + Send + Sync + 'static,
    {
        self.block = self.block.filter(filter);
        self
    }

    pub fn content(mut self, content: impl Into<BlockContent>) -> Self {
        self.block = self.block.content(content);
        self
    }

    /// Render through a different template than the configured menu template
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.block = self.block.template(template);
        self
    }

    /// Produce the block definition this item registers as
    pub fn into_definition(self, config: &BlocksConfig) -> BlockDefinition {
        let MenuItem { mut block, href, title } = self;

        if block.region.is_none() {
            block.region = Some(config.menu_region.clone());
        }
        if block.template.is_none() {
            block.template = Some(config.menu_template.clone());
        }
        block
            .fields
            .insert("href".to_string(), href.map(Value::String).unwrap_or(Value::Null));
        block
            .fields
            .insert("title".to_string(), title.map(Value::String).unwrap_or(Value::Null));
        block
    }
}
