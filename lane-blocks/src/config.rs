//! Block composition configuration
//!
//! Built once at startup and shared read-only through `Arc`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BlockError, Result};

/// Regions a layout offers when the application doesn't configure its own
pub const DEFAULT_REGIONS: [&str; 6] = ["menu", "header", "footer", "left", "right", "content"];

/// Composition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocksConfig {
    /// Named layout regions blocks may target
    pub regions: Vec<String>,
    /// Region for blocks that don't name one
    pub default_region: String,
    /// Region menu items land in unless they say otherwise
    pub menu_region: String,
    /// Template used to render menu items
    pub menu_template: String,
    /// Template id replacements (`original -> override`)
    pub template_overrides: HashMap<String, String>,
    /// How many region collections may nest inside block templates
    pub max_render_depth: usize,
    /// Exposed to templates as `site_title`
    pub site_title: String,
}

impl BlocksConfig {
    /// Create a new configuration builder
    pub fn builder() -> BlocksConfigBuilder {
        BlocksConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(BlockError::InvalidConfig { reason });

        if self.regions.is_empty() {
            return invalid("at least one region is required".to_string());
        }
        if let Some(region) = self.regions.iter().find(|r| r.trim().is_empty()) {
            return invalid(format!("region name '{}' is blank", region));
        }
        if !self.has_region(&self.default_region) {
            return invalid(format!(
                "default region '{}' is not one of the configured regions",
                self.default_region
            ));
        }
        if !self.has_region(&self.menu_region) {
            return invalid(format!(
                "menu region '{}' is not one of the configured regions",
                self.menu_region
            ));
        }
        if self.max_render_depth == 0 {
            return invalid("max_render_depth must be at least 1".to_string());
        }
        Ok(())
    }

    /// Whether `region` is one of the configured regions
    pub fn has_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    /// Template id to render for `template`, after overrides
    pub fn template_for<'a>(&'a self, template: &'a str) -> &'a str {
        self.template_overrides
            .get(template)
            .map(String::as_str)
            .unwrap_or(template)
    }
}

impl Default for BlocksConfig {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            default_region: "right".to_string(),
            menu_region: "menu".to_string(),
            menu_template: "menu_item".to_string(),
            template_overrides: HashMap::new(),
            max_render_depth: 8,
            site_title: "Express Lane".to_string(),
        }
    }
}

/// Builder for BlocksConfig
#[derive(Debug, Default)]
pub struct BlocksConfigBuilder {
    regions: Option<Vec<String>>,
    default_region: Option<String>,
    menu_region: Option<String>,
    menu_template: Option<String>,
    template_overrides: HashMap<String, String>,
    max_render_depth: Option<usize>,
    site_title: Option<String>,
}

impl BlocksConfigBuilder {
    /// Replace the region set
    pub fn regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    pub fn menu_region(mut self, region: impl Into<String>) -> Self {
        self.menu_region = Some(region.into());
        self
    }

    pub fn menu_template(mut self, template: impl Into<String>) -> Self {
        self.menu_template = Some(template.into());
        self
    }

    /// Render `replacement` wherever `template` is requested
    pub fn override_template(
        mut self,
        template: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.template_overrides.insert(template.into(), replacement.into());
        self
    }

    pub fn max_render_depth(mut self, depth: usize) -> Self {
        self.max_render_depth = Some(depth);
        self
    }

    pub fn site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = Some(title.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<BlocksConfig> {
        let defaults = BlocksConfig::default();
        let config = BlocksConfig {
            regions: self.regions.unwrap_or(defaults.regions),
            default_region: self.default_region.unwrap_or(defaults.default_region),
            menu_region: self.menu_region.unwrap_or(defaults.menu_region),
            menu_template: self.menu_template.unwrap_or(defaults.menu_template),
            template_overrides: self.template_overrides,
            max_render_depth: self.max_render_depth.unwrap_or(defaults.max_render_depth),
            site_title: self.site_title.unwrap_or(defaults.site_title),
        };
        config.validate()?;
        Ok(config)
    }
}
