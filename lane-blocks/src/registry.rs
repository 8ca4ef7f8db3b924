//! Block Registry - the standing set of registered blocks
//!
//! The registry is filled during application setup and then frozen behind an
//! `Arc`. Nothing is ever removed or changed after registration, so request
//! threads read it without locking.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::block::{BlockDefinition, BlockId, MenuItem, RegisteredBlock};
use crate::config::BlocksConfig;
use crate::error::{BlockError, Result};
use crate::route::RoutePattern;

/// Append-only store of block definitions
#[derive(Debug)]
pub struct BlockRegistry {
    config: Arc<BlocksConfig>,

    /// All blocks, in registration order
    blocks: Vec<Arc<RegisteredBlock>>,

    /// Index by identity
    by_id: HashMap<BlockId, usize>,

    /// Index by target region
    by_region: HashMap<String, Vec<usize>>,
}

impl BlockRegistry {
    /// Create an empty registry bound to a configuration
    ///
    /// The configuration is validated first, so a hand-assembled
    /// `BlocksConfig` gets the same checks as one from the builder.
    pub fn new(config: Arc<BlocksConfig>) -> Result<Self> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    /// Create an empty registry with the default configuration
    pub fn with_defaults() -> Self {
        Self::unchecked(Arc::new(BlocksConfig::default()))
    }

    fn unchecked(config: Arc<BlocksConfig>) -> Self {
        Self {
            config,
            blocks: Vec::new(),
            by_id: HashMap::new(),
            by_region: HashMap::new(),
        }
    }

    /// Register a block
    ///
    /// Applies defaults, validates the definition and assigns a fresh
    /// identity. Registration only installs a standing rule; nothing happens
    /// per request until [`crate::matcher::BlockMatcher`] offers the block.
    pub fn register(&mut self, mut definition: BlockDefinition) -> Result<BlockId> {
        let region = definition
            .region
            .clone()
            .unwrap_or_else(|| self.config.default_region.clone());

        if !self.config.has_region(&region) {
            return Err(BlockError::UnknownRegion { region });
        }
        if !definition.weight.is_finite() {
            return Err(BlockError::InvalidWeight {
                weight: definition.weight,
            });
        }
        let route = RoutePattern::parse(&definition.route)?;

        definition.region = Some(region.clone());

        let id = BlockId::new();
        let idx = self.blocks.len();

        debug!(
            block = %id,
            region = %region,
            route = %route.as_str(),
            weight = definition.weight,
            "registered block"
        );

        self.by_id.insert(id, idx);
        self.by_region.entry(region.clone()).or_default().push(idx);
        self.blocks.push(Arc::new(RegisteredBlock::new(
            id,
            idx as u64,
            region,
            route,
            definition,
        )));

        Ok(id)
    }

    /// Register a menu item (a block with menu defaults)
    pub fn register_menu_item(&mut self, item: MenuItem) -> Result<BlockId> {
        let definition = item.into_definition(&self.config);
        self.register(definition)
    }

    /// Finish setup and share the registry across requests
    pub fn freeze(self) -> Arc<Self> {
        debug!(blocks = self.blocks.len(), "block registry frozen");
        Arc::new(self)
    }

    pub fn config(&self) -> &Arc<BlocksConfig> {
        &self.config
    }

    /// Get a block by identity
    pub fn get(&self, id: BlockId) -> Option<&Arc<RegisteredBlock>> {
        self.by_id.get(&id).map(|idx| &self.blocks[*idx])
    }

    /// All blocks, in registration order
    pub fn blocks(&self) -> &[Arc<RegisteredBlock>] {
        &self.blocks
    }

    /// Blocks targeting `region`, in registration order
    pub fn in_region(&self, region: &str) -> Vec<&Arc<RegisteredBlock>> {
        self.by_region
            .get(region)
            .map(|indices| indices.iter().map(|idx| &self.blocks[*idx]).collect())
            .unwrap_or_default()
    }

    /// Blocks whose route matches `path`, in registration order
    pub fn matching<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Arc<RegisteredBlock>> + 'a {
        self.blocks.iter().filter(move |block| block.route().matches(path))
    }

    /// Number of registered blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_applies_defaults() {
        let mut registry = BlockRegistry::with_defaults();
        let id = registry.register(BlockDefinition::new()).unwrap();

        let block = registry.get(id).unwrap();
        assert_eq!(block.region(), "right");
        assert!(block.route().is_match_all());
        assert_eq!(block.weight(), 0.0);
        assert_eq!(block.sequence(), 0);
        assert_eq!(block.definition().region.as_deref(), Some("right"));
    }

    #[test]
    fn test_identities_and_sequence() {
        let mut registry = BlockRegistry::with_defaults();
        let a = registry.register(BlockDefinition::new().region("header")).unwrap();
        let b = registry.register(BlockDefinition::new().region("header")).unwrap();

        assert_ne!(a, b);
        assert_eq!(registry.get(a).unwrap().sequence(), 0);
        assert_eq!(registry.get(b).unwrap().sequence(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_menu_item() {
        let mut registry = BlockRegistry::with_defaults();
        let id = registry.register_menu_item(MenuItem::new("Home", "/")).unwrap();

        let block = registry.get(id).unwrap();
        assert_eq!(block.region(), "menu");
        assert_eq!(block.template(), Some("menu_item"));
    }

    #[test]
    fn test_unknown_region_rejected() {
        let mut registry = BlockRegistry::with_defaults();
        let err = registry
            .register(BlockDefinition::new().region("sidebar"))
            .unwrap_err();
        assert!(matches!(err, BlockError::UnknownRegion { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_weight_rejected() {
        let mut registry = BlockRegistry::with_defaults();
        let err = registry
            .register(BlockDefinition::new().weight(f64::NAN))
            .unwrap_err();
        assert!(matches!(err, BlockError::InvalidWeight { .. }));

        let err = registry
            .register(BlockDefinition::new().weight(f64::INFINITY))
            .unwrap_err();
        assert!(matches!(err, BlockError::InvalidWeight { .. }));
    }

    #[test]
    fn test_invalid_route_rejected() {
        let mut registry = BlockRegistry::with_defaults();
        let err = registry
            .register(BlockDefinition::new().route("no-leading-slash"))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_in_region_and_matching() {
        let mut registry = BlockRegistry::with_defaults();
        registry
            .register(BlockDefinition::new().region("left").route("/docs/*"))
            .unwrap();
        registry
            .register(BlockDefinition::new().region("left").route("/blog/*"))
            .unwrap();
        registry.register(BlockDefinition::new().region("footer")).unwrap();

        assert_eq!(registry.in_region("left").len(), 2);
        assert_eq!(registry.in_region("header").len(), 0);

        let matched: Vec<_> = registry.matching("/docs/intro").collect();
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].region(), "left");
        assert_eq!(matched[1].region(), "footer");
    }

    #[test]
    fn test_new_validates_config() {
        let config = BlocksConfig {
            max_render_depth: 0,
            ..BlocksConfig::default()
        };
        let err = BlockRegistry::new(Arc::new(config)).unwrap_err();
        assert!(matches!(err, BlockError::InvalidConfig { .. }));

        let config = BlocksConfig {
            default_region: "sidebar".to_string(),
            ..BlocksConfig::default()
        };
        assert!(BlockRegistry::new(Arc::new(config)).is_err());

        assert!(BlockRegistry::new(Arc::new(BlocksConfig::default())).is_ok());
    }

    #[test]
    fn test_freeze_shares_registry() {
        let mut registry = BlockRegistry::with_defaults();
        registry.register(BlockDefinition::new()).unwrap();

        let frozen = registry.freeze();
        let clone = Arc::clone(&frozen);
        assert_eq!(clone.len(), 1);
    }
}
