//! Region Collector - per-request gathering of blocks into regions
//!
//! Each request owns one [`CollectionState`]. The matcher subscribes eligible
//! blocks to their region's channel (`"blocks:<region>"`); collecting a region
//! fires and drains that channel, so every listener runs at most once. A second
//! collection of the same region finds no listeners and returns nothing.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::block::{BlockId, RegisteredBlock};

/// One-shot listener that contributes to a region's collected list
type Listener = Box<dyn FnOnce(&mut Vec<RegisteredBlock>) + Send>;

/// Channel name for a region
pub fn channel(region: &str) -> String {
    format!("blocks:{}", region)
}

/// Per-request collection state
///
/// Created fresh for each request and dropped with it.
#[derive(Default)]
pub struct CollectionState {
    /// Blocks already attached or considered this request
    loaded: HashSet<BlockId>,

    /// Pending listeners by channel, in subscription order
    listeners: HashMap<String, Vec<Listener>>,

    /// Everything collected so far, by region, before ordering
    collected: HashMap<String, Vec<RegisteredBlock>>,
}

impl CollectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a block has already been considered this request
    pub fn is_loaded(&self, id: BlockId) -> bool {
        self.loaded.contains(&id)
    }

    /// Mark a block considered; returns false if it already was
    pub fn mark_loaded(&mut self, id: BlockId) -> bool {
        self.loaded.insert(id)
    }

    /// Number of blocks considered this request
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Subscribe a block to its region's channel
    ///
    /// When the region is collected, a clone of the block is appended to the
    /// collected list.
    pub fn subscribe(&mut self, block: Arc<RegisteredBlock>) {
        let key = channel(block.region());
        trace!(block = %block.id(), channel = %key, "subscribed");
        self.on(key, move |blocks| blocks.push(RegisteredBlock::clone(&block)));
    }

    /// Install a one-shot listener on a channel
    fn on<F>(&mut self, channel: String, listener: F)
    where
        F: FnOnce(&mut Vec<RegisteredBlock>) + Send + 'static,
    {
        self.listeners
            .entry(channel)
            .or_default()
            .push(Box::new(listener));
    }

    /// Number of listeners waiting on a region
    pub fn pending(&self, region: &str) -> usize {
        self.listeners.get(&channel(region)).map_or(0, Vec::len)
    }

    /// Fire and drain a region's channel
    ///
    /// Returns the blocks gathered by this call, in subscription order.
    pub fn collect(&mut self, region: &str) -> Vec<RegisteredBlock> {
        let listeners = self.listeners.remove(&channel(region)).unwrap_or_default();

        let mut blocks = Vec::with_capacity(listeners.len());
        for listener in listeners {
            listener(&mut blocks);
        }

        trace!(region = %region, collected = blocks.len(), "region collected");

        self.collected
            .entry(region.to_string())
            .or_default()
            .extend(blocks.iter().cloned());
        blocks
    }

    /// Everything collected for a region so far this request
    pub fn collected(&self, region: &str) -> &[RegisteredBlock] {
        self.collected.get(region).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Debug for CollectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(channel, listeners)| (channel.as_str(), listeners.len()))
            .collect();
        f.debug_struct("CollectionState")
            .field("loaded", &self.loaded.len())
            .field("pending", &pending)
            .field("collected", &self.collected.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockDefinition;
    use crate::registry::BlockRegistry;

    fn registry_with(regions: &[&str]) -> BlockRegistry {
        let mut registry = BlockRegistry::with_defaults();
        for region in regions {
            registry
                .register(BlockDefinition::new().region(*region))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_channel_name() {
        assert_eq!(channel("menu"), "blocks:menu");
    }

    #[test]
    fn test_collect_in_subscription_order() {
        let registry = registry_with(&["header", "header", "footer"]);
        let mut state = CollectionState::new();
        for block in registry.blocks() {
            state.subscribe(Arc::clone(block));
        }

        assert_eq!(state.pending("header"), 2);
        let header = state.collect("header");
        assert_eq!(header.len(), 2);
        assert_eq!(header[0].sequence(), 0);
        assert_eq!(header[1].sequence(), 1);
        assert_eq!(state.pending("footer"), 1);
    }

    #[test]
    fn test_collect_is_consume_once() {
        let registry = registry_with(&["menu"]);
        let mut state = CollectionState::new();
        state.subscribe(Arc::clone(&registry.blocks()[0]));

        assert_eq!(state.collect("menu").len(), 1);
        assert!(state.collect("menu").is_empty());
        assert_eq!(state.collected("menu").len(), 1);
    }

    #[test]
    fn test_collect_unknown_region_is_empty() {
        let mut state = CollectionState::new();
        assert!(state.collect("nowhere").is_empty());
        assert!(state.collected("nowhere").is_empty());
    }

    #[test]
    fn test_mark_loaded() {
        let mut state = CollectionState::new();
        let id = BlockId::new();

        assert!(!state.is_loaded(id));
        assert!(state.mark_loaded(id));
        assert!(!state.mark_loaded(id));
        assert!(state.is_loaded(id));
        assert_eq!(state.loaded_count(), 1);
    }

    #[test]
    fn test_raw_listener() {
        let registry = registry_with(&["left"]);
        let block = Arc::clone(&registry.blocks()[0]);
        let mut state = CollectionState::new();

        state.on(channel("left"), move |blocks| {
            blocks.push(RegisteredBlock::clone(&block));
            blocks.push(RegisteredBlock::clone(&block));
        });
        assert_eq!(state.collect("left").len(), 2);
    }
}
