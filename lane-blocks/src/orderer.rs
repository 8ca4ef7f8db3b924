//! Block Orderer - stable weight ordering within a region

use crate::block::RegisteredBlock;

/// Sort key for a weight
///
/// NaN orders as `0`, and `-0.0` is folded into `0.0` so both sit with the
/// other zero-weight blocks.
pub fn weight_key(weight: f64) -> f64 {
    if weight.is_nan() || weight == 0.0 {
        0.0
    } else {
        weight
    }
}

/// Orders a region's collected blocks
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockOrderer;

impl BlockOrderer {
    pub fn new() -> Self {
        Self
    }

    /// Sort ascending by weight, keeping collection order for equal weights
    pub fn order(&self, mut blocks: Vec<RegisteredBlock>) -> Vec<RegisteredBlock> {
        blocks.sort_by(|a, b| weight_key(a.weight()).total_cmp(&weight_key(b.weight())));
        blocks
    }
}
