//! Blocks - conditional units of page content bound to a route and a region
//!
//! A [`BlockDefinition`] is what application code writes. Registration turns
//! it into a [`RegisteredBlock`]: the same definition with its defaults
//! applied, its route compiled, and an identity assigned. Registered blocks
//! never change; per-request work operates on clones.

mod definition;
mod id;
mod menu;

pub use definition::{BlockContent, BlockDefinition, ContentFn, FilterFn, LoaderFn};
pub use id::BlockId;
pub use menu::MenuItem;

use crate::route::RoutePattern;

/// A block after registration
#[derive(Debug, Clone)]
pub struct RegisteredBlock {
    id: BlockId,
    sequence: u64,
    region: String,
    route: RoutePattern,
    definition: BlockDefinition,
}

impl RegisteredBlock {
    pub(crate) fn new(
        id: BlockId,
        sequence: u64,
        region: String,
        route: RoutePattern,
        definition: BlockDefinition,
    ) -> Self {
        Self {
            id,
            sequence,
            region,
            route,
            definition,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Position in registration order
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn route(&self) -> &RoutePattern {
        &self.route
    }

    pub fn weight(&self) -> f64 {
        self.definition.weight
    }

    pub fn template(&self) -> Option<&str> {
        self.definition.template.as_deref()
    }

    pub fn definition(&self) -> &BlockDefinition {
        &self.definition
    }
}
