//! Block Matcher - offers registered blocks to an incoming request
//!
//! For every registered block whose route matches the request path:
//! 1. run the block's loaders
//! 2. skip it if it was already considered this request
//! 3. mark it considered and evaluate its filter
//! 4. subscribe it to its region's channel
//!
//! Running the matcher twice for one request (for example when the host
//! re-dispatches through its middleware) subscribes nothing new.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::block::RegisteredBlock;
use crate::collector::CollectionState;
use crate::error::{BlockError, Result};
use crate::registry::BlockRegistry;
use crate::request::{Request, Response};

/// What happened to one block when it was offered to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Route didn't match the request path
    NotMatched,
    /// Already considered earlier in this request
    Duplicate,
    /// Filter rejected it; terminal for this request
    Excluded,
    /// Waiting on its region's channel
    Subscribed,
}

/// Summary of one matcher pass over the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachReport {
    /// Blocks whose route matched
    pub matched: usize,
    /// Blocks newly subscribed
    pub subscribed: usize,
    /// Blocks skipped as already considered
    pub duplicates: usize,
    /// Blocks rejected by their filter
    pub excluded: usize,
}

impl AttachReport {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::NotMatched => return,
            Disposition::Duplicate => self.duplicates += 1,
            Disposition::Excluded => self.excluded += 1,
            Disposition::Subscribed => self.subscribed += 1,
        }
        self.matched += 1;
    }
}

/// Matches registered blocks against requests
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockMatcher;

impl BlockMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Offer every registered block to the request, in registration order
    pub fn attach(
        &self,
        registry: &BlockRegistry,
        request: &mut Request,
        response: &mut Response,
        state: &mut CollectionState,
    ) -> Result<AttachReport> {
        if request.is_aborted() {
            return Err(BlockError::Aborted);
        }

        let mut report = AttachReport::default();
        for block in registry.blocks() {
            let disposition = self.offer(block, request, response, state)?;
            report.record(disposition);
        }

        debug!(
            path = %request.path(),
            matched = report.matched,
            subscribed = report.subscribed,
            duplicates = report.duplicates,
            excluded = report.excluded,
            "blocks attached"
        );
        Ok(report)
    }

    /// Offer a single block to the request
    pub fn offer(
        &self,
        block: &Arc<RegisteredBlock>,
        request: &mut Request,
        response: &mut Response,
        state: &mut CollectionState,
    ) -> Result<Disposition> {
        if !block.route().matches(request.path()) {
            return Ok(Disposition::NotMatched);
        }

        for loader in &block.definition().loaders {
            loader(request, response).map_err(|e| BlockError::LoaderFailed {
                block: block.id(),
                reason: e.to_string(),
            })?;
        }

        if !state.mark_loaded(block.id()) {
            trace!(block = %block.id(), "already considered this request");
            return Ok(Disposition::Duplicate);
        }

        if let Some(filter) = &block.definition().filter {
            if !filter(request, response) {
                trace!(block = %block.id(), region = %block.region(), "excluded by filter");
                return Ok(Disposition::Excluded);
            }
        }

        state.subscribe(Arc::clone(block));
        Ok(Disposition::Subscribed)
    }
}
