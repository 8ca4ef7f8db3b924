//! Error types for block composition
//!
//! Errors fall into three categories, and each category has its own handling
//! policy:
//!
//! - **Configuration** errors come out of registration and config loading.
//!   They are fatal: setup should stop rather than run with a broken block.
//! - **Resolution** errors come out of a block's content function or its
//!   nested render. They never abort a region. The failing block is logged
//!   and left out, and the rest of the region still renders.
//! - **Request** errors (a failing loader, an aborted request) belong to the
//!   host's request lifecycle and are propagated to it.
//!
//! # Example
//!
//! ```rust
//! use lane_blocks::error::{BlockError, ErrorCategory};
//!
//! let err = BlockError::UnknownRegion { region: "sidebar".to_string() };
//! assert_eq!(err.category(), ErrorCategory::Configuration);
//! assert!(err.is_fatal());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::BlockId;

/// Result type alias for block operations
pub type Result<T> = std::result::Result<T, BlockError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Structurally invalid block definition or configuration (setup time)
    Configuration,
    /// A single block failed to resolve (request time, contained)
    Resolution,
    /// The request itself failed or went away (request time, propagated)
    Request,
}

/// Errors that can occur while registering, collecting or resolving blocks
#[derive(Error, Debug)]
pub enum BlockError {
    // ═══════════════════════════════════════════════════════════════════════
    // Configuration errors (registration time)
    // ═══════════════════════════════════════════════════════════════════════

    /// Route pattern could not be compiled
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    /// Block targets a region the configuration doesn't know about
    #[error("Unknown region '{region}'. Add it to the configured regions before registering blocks into it.")]
    UnknownRegion { region: String },

    /// Weight is NaN or infinite and cannot be ordered or serialized
    #[error("Invalid weight {weight}: block weights must be finite numbers")]
    InvalidWeight { weight: f64 },

    /// Configuration failed validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Resolution errors (contained per block)
    // ═══════════════════════════════════════════════════════════════════════

    /// A block's content function returned an error
    #[error("Content for block '{block}' failed: {reason}")]
    ContentFailed { block: BlockId, reason: String },

    /// Nested template render failed
    #[error("Rendering template '{template}' failed: {reason}")]
    RenderFailed { template: String, reason: String },

    /// Region was requested from inside too many nested renders
    #[error("Region '{region}' requested at render depth {depth}, which exceeds the configured limit")]
    RecursionLimit { region: String, depth: usize },

    // ═══════════════════════════════════════════════════════════════════════
    // Request errors (propagated to the host)
    // ═══════════════════════════════════════════════════════════════════════

    /// A block loader failed while preprocessing the request
    #[error("Loader for block '{block}' failed: {reason}")]
    LoaderFailed { block: BlockId, reason: String },

    /// The surrounding request was aborted; partial output is discarded
    #[error("Request aborted; partial block output discarded")]
    Aborted,

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl BlockError {
    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            BlockError::InvalidRoutePattern { .. }
            | BlockError::UnknownRegion { .. }
            | BlockError::InvalidWeight { .. }
            | BlockError::InvalidConfig { .. }
            | BlockError::JsonError(_) => ErrorCategory::Configuration,

            BlockError::ContentFailed { .. }
            | BlockError::RenderFailed { .. }
            | BlockError::RecursionLimit { .. } => ErrorCategory::Resolution,

            BlockError::LoaderFailed { .. } | BlockError::Aborted => ErrorCategory::Request,
        }
    }

    /// Returns true if setup should stop on this error
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Returns true if this error only affects the block that raised it
    ///
    /// Contained errors are logged and the block is dropped from its region;
    /// every other error propagates out of region collection.
    pub fn is_contained(&self) -> bool {
        self.category() == ErrorCategory::Resolution
    }

    /// Stable, machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            BlockError::InvalidRoutePattern { .. } => "INVALID_ROUTE_PATTERN",
            BlockError::UnknownRegion { .. } => "UNKNOWN_REGION",
            BlockError::InvalidWeight { .. } => "INVALID_WEIGHT",
            BlockError::InvalidConfig { .. } => "INVALID_CONFIG",
            BlockError::ContentFailed { .. } => "CONTENT_FAILED",
            BlockError::RenderFailed { .. } => "RENDER_FAILED",
            BlockError::RecursionLimit { .. } => "RECURSION_LIMIT",
            BlockError::LoaderFailed { .. } => "LOADER_FAILED",
            BlockError::Aborted => "ABORTED",
            BlockError::JsonError(_) => "JSON_ERROR",
        }
    }
}

/// Error returned by a block's content function
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ContentError(pub String);

impl ContentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error returned by a block loader
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LoaderError(pub String);

impl LoaderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
