//! # Lane Blocks - region-based page composition
//!
//! Independent parts of a web application register *blocks* (menu entries,
//! sidebar widgets, promotional panels) against route patterns and named
//! layout regions. For each request, the engine works out which blocks apply,
//! makes sure each one is collected at most once, filters them, and hands
//! every region's ordered, resolved list to the page template.
//!
//! ## Architecture
//!
//! ```text
//!  setup                              per request
//!  ─────                              ───────────
//!  register / register_menu_item      Composer::begin(request)
//!          │                                  │
//!          ▼                                  ▼
//!   ┌──────────────┐   frozen   ┌────────────────────────────┐
//!   │ BlockRegistry│ ─────────▶ │ BlockMatcher               │
//!   └──────────────┘            │  loaders → dedup → filter  │
//!                               │  → subscribe "blocks:<r>"  │
//!                               └────────────────────────────┘
//!                                             │
//!                        template asks for a region (blocks_for)
//!                                             ▼
//!               CollectionState::collect → BlockOrderer → ContentResolver
//!                                             │
//!                                             ▼
//!                                   Vec<ResolvedBlock>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lane_blocks::{
//!     BlockDefinition, BlockRegistry, Composer, MenuItem, PlaceholderRenderer,
//!     Request, Response,
//! };
//!
//! let mut registry = BlockRegistry::with_defaults();
//! registry.register_menu_item(MenuItem::new("Home", "/").weight(0.0)).unwrap();
//! registry.register_menu_item(MenuItem::new("Docs", "/docs").weight(1.0)).unwrap();
//! registry
//!     .register(
//!         BlockDefinition::new()
//!             .route("/docs/*")
//!             .region("left")
//!             .content("Table of contents"),
//!     )
//!     .unwrap();
//!
//! let renderer = PlaceholderRenderer::new()
//!     .with_template("menu_item", "<a href=\"{{href}}\">{{title}}</a>");
//! let composer = Composer::new(registry.freeze(), Arc::new(renderer));
//!
//! let mut page = composer.begin(Request::new("/docs/intro"), Response::new()).unwrap();
//! assert_eq!(
//!     page.render_region("menu").unwrap(),
//!     "<a href=\"/\">Home</a>\n<a href=\"/docs\">Docs</a>"
//! );
//! assert_eq!(page.render_region("left").unwrap(), "Table of contents");
//! ```

pub mod block;
pub mod collector;
pub mod config;
pub mod error;
pub mod matcher;
pub mod orderer;
pub mod page;
pub mod registry;
pub mod render;
pub mod request;
pub mod resolver;
pub mod route;

// Re-export main types
pub use block::{BlockContent, BlockDefinition, BlockId, MenuItem, RegisteredBlock};
pub use collector::CollectionState;
pub use config::{BlocksConfig, BlocksConfigBuilder};
pub use error::{BlockError, ContentError, ErrorCategory, LoaderError, Result};
pub use matcher::{AttachReport, BlockMatcher, Disposition};
pub use orderer::BlockOrderer;
pub use page::{body_classes, Composer, Page};
pub use registry::BlockRegistry;
pub use render::{PlaceholderRenderer, RenderOptions, TemplateRenderer};
pub use request::{AbortHandle, Request, Response};
pub use resolver::{ContentResolver, ResolvedBlock};
pub use route::RoutePattern;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
