//! # modelmux-discovery
//!
//! Asynchronous model discovery with a TTL cache and single-flight
//! de-duplication.
//!
//! - `discover(provider)` returns cached models while fresh (default TTL
//!   1 hour), otherwise lists models through the [`ModelLister`] seam.
//! - Concurrent discoveries for the same provider collapse into one remote
//!   call; every caller receives the same result.
//! - Discovery failures never propagate: the prior cache entry is retained
//!   re-flagged as curated fallback, or the registry's curated list is used
//!   when nothing was cached yet.
//! - `discover_all()` fans out across every registered LLM provider with
//!   bounded concurrency; one provider's failure never affects the others.
//!
//! The engine implements [`CatalogReader`](modelmux_model::CatalogReader)
//! over its cache, which is the read path profile validation and routing
//! use.

pub mod engine;
pub mod error;
pub mod http;
pub mod lister;

pub use engine::{DiscoveryConfig, DiscoveryEngine};
pub use error::{Error, Result};
pub use http::HttpModelLister;
pub use lister::{ListError, ModelLister};
