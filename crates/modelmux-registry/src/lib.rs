//! # modelmux-registry
//!
//! The provider registry: an admin-managed catalog of provider descriptors
//! and their curated fallback model lists.
//!
//! - **Register providers** once at bootstrap (or through the admin
//!   surface); descriptors are immutable afterwards.
//! - **List providers** in stable insertion order. `llm_only` listing
//!   hard-excludes `NonLlm` descriptors at the registry contract level, so
//!   no consumer can accidentally present a non-model integration as a
//!   selectable model.
//! - **Persist registrations** through an attached
//!   [`KeyValueStore`](modelmux_model::KeyValueStore): load-at-start,
//!   save-on-write.
//!
//! # Quick start
//!
//! ```ignore
//! use modelmux_model::{Capability, ProviderCategory, ProviderDescriptor};
//! use modelmux_registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! registry.register(
//!     ProviderDescriptor::new("openai", "OpenAI", ProviderCategory::LlmRemote)
//!         .with_endpoint("https://api.openai.com/v1")
//!         .with_capabilities([Capability::Streaming, Capability::Vision]),
//! )?;
//!
//! let llm_providers = registry.list(None, true);
//! ```

pub mod error;
pub mod registry;

pub use error::{Error, Result};
pub use registry::ProviderRegistry;
