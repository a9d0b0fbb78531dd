//! # modelmux-model
//!
//! Shared domain types for the modelmux access layer: provider and model
//! descriptors, capability sets, health snapshots, and the trait seams the
//! other crates meet at ([`CatalogReader`] for read-only model lookup,
//! [`KeyValueStore`] for durable persistence).
//!
//! This crate holds no behavior beyond the types themselves, so every other
//! crate in the workspace can depend on it without pulling in transports,
//! caches, or runtimes.

pub mod capability;
pub mod catalog;
pub mod error;
pub mod health;
pub mod model;
pub mod provider;
pub mod store;
pub mod use_case;

pub use capability::Capability;
pub use catalog::CatalogReader;
pub use error::StoreError;
pub use health::{HealthStatus, ProviderHealth};
pub use model::{ModelDescriptor, ModelSource};
pub use provider::{CredentialRequirement, ProviderCategory, ProviderDescriptor};
pub use store::{KeyValueStore, MemoryStore};
pub use use_case::UseCase;
