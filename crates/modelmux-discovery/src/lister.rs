//! Transport seam for provider model listings.

use async_trait::async_trait;
use modelmux_model::{ModelDescriptor, ProviderDescriptor};

/// Failure modes of a single remote model listing.
///
/// These never reach discovery callers; the engine converts every variant
/// into a curated fallback.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed listing response: {0}")]
    Malformed(String),

    #[error("listing rejected: {0}")]
    Unauthorized(String),
}

/// Lists the models a provider currently exposes.
///
/// The wire protocol per provider is an external collaborator concern;
/// [`HttpModelLister`](crate::http::HttpModelLister) covers
/// OpenAI-compatible `/models` endpoints. Returned descriptors should carry
/// `ModelSource::Discovered`; the engine flags them regardless.
#[async_trait]
pub trait ModelLister: Send + Sync {
    async fn list_models(
        &self,
        provider: &ProviderDescriptor,
    ) -> Result<Vec<ModelDescriptor>, ListError>;
}
