//! Read-only model lookup seam.

use crate::model::ModelDescriptor;

/// Read-only view over the cached model catalog.
///
/// Implemented by the discovery engine; consumed by profile validation and
/// the router. Implementations must answer from already-cached state and
/// never block on a remote call.
pub trait CatalogReader: Send + Sync {
    /// All cached models for a provider, empty if none were discovered yet.
    fn models(&self, provider_id: &str) -> Vec<ModelDescriptor>;

    /// A single cached model, if present.
    fn model(&self, provider_id: &str, model_id: &str) -> Option<ModelDescriptor> {
        self.models(provider_id)
            .into_iter()
            .find(|model| model.id == model_id)
    }
}
