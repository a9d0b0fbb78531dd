//! Model descriptor types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// Where a model descriptor came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// Listed by the provider's own discovery endpoint.
    Discovered,
    /// Curated static entry, used when discovery fails or never ran.
    #[default]
    CuratedFallback,
}

/// A model offered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model identifier (e.g. `"gpt-4.1-nano"`).
    pub id: String,
    /// Owning provider identifier.
    pub provider_id: String,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    /// Maximum context window size in tokens.
    pub context_length: u64,
    /// Blended cost metric ($ per million tokens), when known.
    #[serde(default)]
    pub cost_per_million_tokens: Option<f64>,
    #[serde(default)]
    pub source: ModelSource,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        provider_id: impl Into<String>,
        context_length: u64,
    ) -> Self {
        Self {
            id: id.into(),
            provider_id: provider_id.into(),
            capabilities: BTreeSet::new(),
            context_length,
            cost_per_million_tokens: None,
            source: ModelSource::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn with_cost(mut self, cost_per_million_tokens: f64) -> Self {
        self.cost_per_million_tokens = Some(cost_per_million_tokens);
        self
    }

    pub fn with_source(mut self, source: ModelSource) -> Self {
        self.source = source;
        self
    }

    /// Whether this model covers every capability in `required`.
    pub fn covers(&self, required: &BTreeSet<Capability>) -> bool {
        required.is_subset(&self.capabilities)
    }
}
