//! Provider descriptor types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// What kind of backend a provider is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    /// Hosted model API reached over the network.
    LlmRemote,
    /// Mix of local and remote serving (e.g. local gateway with remote spill).
    LlmHybrid,
    /// Model served from the local machine.
    LlmLocal,
    /// Non-model integration (search, storage, ...). Never routable.
    NonLlm,
}

impl ProviderCategory {
    /// Whether providers of this category serve language models at all.
    pub fn is_llm(&self) -> bool {
        !matches!(self, ProviderCategory::NonLlm)
    }
}

/// Whether a provider needs a credential to be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialRequirement {
    /// Requests fail without a credential.
    Required,
    /// Works without a credential, typically with tighter rate limits.
    Optional,
    /// No credential concept at all (e.g. a local model server).
    #[default]
    None,
}

/// A registered backend capable of serving language-model requests.
///
/// Immutable after registration; owned by the provider registry. The
/// `endpoint` is the base URL template the discovery/credential/probe
/// collaborators talk to; the wire protocol behind it is their concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Unique provider identifier (e.g. `"openai"`, `"ollama"`).
    pub id: String,
    /// Human-friendly display name.
    pub name: String,
    pub category: ProviderCategory,
    #[serde(default)]
    pub credential: CredentialRequirement,
    /// Capabilities the provider supports across its models.
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    /// Base endpoint URL, if the provider is reachable over the network.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ProviderDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ProviderCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            credential: CredentialRequirement::default(),
            capabilities: BTreeSet::new(),
            endpoint: None,
        }
    }

    pub fn with_credential(mut self, requirement: CredentialRequirement) -> Self {
        self.credential = requirement;
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Whether this provider serves language models.
    pub fn is_llm(&self) -> bool {
        self.category.is_llm()
    }
}
