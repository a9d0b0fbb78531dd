//! The core registry: provider descriptors and curated fallback lists.

use std::collections::HashMap;
use std::sync::Arc;

use modelmux_model::{
    KeyValueStore, ModelDescriptor, ProviderCategory, ProviderDescriptor, StoreError,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

const STORE_PREFIX: &str = "provider/";

/// A registration as persisted: the descriptor plus its curated models.
///
/// `sequence` preserves registration order across a reload; store keys
/// come back lexicographically, which is not the order providers were
/// registered in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRegistration {
    descriptor: ProviderDescriptor,
    #[serde(default)]
    curated_models: Vec<ModelDescriptor>,
    #[serde(default)]
    sequence: u64,
}

struct Inner {
    /// Provider ids in registration order. Listing order is stable.
    order: Vec<String>,
    entries: HashMap<String, StoredRegistration>,
}

/// Central catalog of provider descriptors.
///
/// Read-mostly after bootstrap: reads take a shared lock, registration takes
/// a short exclusive lock. Pass by `Arc` into the validator, discovery
/// engine, health monitor, and profile manager — there is no process-wide
/// singleton, so tests can run isolated instances.
pub struct ProviderRegistry {
    inner: RwLock<Inner>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").finish_non_exhaustive()
    }
}

impl ProviderRegistry {
    /// Create an empty, non-persistent registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                order: Vec::new(),
                entries: HashMap::new(),
            }),
            store: None,
        }
    }

    /// Create a registry backed by `store`, loading any previously persisted
    /// registrations. Subsequent registrations are saved on write.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let mut loaded = Vec::new();

        for key in store.list(STORE_PREFIX)? {
            let Some(blob) = store.get(&key)? else {
                continue;
            };
            let registration: StoredRegistration = serde_json::from_str(&blob)
                .map_err(|source| StoreError::Corrupt { key, source })?;
            debug!(provider = %registration.descriptor.id, "loaded persisted provider registration");
            loaded.push(registration);
        }

        // Store keys list lexicographically; restore registration order.
        loaded.sort_by_key(|registration| registration.sequence);

        let mut order = Vec::new();
        let mut entries = HashMap::new();
        for registration in loaded {
            let id = registration.descriptor.id.clone();
            order.push(id.clone());
            entries.insert(id, registration);
        }

        Ok(Self {
            inner: RwLock::new(Inner { order, entries }),
            store: Some(store),
        })
    }

    /// Register a provider with no curated fallback models.
    pub fn register(&self, descriptor: ProviderDescriptor) -> Result<()> {
        self.register_with_curated(descriptor, Vec::new())
    }

    /// Register a provider along with the curated model list the discovery
    /// engine falls back to when remote listing fails.
    pub fn register_with_curated(
        &self,
        descriptor: ProviderDescriptor,
        curated_models: Vec<ModelDescriptor>,
    ) -> Result<()> {
        let id = descriptor.id.clone();
        let category = descriptor.category;

        {
            let mut inner = self.inner.write();
            if inner.entries.contains_key(&id) {
                return Err(Error::DuplicateProvider(id));
            }
            let registration = StoredRegistration {
                descriptor,
                curated_models,
                sequence: inner.order.len() as u64,
            };

            if let Some(store) = &self.store {
                let blob = serde_json::to_string(&registration)?;
                store.put(&format!("{STORE_PREFIX}{id}"), &blob)?;
            }

            inner.order.push(id.clone());
            inner.entries.insert(id.clone(), registration);
        }

        info!(provider = %id, category = ?category, "registered provider");
        Ok(())
    }

    /// Look up a provider descriptor by id.
    pub fn get(&self, id: &str) -> Result<ProviderDescriptor> {
        self.inner
            .read()
            .entries
            .get(id)
            .map(|entry| entry.descriptor.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Whether a provider id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().entries.contains_key(id)
    }

    /// List descriptors in registration order.
    ///
    /// `llm_only` excludes `NonLlm` descriptors unconditionally; this is a
    /// contract of the registry, not a downstream display filter. An
    /// explicit `category` narrows further.
    pub fn list(&self, category: Option<ProviderCategory>, llm_only: bool) -> Vec<ProviderDescriptor> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .map(|entry| &entry.descriptor)
            .filter(|descriptor| !llm_only || descriptor.is_llm())
            .filter(|descriptor| category.is_none_or(|c| descriptor.category == c))
            .cloned()
            .collect()
    }

    /// The curated fallback model list for a provider (possibly empty).
    pub fn curated_models(&self, id: &str) -> Result<Vec<ModelDescriptor>> {
        self.inner
            .read()
            .entries
            .get(id)
            .map(|entry| entry.curated_models.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
