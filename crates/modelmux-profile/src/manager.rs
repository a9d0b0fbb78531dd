//! The profile manager: CRUD, activation, validation.

use std::collections::HashMap;
use std::sync::Arc;

use modelmux_model::{CatalogReader, KeyValueStore, ModelDescriptor, StoreError, UseCase};
use modelmux_registry::ProviderRegistry;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::profile::Profile;
use crate::validate::{CompatibilityWarning, ValidationError, ValidationReport};

const STORE_PREFIX: &str = "profile/";
const ACTIVE_KEY: &str = "active_profile";

struct Inner {
    /// Profile ids in creation order. Listing order is stable.
    order: Vec<String>,
    profiles: HashMap<String, Profile>,
    active: Option<String>,
}

/// CRUD over named routing profiles with the exactly-one-active invariant.
///
/// Profiles persist as JSON blobs through the attached store
/// (save-on-write); the manager loads them once at construction and serves
/// reads from memory afterwards.
pub struct ProfileManager {
    store: Arc<dyn KeyValueStore>,
    registry: Arc<ProviderRegistry>,
    catalog: Arc<dyn CatalogReader>,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for ProfileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileManager").finish_non_exhaustive()
    }
}

impl ProfileManager {
    /// Load persisted profiles (and the active pointer) from `store`.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        registry: Arc<ProviderRegistry>,
        catalog: Arc<dyn CatalogReader>,
    ) -> Result<Self> {
        let mut order = Vec::new();
        let mut profiles = HashMap::new();

        for key in store.list(STORE_PREFIX)? {
            let Some(blob) = store.get(&key)? else {
                continue;
            };
            let profile: Profile = serde_json::from_str(&blob)
                .map_err(|source| StoreError::Corrupt { key, source })?;
            debug!(profile = %profile.id, "loaded persisted profile");
            order.push(profile.id.clone());
            profiles.insert(profile.id.clone(), profile);
        }

        // A dangling active pointer (profile deleted out from under us by
        // another writer) degrades to no active profile.
        let active = store
            .get(ACTIVE_KEY)?
            .filter(|id| profiles.contains_key(id));

        Ok(Self {
            store,
            registry,
            catalog,
            inner: RwLock::new(Inner {
                order,
                profiles,
                active,
            }),
        })
    }

    /// Create a new profile. Fails on a duplicate id.
    pub fn create(&self, profile: Profile) -> Result<()> {
        let id = profile.id.clone();
        let blob = serde_json::to_string(&profile)?;

        // Store first: a failed put must leave memory matching persisted
        // state, not ahead of it.
        {
            let mut inner = self.inner.write();
            if inner.profiles.contains_key(&id) {
                return Err(Error::DuplicateProfile(id));
            }
            self.store.put(&format!("{STORE_PREFIX}{id}"), &blob)?;
            inner.order.push(id.clone());
            inner.profiles.insert(id.clone(), profile);
        }

        info!(profile = %id, "created profile");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Profile> {
        self.inner
            .read()
            .profiles
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Replace an existing profile (keyed by `profile.id`).
    pub fn update(&self, profile: Profile) -> Result<()> {
        let id = profile.id.clone();
        let blob = serde_json::to_string(&profile)?;

        {
            let mut inner = self.inner.write();
            if !inner.profiles.contains_key(&id) {
                return Err(Error::NotFound(id));
            }
            self.store.put(&format!("{STORE_PREFIX}{id}"), &blob)?;
            inner.profiles.insert(id.clone(), profile);
        }

        info!(profile = %id, "updated profile");
        Ok(())
    }

    /// Delete a profile. Refused for the active profile — activate another
    /// one first; the store is left unchanged.
    pub fn delete(&self, id: &str) -> Result<()> {
        {
            let mut inner = self.inner.write();
            if !inner.profiles.contains_key(id) {
                return Err(Error::NotFound(id.to_string()));
            }
            if inner.active.as_deref() == Some(id) {
                return Err(Error::CannotDeleteActiveProfile(id.to_string()));
            }
            self.store.remove(&format!("{STORE_PREFIX}{id}"))?;
            inner.profiles.remove(id);
            inner.order.retain(|existing| existing != id);
        }

        info!(profile = %id, "deleted profile");
        Ok(())
    }

    /// Profiles in creation order.
    pub fn list(&self) -> Vec<Profile> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.profiles.get(id))
            .cloned()
            .collect()
    }

    /// Make `id` the single active profile, deactivating any previous one
    /// in the same swap.
    pub fn activate(&self, id: &str) -> Result<()> {
        {
            let mut inner = self.inner.write();
            if !inner.profiles.contains_key(id) {
                return Err(Error::NotFound(id.to_string()));
            }
            self.store.put(ACTIVE_KEY, id)?;
            inner.active = Some(id.to_string());
        }

        info!(profile = %id, "activated profile");
        Ok(())
    }

    /// The active profile, if any.
    pub fn get_active(&self) -> Option<Profile> {
        let inner = self.inner.read();
        inner
            .active
            .as_ref()
            .and_then(|id| inner.profiles.get(id))
            .cloned()
    }

    /// Check every provider/model reference and compatibility constraint.
    ///
    /// Dangling references are errors; capability and context-budget
    /// mismatches are warnings. Nothing here throws — callers decide what
    /// severity to enforce.
    pub fn validate(&self, profile: &Profile) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (&use_case, preferences) in &profile.preferences {
            for preference in preferences {
                if !self.registry.contains(&preference.provider_id) {
                    report.errors.push(ValidationError::UnknownProvider {
                        use_case,
                        provider_id: preference.provider_id.clone(),
                    });
                    continue;
                }

                let Some(model) = self.lookup_model(&preference.provider_id, &preference.model_id)
                else {
                    report.errors.push(ValidationError::UnknownModel {
                        use_case,
                        provider_id: preference.provider_id.clone(),
                        model_id: preference.model_id.clone(),
                    });
                    continue;
                };

                for &capability in &preference.required_capabilities {
                    if !model.capabilities.contains(&capability) {
                        report.warnings.push(CompatibilityWarning::MissingCapability {
                            use_case,
                            provider_id: preference.provider_id.clone(),
                            model_id: preference.model_id.clone(),
                            capability,
                        });
                    }
                }
            }
        }

        // The memory budget must fit the tightest chat model, or sessions
        // will assemble context the model cannot take.
        let smallest_chat = profile
            .preferences
            .get(&UseCase::Chat)
            .into_iter()
            .flatten()
            .filter_map(|p| self.lookup_model(&p.provider_id, &p.model_id))
            .min_by_key(|model| model.context_length);

        if let Some(model) = smallest_chat
            && profile.memory_budget.max_context_length > model.context_length
        {
            report.warnings.push(CompatibilityWarning::ContextBudgetExceeded {
                budget: profile.memory_budget.max_context_length,
                smallest: model.context_length,
                provider_id: model.provider_id,
                model_id: model.id,
            });
        }

        report
    }

    /// Catalog first (discovered state), curated registration second — a
    /// profile written before discovery ran should still validate.
    fn lookup_model(&self, provider_id: &str, model_id: &str) -> Option<ModelDescriptor> {
        self.catalog.model(provider_id, model_id).or_else(|| {
            self.registry
                .curated_models(provider_id)
                .ok()?
                .into_iter()
                .find(|model| model.id == model_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use std::sync::atomic::{AtomicBool, Ordering};

    use modelmux_model::{
        Capability, CatalogReader, KeyValueStore, MemoryStore, ModelDescriptor, ProviderCategory,
        ProviderDescriptor, StoreError, UseCase,
    };
    use modelmux_registry::ProviderRegistry;

    use super::ProfileManager;
    use crate::error::Error;
    use crate::profile::{Preference, Profile, RouterPolicy};
    use crate::validate::{CompatibilityWarning, ValidationError};

    /// Store stub whose writes can be made to fail mid-test.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn fail_writes(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn write_error() -> StoreError {
            StoreError::backend(std::io::Error::other("disk full"))
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Self::write_error());
            }
            self.inner.put(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Self::write_error());
            }
            self.inner.remove(key)
        }

        fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
            self.inner.list(prefix)
        }
    }

    /// Catalog stub backed by a fixed model list.
    struct FixedCatalog(Vec<ModelDescriptor>);

    impl CatalogReader for FixedCatalog {
        fn models(&self, provider_id: &str) -> Vec<ModelDescriptor> {
            self.0
                .iter()
                .filter(|model| model.provider_id == provider_id)
                .cloned()
                .collect()
        }
    }

    fn manager_with(models: Vec<ModelDescriptor>) -> ProfileManager {
        let registry = Arc::new(ProviderRegistry::new());
        for provider_id in ["openai", "ollama"] {
            registry
                .register(ProviderDescriptor::new(
                    provider_id,
                    provider_id,
                    ProviderCategory::LlmRemote,
                ))
                .unwrap();
        }
        ProfileManager::load(
            Arc::new(MemoryStore::new()),
            registry,
            Arc::new(FixedCatalog(models)),
        )
        .unwrap()
    }

    fn chat_profile(id: &str) -> Profile {
        Profile::new(id, id.to_uppercase(), RouterPolicy::Balanced)
            .prefer(UseCase::Chat, [Preference::new("openai", "gpt-4.1-nano", 10)])
    }

    #[test]
    fn create_rejects_duplicate_ids() {
        let manager = manager_with(vec![]);
        manager.create(chat_profile("default")).unwrap();

        let err = manager.create(chat_profile("default")).unwrap_err();
        assert!(matches!(err, Error::DuplicateProfile(id) if id == "default"));
    }

    #[test]
    fn activation_swaps_exactly_one_active_profile() {
        let manager = manager_with(vec![]);
        manager.create(chat_profile("a")).unwrap();
        manager.create(chat_profile("b")).unwrap();

        assert!(manager.get_active().is_none());

        manager.activate("a").unwrap();
        assert_eq!(manager.get_active().unwrap().id, "a");

        manager.activate("b").unwrap();
        assert_eq!(manager.get_active().unwrap().id, "b");

        let active_count = manager
            .list()
            .iter()
            .filter(|profile| manager.get_active().is_some_and(|a| a.id == profile.id))
            .count();
        assert_eq!(active_count, 1);
    }

    #[test]
    fn deleting_the_active_profile_is_refused_and_leaves_state() {
        let manager = manager_with(vec![]);
        manager.create(chat_profile("a")).unwrap();
        manager.activate("a").unwrap();

        let err = manager.delete("a").unwrap_err();
        assert!(matches!(err, Error::CannotDeleteActiveProfile(id) if id == "a"));
        assert!(manager.get("a").is_ok());
        assert_eq!(manager.get_active().unwrap().id, "a");

        // After activating another profile, the old one deletes fine.
        manager.create(chat_profile("b")).unwrap();
        manager.activate("b").unwrap();
        manager.delete("a").unwrap();
        assert!(manager.get("a").is_err());
    }

    #[test]
    fn profiles_and_active_pointer_survive_reload() {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register(ProviderDescriptor::new(
                "openai",
                "OpenAI",
                ProviderCategory::LlmRemote,
            ))
            .unwrap();
        let catalog = Arc::new(FixedCatalog(vec![]));

        {
            let manager =
                ProfileManager::load(store.clone(), registry.clone(), catalog.clone()).unwrap();
            manager.create(chat_profile("default")).unwrap();
            manager.activate("default").unwrap();
        }

        let reloaded = ProfileManager::load(store, registry, catalog).unwrap();
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.get_active().unwrap().id, "default");
    }

    #[test]
    fn failed_store_write_leaves_memory_unchanged() {
        let store = Arc::new(FlakyStore::default());
        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register(ProviderDescriptor::new(
                "openai",
                "OpenAI",
                ProviderCategory::LlmRemote,
            ))
            .unwrap();
        let manager = ProfileManager::load(
            store.clone(),
            registry,
            Arc::new(FixedCatalog(vec![])),
        )
        .unwrap();

        manager.create(chat_profile("a")).unwrap();
        manager.create(chat_profile("b")).unwrap();
        manager.activate("a").unwrap();

        store.fail_writes();

        assert!(matches!(manager.create(chat_profile("c")), Err(Error::Store(_))));
        assert!(matches!(manager.get("c"), Err(Error::NotFound(_))));
        assert_eq!(manager.list().len(), 2);

        assert!(matches!(manager.activate("b"), Err(Error::Store(_))));
        assert_eq!(manager.get_active().unwrap().id, "a");

        assert!(matches!(manager.delete("b"), Err(Error::Store(_))));
        assert!(manager.get("b").is_ok());

        let renamed = Profile::new("b", "Renamed", RouterPolicy::Balanced);
        assert!(matches!(manager.update(renamed), Err(Error::Store(_))));
        assert_eq!(manager.get("b").unwrap().name, "B");
    }

    #[test]
    fn corrupt_stored_profile_names_the_key() {
        let store = Arc::new(MemoryStore::new());
        store.put("profile/broken", "not json").unwrap();

        let err = ProfileManager::load(
            store,
            Arc::new(ProviderRegistry::new()),
            Arc::new(FixedCatalog(vec![])),
        )
        .unwrap_err();
        assert!(err.to_string().contains("profile/broken"));
    }

    #[test]
    fn validate_flags_dangling_references_as_errors() {
        let manager = manager_with(vec![]);
        let profile = Profile::new("p", "P", RouterPolicy::Balanced).prefer(
            UseCase::Chat,
            [
                Preference::new("nonexistent", "m", 10),
                Preference::new("openai", "ghost-model", 5),
            ],
        );

        let report = manager.validate(&profile);
        assert!(!report.is_ok());
        assert!(report.errors.iter().any(|e| matches!(
            e,
            ValidationError::UnknownProvider { provider_id, .. } if provider_id == "nonexistent"
        )));
        assert!(report.errors.iter().any(|e| matches!(
            e,
            ValidationError::UnknownModel { model_id, .. } if model_id == "ghost-model"
        )));
    }

    #[test]
    fn validate_warns_on_capability_and_context_mismatches() {
        let manager = manager_with(vec![
            ModelDescriptor::new("gpt-4.1-nano", "openai", 16_000),
            ModelDescriptor::new("llama", "ollama", 4_096),
        ]);

        let mut profile = Profile::new("p", "P", RouterPolicy::Balanced).prefer(
            UseCase::Chat,
            [
                Preference::new("openai", "gpt-4.1-nano", 10).require([Capability::Vision]),
                Preference::new("ollama", "llama", 5),
            ],
        );
        profile.memory_budget.max_context_length = 8_192;

        let report = manager.validate(&profile);
        assert!(report.is_ok(), "warnings are non-fatal");
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            CompatibilityWarning::MissingCapability { capability, .. }
                if *capability == Capability::Vision
        )));
        // Budget 8192 exceeds the smallest chat context (llama at 4096).
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            CompatibilityWarning::ContextBudgetExceeded { smallest, .. } if *smallest == 4_096
        )));
    }

    #[test]
    fn validate_accepts_curated_models_before_discovery() {
        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register_with_curated(
                ProviderDescriptor::new("openai", "OpenAI", ProviderCategory::LlmRemote),
                vec![ModelDescriptor::new("gpt-4.1-nano", "openai", 128_000)],
            )
            .unwrap();
        let manager = ProfileManager::load(
            Arc::new(MemoryStore::new()),
            registry,
            Arc::new(FixedCatalog(vec![])),
        )
        .unwrap();

        let report = manager.validate(&chat_profile("p"));
        assert!(report.is_clean());
    }
}
