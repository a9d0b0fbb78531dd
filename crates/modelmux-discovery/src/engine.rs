//! The discovery engine: TTL cache, single-flight, curated fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use futures::stream::{self, StreamExt};
use modelmux_model::{CatalogReader, ModelDescriptor, ModelSource, ProviderDescriptor};
use modelmux_registry::ProviderRegistry;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::lister::ModelLister;

/// Tunables for the discovery engine.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// How long a successful (or fallback) listing stays fresh.
    pub ttl: Duration,
    /// Deadline for one remote listing; expiry counts as failure.
    pub timeout: Duration,
    /// Concurrent provider limit for [`DiscoveryEngine::discover_all`].
    pub fanout_limit: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            timeout: Duration::from_secs(10),
            fanout_limit: 8,
        }
    }
}

type FlightFuture = Shared<BoxFuture<'static, Vec<ModelDescriptor>>>;

#[derive(Default)]
struct ProviderCache {
    cached: Option<CachedModels>,
    /// In-flight marker: concurrent callers for the same provider await
    /// this instead of issuing a second remote call. Cleared on completion,
    /// success or failure.
    in_flight: Option<FlightFuture>,
}

struct CachedModels {
    models: Vec<ModelDescriptor>,
    expires_at: Instant,
}

type Cache = Arc<Mutex<HashMap<String, ProviderCache>>>;

/// Discovers and caches the models each provider exposes.
///
/// The cache is the workspace's model catalog: the engine implements
/// [`CatalogReader`] over it, answering profile validation and routing
/// lookups without remote calls.
pub struct DiscoveryEngine {
    registry: Arc<ProviderRegistry>,
    lister: Arc<dyn ModelLister>,
    cache: Cache,
    config: DiscoveryConfig,
}

impl DiscoveryEngine {
    pub fn new(registry: Arc<ProviderRegistry>, lister: Arc<dyn ModelLister>) -> Self {
        Self::with_config(registry, lister, DiscoveryConfig::default())
    }

    pub fn with_config(
        registry: Arc<ProviderRegistry>,
        lister: Arc<dyn ModelLister>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            registry,
            lister,
            cache: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// List a provider's models, from cache while fresh.
    ///
    /// Fails only for an unregistered provider. Remote listing failures
    /// degrade to curated fallback: the prior cache entry re-flagged
    /// [`ModelSource::CuratedFallback`], or the registry's curated list
    /// when nothing was cached yet.
    pub async fn discover(
        &self,
        provider_id: &str,
        force_refresh: bool,
    ) -> Result<Vec<ModelDescriptor>> {
        let descriptor = self.registry.get(provider_id)?;
        let curated = self.registry.curated_models(provider_id)?;

        let flight = {
            let mut cache = self.cache.lock();
            let entry = cache.entry(provider_id.to_string()).or_default();

            if !force_refresh
                && let Some(cached) = &entry.cached
                && cached.expires_at > Instant::now()
            {
                debug!(provider = provider_id, "discovery cache hit");
                return Ok(cached.models.clone());
            }

            match &entry.in_flight {
                Some(flight) => {
                    debug!(provider = provider_id, "joining in-flight discovery");
                    flight.clone()
                }
                None => {
                    let prior = entry.cached.as_ref().map(|c| c.models.clone());
                    let flight = run_discovery(
                        Arc::clone(&self.lister),
                        descriptor,
                        prior,
                        curated,
                        Arc::clone(&self.cache),
                        self.config.clone(),
                    )
                    .boxed()
                    .shared();
                    entry.in_flight = Some(flight.clone());
                    flight
                }
            }
        };

        Ok(flight.await)
    }

    /// Discover every registered LLM provider, bounded-concurrently.
    ///
    /// One provider's failure never blocks or fails the others; per
    /// [`discover`](Self::discover), failures surface as curated fallback
    /// lists rather than errors.
    pub async fn discover_all(&self) -> HashMap<String, Vec<ModelDescriptor>> {
        self.fan_out(false).await
    }

    /// Like [`discover_all`](Self::discover_all), ignoring cached entries.
    pub async fn refresh_all(&self) -> HashMap<String, Vec<ModelDescriptor>> {
        self.fan_out(true).await
    }

    async fn fan_out(&self, force_refresh: bool) -> HashMap<String, Vec<ModelDescriptor>> {
        let providers = self.registry.list(None, true);
        stream::iter(providers)
            .map(|descriptor| async move {
                let models = match self.discover(&descriptor.id, force_refresh).await {
                    Ok(models) => models,
                    Err(err) => {
                        // Unregistered mid-flight; skip with an empty list.
                        warn!(provider = %descriptor.id, error = %err, "discovery skipped");
                        Vec::new()
                    }
                };
                (descriptor.id, models)
            })
            .buffer_unordered(self.config.fanout_limit)
            .collect()
            .await
    }
}

impl CatalogReader for DiscoveryEngine {
    fn models(&self, provider_id: &str) -> Vec<ModelDescriptor> {
        self.cache
            .lock()
            .get(provider_id)
            .and_then(|entry| entry.cached.as_ref())
            .map(|cached| cached.models.clone())
            .unwrap_or_default()
    }
}

/// The single remote listing behind an in-flight marker. Owns everything it
/// touches so the future is `'static` and shareable between callers.
async fn run_discovery(
    lister: Arc<dyn ModelLister>,
    descriptor: ProviderDescriptor,
    prior: Option<Vec<ModelDescriptor>>,
    curated: Vec<ModelDescriptor>,
    cache: Cache,
    config: DiscoveryConfig,
) -> Vec<ModelDescriptor> {
    let provider_id = descriptor.id.clone();

    let listed = tokio::time::timeout(config.timeout, lister.list_models(&descriptor)).await;
    let models: Vec<ModelDescriptor> = match listed {
        Ok(Ok(models)) => {
            debug!(provider = %provider_id, count = models.len(), "discovery succeeded");
            models
                .into_iter()
                .map(|model| model.with_source(ModelSource::Discovered))
                .collect()
        }
        Ok(Err(err)) => {
            warn!(provider = %provider_id, error = %err, "discovery failed, using fallback");
            fallback_models(prior, curated)
        }
        Err(_) => {
            warn!(provider = %provider_id, timeout = ?config.timeout, "discovery timed out, using fallback");
            fallback_models(prior, curated)
        }
    };

    let mut cache = cache.lock();
    let entry = cache.entry(provider_id).or_default();
    entry.cached = Some(CachedModels {
        models: models.clone(),
        expires_at: Instant::now() + config.ttl,
    });
    entry.in_flight = None;

    models
}

/// Prior entries survive a failed refresh, re-flagged as fallback; with no
/// prior listing the curated list ships as-is.
fn fallback_models(
    prior: Option<Vec<ModelDescriptor>>,
    curated: Vec<ModelDescriptor>,
) -> Vec<ModelDescriptor> {
    match prior {
        Some(models) if !models.is_empty() => models
            .into_iter()
            .map(|model| model.with_source(ModelSource::CuratedFallback))
            .collect(),
        _ => curated
            .into_iter()
            .map(|model| model.with_source(ModelSource::CuratedFallback))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use modelmux_model::{
        CatalogReader, ModelDescriptor, ModelSource, ProviderCategory, ProviderDescriptor,
    };
    use modelmux_registry::ProviderRegistry;

    use super::{DiscoveryConfig, DiscoveryEngine};
    use crate::lister::{ListError, ModelLister};

    /// Lister stub: counts calls, answers from a per-call script, and can
    /// hold each call open for a while.
    type Script =
        Box<dyn Fn(usize, &str) -> Result<Vec<ModelDescriptor>, ListError> + Send + Sync>;

    struct ScriptedLister {
        calls: AtomicUsize,
        delay: Duration,
        script: Script,
    }

    impl ScriptedLister {
        fn new(
            script: impl Fn(usize, &str) -> Result<Vec<ModelDescriptor>, ListError>
            + Send
            + Sync
            + 'static,
        ) -> Arc<Self> {
            Self::with_delay(Duration::ZERO, script)
        }

        fn with_delay(
            delay: Duration,
            script: impl Fn(usize, &str) -> Result<Vec<ModelDescriptor>, ListError>
            + Send
            + Sync
            + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                script: Box::new(script),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelLister for ScriptedLister {
        async fn list_models(
            &self,
            provider: &ProviderDescriptor,
        ) -> Result<Vec<ModelDescriptor>, ListError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.script)(call, &provider.id)
        }
    }

    fn registry_with_remote() -> Arc<ProviderRegistry> {
        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register_with_curated(
                ProviderDescriptor::new("remote", "Remote", ProviderCategory::LlmRemote)
                    .with_endpoint("https://api.example.com/v1"),
                vec![ModelDescriptor::new("remote-fallback", "remote", 8_192)],
            )
            .unwrap();
        registry
    }

    fn discovered(id: &str) -> ModelDescriptor {
        ModelDescriptor::new(id, "remote", 128_000)
    }

    #[tokio::test]
    async fn second_discover_within_ttl_hits_cache() {
        let lister = ScriptedLister::new(|_, _| Ok(vec![discovered("m1")]));
        let engine = DiscoveryEngine::new(registry_with_remote(), lister.clone());

        let first = engine.discover("remote", false).await.unwrap();
        let second = engine.discover("remote", false).await.unwrap();

        assert_eq!(lister.calls(), 1);
        assert_eq!(first[0].id, "m1");
        assert_eq!(first[0].source, ModelSource::Discovered);
        assert_eq!(second[0].id, "m1");
    }

    #[tokio::test]
    async fn force_refresh_bypasses_cache() {
        let lister = ScriptedLister::new(|_, _| Ok(vec![discovered("m1")]));
        let engine = DiscoveryEngine::new(registry_with_remote(), lister.clone());

        engine.discover("remote", false).await.unwrap();
        engine.discover("remote", true).await.unwrap();

        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let lister = ScriptedLister::new(|_, _| Ok(vec![discovered("m1")]));
        let engine = DiscoveryEngine::with_config(
            registry_with_remote(),
            lister.clone(),
            DiscoveryConfig {
                ttl: Duration::ZERO,
                ..DiscoveryConfig::default()
            },
        );

        engine.discover("remote", false).await.unwrap();
        engine.discover("remote", false).await.unwrap();

        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_discovery_is_single_flight() {
        let lister =
            ScriptedLister::with_delay(Duration::from_millis(50), |_, _| Ok(vec![discovered("m1")]));
        let engine = Arc::new(DiscoveryEngine::new(registry_with_remote(), lister.clone()));

        let a = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.discover("remote", false).await.unwrap() }
        });
        let b = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.discover("remote", false).await.unwrap() }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(lister.calls(), 1);
        assert_eq!(a[0].id, b[0].id);
    }

    #[tokio::test]
    async fn failure_without_prior_cache_yields_curated_fallback() {
        let lister = ScriptedLister::new(|_, _| Err(ListError::Transport("refused".to_string())));
        let engine = DiscoveryEngine::new(registry_with_remote(), lister.clone());

        let models = engine.discover("remote", false).await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "remote-fallback");
        assert_eq!(models[0].source, ModelSource::CuratedFallback);
    }

    #[tokio::test]
    async fn failed_refresh_retains_prior_models_reflagged() {
        let lister = ScriptedLister::new(|call, _| {
            if call == 0 {
                Ok(vec![discovered("m1"), discovered("m2")])
            } else {
                Err(ListError::Malformed("not json".to_string()))
            }
        });
        let engine = DiscoveryEngine::new(registry_with_remote(), lister.clone());

        let first = engine.discover("remote", false).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|m| m.source == ModelSource::Discovered));

        let second = engine.discover("remote", true).await.unwrap();
        let ids: Vec<_> = second.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert!(second.iter().all(|m| m.source == ModelSource::CuratedFallback));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_failure() {
        let lister =
            ScriptedLister::with_delay(Duration::from_secs(60), |_, _| Ok(vec![discovered("m1")]));
        let engine = DiscoveryEngine::with_config(
            registry_with_remote(),
            lister.clone(),
            DiscoveryConfig {
                timeout: Duration::from_secs(1),
                ..DiscoveryConfig::default()
            },
        );

        let models = engine.discover("remote", false).await.unwrap();
        assert_eq!(models[0].id, "remote-fallback");
        assert_eq!(models[0].source, ModelSource::CuratedFallback);
    }

    #[tokio::test]
    async fn discover_all_isolates_per_provider_failures() {
        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register_with_curated(
                ProviderDescriptor::new("good", "Good", ProviderCategory::LlmRemote),
                vec![],
            )
            .unwrap();
        registry
            .register_with_curated(
                ProviderDescriptor::new("bad", "Bad", ProviderCategory::LlmRemote),
                vec![ModelDescriptor::new("bad-fallback", "bad", 4_096)],
            )
            .unwrap();
        registry
            .register(ProviderDescriptor::new(
                "search",
                "Search",
                ProviderCategory::NonLlm,
            ))
            .unwrap();

        let lister = ScriptedLister::new(|_, provider| {
            if provider == "good" {
                Ok(vec![ModelDescriptor::new("good-model", "good", 32_000)])
            } else {
                Err(ListError::Transport("down".to_string()))
            }
        });
        let engine = DiscoveryEngine::new(registry, lister);

        let all = engine.discover_all().await;
        assert_eq!(all.len(), 2, "NonLlm providers are not discovered");
        assert_eq!(all["good"][0].id, "good-model");
        assert_eq!(all["bad"][0].id, "bad-fallback");
        assert_eq!(all["bad"][0].source, ModelSource::CuratedFallback);
    }

    #[tokio::test]
    async fn catalog_reader_answers_from_cache_only() {
        let lister = ScriptedLister::new(|_, _| Ok(vec![discovered("m1")]));
        let engine = DiscoveryEngine::new(registry_with_remote(), lister.clone());

        assert!(engine.models("remote").is_empty());

        engine.discover("remote", false).await.unwrap();
        assert_eq!(engine.models("remote")[0].id, "m1");
        assert!(engine.model("remote", "m1").is_some());
        assert_eq!(lister.calls(), 1);
    }
}
