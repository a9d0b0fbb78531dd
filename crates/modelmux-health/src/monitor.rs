//! The health monitor: probes, state machine, outcome feedback.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use modelmux_model::{HealthStatus, ProviderHealth};
use modelmux_registry::ProviderRegistry;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::probe::Probe;

/// Consecutive failures at which a provider becomes `Unhealthy`.
const UNHEALTHY_THRESHOLD: u32 = 3;

/// Samples kept for the rolling latency average.
const LATENCY_WINDOW: usize = 16;

/// Tunables for the health monitor.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Deadline for one probe; expiry counts as a failure.
    pub probe_timeout: Duration,
    /// Concurrent probe limit for [`HealthMonitor::check_all`].
    pub sweep_limit: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            sweep_limit: 8,
        }
    }
}

/// Internal per-provider record. The snapshot type in `modelmux-model`
/// carries the last sample; the window behind the rolling average stays
/// here.
struct HealthRecord {
    status: HealthStatus,
    consecutive_failures: u32,
    checked_at: Option<SystemTime>,
    checked_instant: Option<Instant>,
    response_time_ms: Option<u64>,
    latency_window: VecDeque<u64>,
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self {
            status: HealthStatus::Unknown,
            consecutive_failures: 0,
            checked_at: None,
            checked_instant: None,
            response_time_ms: None,
            latency_window: VecDeque::with_capacity(LATENCY_WINDOW),
        }
    }
}

impl HealthRecord {
    fn apply(&mut self, provider_id: &str, success: bool, latency_ms: Option<u64>) {
        let previous = self.status;

        if success {
            self.status = HealthStatus::Healthy;
            self.consecutive_failures = 0;
            if let Some(latency) = latency_ms {
                self.response_time_ms = Some(latency);
                if self.latency_window.len() == LATENCY_WINDOW {
                    self.latency_window.pop_front();
                }
                self.latency_window.push_back(latency);
            }
        } else {
            self.consecutive_failures += 1;
            self.status = if self.consecutive_failures >= UNHEALTHY_THRESHOLD {
                HealthStatus::Unhealthy
            } else {
                HealthStatus::Degraded
            };
        }

        self.checked_at = Some(SystemTime::now());
        self.checked_instant = Some(Instant::now());

        if previous != self.status {
            info!(
                provider = provider_id,
                from = ?previous,
                to = ?self.status,
                failures = self.consecutive_failures,
                "provider health transition"
            );
        }
    }

    fn snapshot(&self, provider_id: &str) -> ProviderHealth {
        ProviderHealth {
            provider_id: provider_id.to_string(),
            status: self.status,
            checked_at: self.checked_at,
            response_time_ms: self.response_time_ms,
            consecutive_failures: self.consecutive_failures,
        }
    }
}

/// Tracks provider health from scheduled probes, on-demand checks, and
/// outcome reports.
///
/// The health table is a per-key concurrent map; the router and other
/// readers take snapshots, never locks that span a probe.
pub struct HealthMonitor {
    registry: Arc<ProviderRegistry>,
    probe: Arc<dyn Probe>,
    table: DashMap<String, HealthRecord>,
    config: HealthConfig,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ProviderRegistry>, probe: Arc<dyn Probe>) -> Self {
        Self::with_config(registry, probe, HealthConfig::default())
    }

    pub fn with_config(
        registry: Arc<ProviderRegistry>,
        probe: Arc<dyn Probe>,
        config: HealthConfig,
    ) -> Self {
        Self {
            registry,
            probe,
            table: DashMap::new(),
            config,
        }
    }

    /// Probe one provider now and apply the outcome.
    pub async fn check(&self, provider_id: &str) -> Result<ProviderHealth> {
        let descriptor = self.registry.get(provider_id)?;

        let started = Instant::now();
        let outcome =
            tokio::time::timeout(self.config.probe_timeout, self.probe.probe(&descriptor)).await;

        match outcome {
            Ok(Ok(())) => {
                let latency = started.elapsed().as_millis() as u64;
                debug!(provider = provider_id, latency_ms = latency, "probe succeeded");
                Ok(self.record(provider_id, true, Some(latency)))
            }
            Ok(Err(err)) => {
                warn!(provider = provider_id, error = %err, "probe failed");
                Ok(self.record(provider_id, false, None))
            }
            Err(_) => {
                warn!(
                    provider = provider_id,
                    timeout = ?self.config.probe_timeout,
                    "probe timed out"
                );
                Ok(self.record(provider_id, false, None))
            }
        }
    }

    /// Probe every registered provider with bounded concurrency.
    ///
    /// One unreachable provider cannot stall the sweep: probes run on a
    /// bounded worker pool and each carries its own timeout.
    pub async fn check_all(&self) -> Vec<ProviderHealth> {
        let providers = self.registry.list(None, false);
        stream::iter(providers)
            .map(|descriptor| async move {
                match self.check(&descriptor.id).await {
                    Ok(health) => Some(health),
                    Err(err) => {
                        // Unregistered mid-sweep.
                        warn!(provider = %descriptor.id, error = %err, "sweep probe skipped");
                        None
                    }
                }
            })
            .buffer_unordered(self.config.sweep_limit)
            .filter_map(|health| async move { health })
            .collect()
            .await
    }

    /// Feed the outcome of a real request into the state machine.
    ///
    /// Lets callers close the loop between scheduled sweeps: the layer that
    /// executes inference reports back here after every attempt.
    pub fn report_outcome(&self, provider_id: &str, success: bool, latency_ms: Option<u64>) {
        self.record(provider_id, success, latency_ms);
    }

    /// Current snapshot for a provider; `Unknown` if never sampled.
    pub fn health(&self, provider_id: &str) -> ProviderHealth {
        self.table
            .get(provider_id)
            .map(|record| record.snapshot(provider_id))
            .unwrap_or_else(|| ProviderHealth::unknown(provider_id))
    }

    /// Snapshots for every sampled provider.
    pub fn all_health(&self) -> Vec<ProviderHealth> {
        self.table
            .iter()
            .map(|entry| entry.value().snapshot(entry.key()))
            .collect()
    }

    /// Rolling mean latency over recent successful samples, if any.
    pub fn average_latency_ms(&self, provider_id: &str) -> Option<f64> {
        let record = self.table.get(provider_id)?;
        if record.latency_window.is_empty() {
            return None;
        }
        let sum: u64 = record.latency_window.iter().sum();
        Some(sum as f64 / record.latency_window.len() as f64)
    }

    /// Whether the most recent sample is older than `threshold` (or there
    /// is no sample at all).
    pub fn is_stale(&self, provider_id: &str, threshold: Duration) -> bool {
        match self
            .table
            .get(provider_id)
            .and_then(|record| record.checked_instant)
        {
            Some(at) => at.elapsed() > threshold,
            None => true,
        }
    }

    fn record(&self, provider_id: &str, success: bool, latency_ms: Option<u64>) -> ProviderHealth {
        let mut record = self.table.entry(provider_id.to_string()).or_default();
        record.apply(provider_id, success, latency_ms);
        record.snapshot(provider_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use modelmux_model::{HealthStatus, ProviderCategory, ProviderDescriptor};
    use modelmux_registry::ProviderRegistry;

    use super::{HealthConfig, HealthMonitor};
    use crate::probe::{Probe, ProbeError};

    struct ScriptedProbe {
        calls: AtomicUsize,
        delay: Duration,
        script: Box<dyn Fn(usize, &str) -> Result<(), ProbeError> + Send + Sync>,
    }

    impl ScriptedProbe {
        fn new(
            script: impl Fn(usize, &str) -> Result<(), ProbeError> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Self::with_delay(Duration::ZERO, script)
        }

        fn with_delay(
            delay: Duration,
            script: impl Fn(usize, &str) -> Result<(), ProbeError> + Send + Sync + 'static,
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
    impl Probe for ScriptedProbe {
        async fn probe(&self, provider: &ProviderDescriptor) -> Result<(), ProbeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.script)(call, &provider.id)
        }
    }

    fn registry_with(ids: &[&str]) -> Arc<ProviderRegistry> {
        let registry = Arc::new(ProviderRegistry::new());
        for id in ids {
            registry
                .register(
                    ProviderDescriptor::new(*id, *id, ProviderCategory::LlmRemote)
                        .with_endpoint("https://api.example.com/v1"),
                )
                .unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn first_success_moves_unknown_to_healthy() {
        let probe = ScriptedProbe::new(|_, _| Ok(()));
        let monitor = HealthMonitor::new(registry_with(&["p1"]), probe);

        assert_eq!(monitor.health("p1").status, HealthStatus::Unknown);

        let health = monitor.check("p1").await.unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.response_time_ms.is_some());
    }

    #[tokio::test]
    async fn failures_degrade_then_mark_unhealthy() {
        let probe = ScriptedProbe::new(|_, _| Err(ProbeError("down".to_string())));
        let monitor = HealthMonitor::new(registry_with(&["p1"]), probe);

        assert_eq!(monitor.check("p1").await.unwrap().status, HealthStatus::Degraded);
        assert_eq!(monitor.check("p1").await.unwrap().status, HealthStatus::Degraded);

        let third = monitor.check("p1").await.unwrap();
        assert_eq!(third.status, HealthStatus::Unhealthy);
        assert_eq!(third.consecutive_failures, 3);
    }

    #[tokio::test]
    async fn single_success_revives_unhealthy_and_resets_counter() {
        let probe = ScriptedProbe::new(|call, _| {
            if call < 3 {
                Err(ProbeError("down".to_string()))
            } else {
                Ok(())
            }
        });
        let monitor = HealthMonitor::new(registry_with(&["p1"]), probe);

        for _ in 0..3 {
            monitor.check("p1").await.unwrap();
        }
        assert_eq!(monitor.health("p1").status, HealthStatus::Unhealthy);

        let revived = monitor.check("p1").await.unwrap();
        assert_eq!(revived.status, HealthStatus::Healthy);
        assert_eq!(revived.consecutive_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_timeout_counts_as_failure() {
        let probe = ScriptedProbe::with_delay(Duration::from_secs(60), |_, _| Ok(()));
        let monitor = HealthMonitor::with_config(
            registry_with(&["p1"]),
            probe,
            HealthConfig {
                probe_timeout: Duration::from_secs(5),
                ..HealthConfig::default()
            },
        );

        let health = monitor.check("p1").await.unwrap();
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn check_all_probes_every_provider_and_isolates_failures() {
        let probe = ScriptedProbe::new(|_, provider| {
            if provider == "bad" {
                Err(ProbeError("down".to_string()))
            } else {
                Ok(())
            }
        });
        let monitor = HealthMonitor::new(registry_with(&["good", "bad", "other"]), probe.clone());

        let sweep = monitor.check_all().await;
        assert_eq!(sweep.len(), 3);
        assert_eq!(probe.calls(), 3);
        assert_eq!(monitor.health("good").status, HealthStatus::Healthy);
        assert_eq!(monitor.health("bad").status, HealthStatus::Degraded);
        assert_eq!(monitor.health("other").status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn reported_outcomes_drive_the_same_state_machine() {
        let probe = ScriptedProbe::new(|_, _| Ok(()));
        let monitor = HealthMonitor::new(registry_with(&["p1"]), probe);

        monitor.report_outcome("p1", false, None);
        assert_eq!(monitor.health("p1").status, HealthStatus::Degraded);

        monitor.report_outcome("p1", false, None);
        monitor.report_outcome("p1", false, None);
        assert_eq!(monitor.health("p1").status, HealthStatus::Unhealthy);

        monitor.report_outcome("p1", true, Some(42));
        let health = monitor.health("p1");
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.response_time_ms, Some(42));
    }

    #[tokio::test]
    async fn rolling_latency_averages_recent_samples() {
        let probe = ScriptedProbe::new(|_, _| Ok(()));
        let monitor = HealthMonitor::new(registry_with(&["p1"]), probe);

        assert_eq!(monitor.average_latency_ms("p1"), None);

        monitor.report_outcome("p1", true, Some(100));
        monitor.report_outcome("p1", true, Some(200));
        assert_eq!(monitor.average_latency_ms("p1"), Some(150.0));
    }

    #[tokio::test]
    async fn staleness_reflects_sample_age() {
        let probe = ScriptedProbe::new(|_, _| Ok(()));
        let monitor = HealthMonitor::new(registry_with(&["p1"]), probe);

        assert!(monitor.is_stale("p1", Duration::from_secs(60)));

        monitor.report_outcome("p1", true, Some(10));
        assert!(!monitor.is_stale("p1", Duration::from_secs(60)));
        assert!(monitor.is_stale("p1", Duration::ZERO));
    }
}
