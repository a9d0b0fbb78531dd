//! Periodic health sweep task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::monitor::HealthMonitor;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Handle to a running periodic sweep.
///
/// The task belongs to this handle: dropping it or calling
/// [`stop`](Self::stop) ends the sweep. Nothing starts implicitly — tests
/// call [`HealthMonitor::check_all`] directly instead of waiting on the
/// wall clock.
pub struct HealthScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl HealthMonitor {
    /// Start sweeping `check_all` every `interval`.
    pub fn start_scheduler(self: &Arc<Self>, interval: Duration) -> HealthScheduler {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let monitor = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so starting the
            // scheduler doesn't double up with a bootstrap check_all.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("scheduled health sweep");
                        monitor.check_all().await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        info!(interval = ?interval, "health scheduler started");
        HealthScheduler { shutdown, handle }
    }
}

impl HealthScheduler {
    /// Stop the sweep and wait for the task to wind down.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
        info!("health scheduler stopped");
    }

    /// Whether the sweep task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
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

    use crate::monitor::HealthMonitor;
    use crate::probe::{Probe, ProbeError};

    struct CountingProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Probe for CountingProbe {
        async fn probe(&self, _provider: &ProviderDescriptor) -> Result<(), ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_sweeps_on_interval_until_stopped() {
        let registry = Arc::new(ProviderRegistry::new());
        registry
            .register(ProviderDescriptor::new(
                "p1",
                "P1",
                ProviderCategory::LlmRemote,
            ))
            .unwrap();

        let probe = Arc::new(CountingProbe {
            calls: AtomicUsize::new(0),
        });
        let monitor = Arc::new(HealthMonitor::new(registry, probe.clone()));

        let scheduler = monitor.start_scheduler(Duration::from_secs(30));
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(95)).await;
        let swept = probe.calls.load(Ordering::SeqCst);
        assert!(swept >= 3, "expected at least 3 sweeps, saw {swept}");
        assert_eq!(monitor.health("p1").status, HealthStatus::Healthy);

        scheduler.stop().await;
        let after_stop = probe.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), after_stop);
    }
}
