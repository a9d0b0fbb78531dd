//! Provider health snapshot types.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Where a provider sits in the health state machine.
///
/// Transitions (applied by the health monitor only):
/// `Unknown` --success--> `Healthy`; `Healthy` --1 failure--> `Degraded`;
/// `Degraded` --3 consecutive failures--> `Unhealthy`; any state
/// --success--> `Healthy` with the failure counter reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Never probed.
    #[default]
    Unknown,
    Healthy,
    /// At least one recent failure; still routable.
    Degraded,
    /// Three or more consecutive failures; skipped by the router.
    Unhealthy,
}

/// Point-in-time health snapshot for one provider.
///
/// Mutated only by the health monitor; everything else reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub provider_id: String,
    pub status: HealthStatus,
    /// When the most recent probe or reported outcome was applied.
    pub checked_at: Option<SystemTime>,
    /// Latency of the most recent successful sample, in milliseconds.
    pub response_time_ms: Option<u64>,
    pub consecutive_failures: u32,
}

impl ProviderHealth {
    /// Snapshot for a provider that has never been sampled.
    pub fn unknown(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: HealthStatus::Unknown,
            checked_at: None,
            response_time_ms: None,
            consecutive_failures: 0,
        }
    }

    /// Whether the router should skip this provider outright.
    pub fn is_unhealthy(&self) -> bool {
        self.status == HealthStatus::Unhealthy
    }
}
