//! The router: candidate ordering, filtering, and selection.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use modelmux_health::HealthMonitor;
use modelmux_model::{Capability, CatalogReader, HealthStatus, UseCase};
use modelmux_profile::{Preference, ProfileManager, RouterPolicy};
use tracing::debug;

use crate::decision::{
    CandidateOutcome, CandidateStatus, RejectionReason, RoutingDecision, Selection,
};
use crate::error::{Error, Result};

/// Tunables for the router's optional on-demand health refresh.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// A health sample older than this may trigger one on-demand check.
    pub staleness_threshold: Duration,
    /// Whether to refresh stale health at all. Off means routing decisions
    /// read cached health only.
    pub refresh_stale_health: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            staleness_threshold: Duration::from_secs(60),
            refresh_stale_health: true,
        }
    }
}

/// Selects a provider+model for each request under the active profile.
///
/// Reads catalog, health, and profile state; writes nothing. The inference
/// call itself happens outside — callers execute with the selection and
/// report the outcome back to the health monitor.
pub struct Router {
    profiles: Arc<ProfileManager>,
    catalog: Arc<dyn CatalogReader>,
    health: Arc<HealthMonitor>,
    config: RouterConfig,
}

impl Router {
    pub fn new(
        profiles: Arc<ProfileManager>,
        catalog: Arc<dyn CatalogReader>,
        health: Arc<HealthMonitor>,
    ) -> Self {
        Self::with_config(profiles, catalog, health, RouterConfig::default())
    }

    pub fn with_config(
        profiles: Arc<ProfileManager>,
        catalog: Arc<dyn CatalogReader>,
        health: Arc<HealthMonitor>,
        config: RouterConfig,
    ) -> Self {
        Self {
            profiles,
            catalog,
            health,
            config,
        }
    }

    /// Pick a provider+model for `use_case`.
    ///
    /// `required_capabilities` from the call site are unioned with each
    /// candidate's own requirements. Returns a [`RoutingDecision`] whether
    /// or not a candidate survived; the only error is having no active
    /// profile.
    pub async fn route(
        &self,
        use_case: UseCase,
        required_capabilities: &[Capability],
    ) -> Result<RoutingDecision> {
        let profile = self.profiles.get_active().ok_or(Error::NoActiveProfile)?;

        let mut candidates = profile.ordered_preferences(use_case);
        self.apply_policy(profile.policy, &mut candidates);

        let mut decision = RoutingDecision {
            use_case,
            policy: profile.policy,
            candidates: Vec::with_capacity(candidates.len()),
            selected: None,
            warnings: Vec::new(),
        };

        // At most one on-demand health check per routing decision.
        let mut refreshed = false;

        for candidate in candidates {
            if decision.selected.is_some() {
                decision.candidates.push(outcome(&candidate, CandidateStatus::NotEvaluated));
                continue;
            }

            let status = self
                .evaluate(&candidate, required_capabilities, &mut refreshed, &mut decision.warnings)
                .await;

            if matches!(status, CandidateStatus::Selected) {
                decision.selected = Some(Selection {
                    provider_id: candidate.provider_id.clone(),
                    model_id: candidate.model_id.clone(),
                });
            }
            decision.candidates.push(outcome(&candidate, status));
        }

        match &decision.selected {
            Some(selection) => debug!(
                use_case = %use_case,
                provider = %selection.provider_id,
                model = %selection.model_id,
                "routed"
            ),
            None => debug!(
                use_case = %use_case,
                candidates = decision.candidates.len(),
                "no candidate survived routing"
            ),
        }

        Ok(decision)
    }

    /// Re-score candidates for cost/performance policies. Other policies
    /// trust the declared priority order. Sorting is stable, so declared
    /// priority (the incoming order) breaks ties.
    fn apply_policy(&self, policy: RouterPolicy, candidates: &mut [Preference]) {
        match policy {
            RouterPolicy::Cost => {
                candidates.sort_by(|a, b| {
                    let cost_a = self.model_cost(a);
                    let cost_b = self.model_cost(b);
                    cost_a.partial_cmp(&cost_b).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            RouterPolicy::Performance => {
                candidates.sort_by(|a, b| {
                    let latency_a = self.provider_latency(a);
                    let latency_b = self.provider_latency(b);
                    latency_a
                        .partial_cmp(&latency_b)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            RouterPolicy::Quality | RouterPolicy::Privacy | RouterPolicy::Balanced => {}
        }
    }

    /// Candidates with no known cost sort last.
    fn model_cost(&self, candidate: &Preference) -> f64 {
        self.catalog
            .model(&candidate.provider_id, &candidate.model_id)
            .and_then(|model| model.cost_per_million_tokens)
            .unwrap_or(f64::INFINITY)
    }

    /// Candidates with no latency samples sort last.
    fn provider_latency(&self, candidate: &Preference) -> f64 {
        self.health
            .average_latency_ms(&candidate.provider_id)
            .unwrap_or(f64::INFINITY)
    }

    async fn evaluate(
        &self,
        candidate: &Preference,
        required_capabilities: &[Capability],
        refreshed: &mut bool,
        warnings: &mut Vec<String>,
    ) -> CandidateStatus {
        let Some(model) = self
            .catalog
            .model(&candidate.provider_id, &candidate.model_id)
        else {
            return rejected(RejectionReason::ModelNotFound);
        };

        let mut needed: BTreeSet<Capability> =
            required_capabilities.iter().copied().collect();
        needed.extend(candidate.required_capabilities.iter().copied());

        if let Some(&capability) = needed.difference(&model.capabilities).next() {
            return rejected(RejectionReason::MissingCapability { capability });
        }

        if let Some(&capability) = candidate
            .excluded_capabilities
            .intersection(&model.capabilities)
            .next()
        {
            return rejected(RejectionReason::ExcludedCapability { capability });
        }

        if self.config.refresh_stale_health
            && !*refreshed
            && self
                .health
                .is_stale(&candidate.provider_id, self.config.staleness_threshold)
        {
            *refreshed = true;
            // Best effort; an unregistered provider just stays Unknown.
            let _ = self.health.check(&candidate.provider_id).await;
        }

        let health = self.health.health(&candidate.provider_id);
        match health.status {
            HealthStatus::Unhealthy => rejected(RejectionReason::Unhealthy),
            HealthStatus::Degraded => {
                warnings.push(format!(
                    "provider '{}' is degraded ({} recent failures)",
                    candidate.provider_id, health.consecutive_failures
                ));
                CandidateStatus::Selected
            }
            HealthStatus::Healthy | HealthStatus::Unknown => CandidateStatus::Selected,
        }
    }
}

fn outcome(candidate: &Preference, status: CandidateStatus) -> CandidateOutcome {
    CandidateOutcome {
        provider_id: candidate.provider_id.clone(),
        model_id: candidate.model_id.clone(),
        priority: candidate.priority,
        status,
    }
}

fn rejected(reason: RejectionReason) -> CandidateStatus {
    CandidateStatus::Rejected { reason }
}
