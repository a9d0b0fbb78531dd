//! Profile types: policy, preferences, guardrails, memory budget.

use std::collections::{BTreeMap, BTreeSet};

use modelmux_model::{Capability, UseCase};
use serde::{Deserialize, Serialize};

/// The optimization objective a profile routes under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterPolicy {
    /// Prefer the lowest rolling-average latency.
    Performance,
    /// Trust the declared preference order.
    Quality,
    /// Prefer the cheapest model.
    Cost,
    /// Trust the declared order; privacy weighting is expressed by which
    /// providers the preference list names.
    Privacy,
    #[default]
    Balanced,
}

impl RouterPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouterPolicy::Performance => "performance",
            RouterPolicy::Quality => "quality",
            RouterPolicy::Cost => "cost",
            RouterPolicy::Privacy => "privacy",
            RouterPolicy::Balanced => "balanced",
        }
    }
}

impl std::fmt::Display for RouterPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a use case's ordered preference list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preference {
    pub provider_id: String,
    pub model_id: String,
    /// Higher wins. Ties keep list order.
    #[serde(default)]
    pub priority: u32,
    /// Capabilities the model must have for this preference to be eligible.
    #[serde(default)]
    pub required_capabilities: BTreeSet<Capability>,
    /// Capabilities the model must *not* have (e.g. keep vision-capable
    /// models away from a privacy-sensitive use case).
    #[serde(default)]
    pub excluded_capabilities: BTreeSet<Capability>,
}

impl Preference {
    pub fn new(
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
        priority: u32,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            priority,
            required_capabilities: BTreeSet::new(),
            excluded_capabilities: BTreeSet::new(),
        }
    }

    pub fn require(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.required_capabilities.extend(capabilities);
        self
    }

    pub fn exclude(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.excluded_capabilities.extend(capabilities);
        self
    }
}

/// How aggressively content filtering applies under this profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Relaxed,
    #[default]
    Standard,
    Strict,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentFilter {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub blocked_categories: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimit {
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
    #[serde(default)]
    pub tokens_per_minute: Option<u64>,
}

/// Safety and throttling constraints carried by a profile. Enforced by the
/// request-handling layer; this core stores and validates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Guardrails {
    #[serde(default)]
    pub safety_level: SafetyLevel,
    #[serde(default)]
    pub content_filter: ContentFilter,
    #[serde(default)]
    pub rate_limit: RateLimit,
}

/// Context/history resource budget for sessions routed under a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBudget {
    /// Upper bound on context the session may assemble, in tokens. Should
    /// not exceed the smallest context window among the chat-use-case
    /// models; validation warns when it does.
    pub max_context_length: u64,
    #[serde(default)]
    pub max_history_items: Option<u32>,
    #[serde(default)]
    pub compression_enabled: bool,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self {
            max_context_length: 8_192,
            max_history_items: None,
            compression_enabled: false,
        }
    }
}

/// A named bundle of routing policy, per-use-case preferences, guardrails,
/// and a resource budget. Exactly one profile is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub policy: RouterPolicy,
    /// Ordered preference list per use case.
    #[serde(default)]
    pub preferences: BTreeMap<UseCase, Vec<Preference>>,
    #[serde(default)]
    pub guardrails: Guardrails,
    #[serde(default)]
    pub memory_budget: MemoryBudget,
}

impl Profile {
    pub fn new(id: impl Into<String>, name: impl Into<String>, policy: RouterPolicy) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            policy,
            preferences: BTreeMap::new(),
            guardrails: Guardrails::default(),
            memory_budget: MemoryBudget::default(),
        }
    }

    /// Append preferences for a use case, keeping existing ones.
    pub fn prefer(
        mut self,
        use_case: UseCase,
        preferences: impl IntoIterator<Item = Preference>,
    ) -> Self {
        self.preferences
            .entry(use_case)
            .or_default()
            .extend(preferences);
        self
    }

    /// The preference list for a use case, priority descending (ties keep
    /// declaration order).
    pub fn ordered_preferences(&self, use_case: UseCase) -> Vec<Preference> {
        let mut preferences = self
            .preferences
            .get(&use_case)
            .cloned()
            .unwrap_or_default();
        preferences.sort_by(|a, b| b.priority.cmp(&a.priority));
        preferences
    }
}
