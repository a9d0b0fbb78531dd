//! Routing decision types.

use modelmux_model::{Capability, UseCase};
use modelmux_profile::RouterPolicy;
use serde::{Deserialize, Serialize};

/// Why a candidate was passed over.
///
/// Renders in a stable machine-readable form
/// (`missing-capability:vision`, `unhealthy`, ...) surfaced verbatim to
/// callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The model lacks a capability the request or preference requires.
    MissingCapability { capability: Capability },
    /// The model has a capability the preference excludes.
    ExcludedCapability { capability: Capability },
    /// The provider's health is `Unhealthy`.
    Unhealthy,
    /// The model is in neither the catalog nor the curated registration.
    ModelNotFound,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::MissingCapability { capability } => {
                write!(f, "missing-capability:{capability}")
            }
            RejectionReason::ExcludedCapability { capability } => {
                write!(f, "excluded-capability:{capability}")
            }
            RejectionReason::Unhealthy => f.write_str("unhealthy"),
            RejectionReason::ModelNotFound => f.write_str("model-not-found"),
        }
    }
}

/// What happened to one candidate during the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateStatus {
    Selected,
    Rejected { reason: RejectionReason },
    /// Listed after the winner; never evaluated.
    NotEvaluated,
}

/// One candidate from the preference list, annotated with its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateOutcome {
    pub provider_id: String,
    pub model_id: String,
    pub priority: u32,
    pub status: CandidateStatus,
}

/// The chosen provider+model pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub provider_id: String,
    pub model_id: String,
}

/// Per-request routing outcome: the full ordered candidate list with
/// per-candidate outcomes, plus the selection if one survived.
///
/// Ephemeral — produced per request, not persisted; surface it for
/// observability as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub use_case: UseCase,
    pub policy: RouterPolicy,
    pub candidates: Vec<CandidateOutcome>,
    pub selected: Option<Selection>,
    /// Soft findings that didn't block selection (e.g. a degraded winner).
    pub warnings: Vec<String>,
}

impl RoutingDecision {
    /// Whether no candidate survived — the routing-failure shape.
    pub fn is_failure(&self) -> bool {
        self.selected.is_none()
    }

    /// Rejected candidates with their reasons, in walk order.
    pub fn rejections(&self) -> impl Iterator<Item = (&CandidateOutcome, &RejectionReason)> {
        self.candidates.iter().filter_map(|candidate| {
            if let CandidateStatus::Rejected { reason } = &candidate.status {
                Some((candidate, reason))
            } else {
                None
            }
        })
    }
}
