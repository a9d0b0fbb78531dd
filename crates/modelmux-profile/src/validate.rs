//! Cross-reference validation of profiles against registry and catalog.

use modelmux_model::{Capability, UseCase};
use serde::{Deserialize, Serialize};

/// Hard validation finding: the profile references something that does not
/// exist, so the affected preference can never route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{use_case}: provider '{provider_id}' is not registered")]
    UnknownProvider {
        use_case: UseCase,
        provider_id: String,
    },

    #[error("{use_case}: model '{provider_id}:{model_id}' is not in the catalog")]
    UnknownModel {
        use_case: UseCase,
        provider_id: String,
        model_id: String,
    },
}

/// Non-fatal compatibility finding attached to the validation result —
/// never raised as an exception.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompatibilityWarning {
    #[error(
        "{use_case}: model '{provider_id}:{model_id}' lacks required capability '{capability}'"
    )]
    MissingCapability {
        use_case: UseCase,
        provider_id: String,
        model_id: String,
        capability: Capability,
    },

    #[error(
        "memory budget max_context_length {budget} exceeds the smallest chat model context {smallest} ('{provider_id}:{model_id}')"
    )]
    ContextBudgetExceeded {
        budget: u64,
        smallest: u64,
        provider_id: String,
        model_id: String,
    },
}

/// Outcome of validating one profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<CompatibilityWarning>,
}

impl ValidationReport {
    /// No errors; warnings may still be present.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// No findings at all.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}
