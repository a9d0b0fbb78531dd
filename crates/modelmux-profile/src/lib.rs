//! # modelmux-profile
//!
//! Named routing profiles: policy, per-use-case provider/model preferences,
//! guardrails, and a memory budget.
//!
//! The [`ProfileManager`] owns CRUD over profiles with save-on-write
//! persistence through a [`KeyValueStore`](modelmux_model::KeyValueStore),
//! enforces the exactly-one-active invariant (`activate` atomically swaps
//! the active profile; deleting the active profile is refused), and
//! validates cross-references against the provider registry and model
//! catalog — dangling ids are errors, capability and context-budget
//! mismatches are non-fatal [`CompatibilityWarning`]s.

pub mod error;
pub mod manager;
pub mod profile;
pub mod validate;

pub use error::{Error, Result};
pub use manager::ProfileManager;
pub use profile::{
    ContentFilter, Guardrails, MemoryBudget, Preference, Profile, RateLimit, RouterPolicy,
    SafetyLevel,
};
pub use validate::{CompatibilityWarning, ValidationError, ValidationReport};
