//! # modelmux-router
//!
//! Request-time provider/model selection.
//!
//! [`Router::route`] combines the active profile's per-use-case preference
//! list with live health and catalog state to pick a provider+model, or
//! returns a fully-annotated failure: every candidate considered appears in
//! the [`RoutingDecision`] with its specific outcome, so "no suitable
//! provider" is diagnosable ("all candidates unhealthy" vs. "no candidate
//! has capability X") rather than a generic error.
//!
//! The router is a pure read path over cached state; its one optional side
//! effect is a timeout-bounded on-demand health check when a candidate's
//! sample has gone stale.

pub mod decision;
pub mod error;
pub mod router;

pub use decision::{
    CandidateOutcome, CandidateStatus, RejectionReason, RoutingDecision, Selection,
};
pub use error::{Error, Result};
pub use router::{Router, RouterConfig};
