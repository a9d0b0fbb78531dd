//! # modelmux-health
//!
//! Provider health tracking: on-demand and scheduled reachability probes,
//! a per-provider state machine, and outcome feedback from real request
//! attempts.
//!
//! State machine (per provider): `Unknown` --success--> `Healthy`;
//! `Healthy` --1 failure--> `Degraded`; `Degraded` --3 consecutive
//! failures--> `Unhealthy`; any state --success--> `Healthy` with the
//! failure counter reset.
//!
//! The periodic sweep is an explicit, start/stop-able task owned by a
//! [`HealthScheduler`] handle — never an ambient global — so tests drive
//! checks deterministically.

pub mod error;
pub mod monitor;
pub mod probe;
pub mod scheduler;

pub use error::{Error, Result};
pub use monitor::{HealthConfig, HealthMonitor};
pub use probe::{HttpProbe, Probe, ProbeError};
pub use scheduler::HealthScheduler;
