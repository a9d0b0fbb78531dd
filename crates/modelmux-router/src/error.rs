/// Errors produced by the router.
///
/// "No suitable candidate" is not an error — it comes back as a
/// [`RoutingDecision`](crate::decision::RoutingDecision) with no selection
/// and per-candidate rejection reasons.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No profile is active; activate one before routing.
    #[error("no active profile")]
    NoActiveProfile,
}

pub type Result<T> = std::result::Result<T, Error>;
