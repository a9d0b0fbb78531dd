/// Errors produced by the health monitor.
///
/// Probe failures are not errors — they feed the state machine. The only
/// hard failure is asking about a provider the registry does not know.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] modelmux_registry::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
