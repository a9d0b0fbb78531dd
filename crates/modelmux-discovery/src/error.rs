/// Errors produced by the discovery engine.
///
/// Failed remote listings are not errors — they fall back to curated model
/// lists. The only hard failure is asking about a provider the registry
/// does not know.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] modelmux_registry::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
