/// Errors produced by the provider registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A provider with the given id is already registered.
    #[error("duplicate provider: {0}")]
    DuplicateProvider(String),

    /// No provider with the given id is registered.
    #[error("provider not found: {0}")]
    NotFound(String),

    /// The attached persistence collaborator failed.
    #[error("store error: {0}")]
    Store(#[from] modelmux_model::StoreError),

    /// A persisted registration blob failed to (de)serialize.
    #[error("registration blob error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
