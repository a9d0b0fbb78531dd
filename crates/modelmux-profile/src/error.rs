/// Errors produced by the profile manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A profile with the given id already exists.
    #[error("duplicate profile: {0}")]
    DuplicateProfile(String),

    /// No profile with the given id exists.
    #[error("profile not found: {0}")]
    NotFound(String),

    /// The profile is active; activate another profile first.
    #[error("cannot delete active profile: {0}")]
    CannotDeleteActiveProfile(String),

    /// The attached persistence collaborator failed.
    #[error("store error: {0}")]
    Store(#[from] modelmux_model::StoreError),

    /// A persisted profile blob failed to (de)serialize.
    #[error("profile blob error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
