/// Errors produced by the credential validator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provider requires a credential and none was supplied.
    #[error("provider '{0}' requires a credential and none was supplied")]
    CredentialMissing(String),

    /// The supplied credential was rejected by the provider.
    #[error("credential for provider '{provider}' is invalid: {detail}")]
    CredentialInvalid { provider: String, detail: String },

    /// The provider is not registered.
    #[error(transparent)]
    Registry(#[from] modelmux_registry::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
