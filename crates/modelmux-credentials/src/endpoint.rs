//! Transport seam for provider credential checks.

use async_trait::async_trait;
use modelmux_model::ProviderDescriptor;

/// Failure modes of a single remote credential check.
///
/// The validator retries `Transient` failures with backoff and
/// short-circuits on `Unauthorized`.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Network-level failure worth retrying (timeout, connection refused,
    /// 5xx-class response).
    #[error("transient check failure: {0}")]
    Transient(String),

    /// The provider rejected the credential (401/403-class). Never retried.
    #[error("credential rejected: {0}")]
    Unauthorized(String),
}

/// Performs one credential check against a provider's auth endpoint.
///
/// The wire protocol per provider is an external collaborator concern;
/// [`HttpCredentialEndpoint`](crate::http::HttpCredentialEndpoint) covers
/// bearer-token HTTP APIs.
#[async_trait]
pub trait CredentialEndpoint: Send + Sync {
    async fn check(
        &self,
        provider: &ProviderDescriptor,
        credential: &str,
    ) -> Result<(), CheckError>;
}
