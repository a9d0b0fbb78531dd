//! The credential validator: cached, backoff-bounded credential checks.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;
use modelmux_model::CredentialRequirement;
use modelmux_registry::ProviderRegistry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::endpoint::{CheckError, CredentialEndpoint};
use crate::error::{Error, Result};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
const BACKOFF_BASE: Duration = Duration::from_millis(500);
const MAX_ATTEMPTS: u32 = 3;

/// Outcome of a credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Valid,
    Invalid,
    /// The check could not be completed (transient failures exhausted the
    /// retry budget); the credential may still be fine.
    Unknown,
}

/// Result of validating a credential against a provider.
///
/// Carries a sanitized detail string, never the raw credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialValidationResult {
    pub provider_id: String,
    pub validity: Validity,
    pub checked_at: SystemTime,
    /// Sanitized human-readable detail (error text, caveats).
    pub detail: Option<String>,
    /// How long this result may be cached.
    pub ttl: Duration,
}

impl CredentialValidationResult {
    fn new(provider_id: &str, validity: Validity, detail: Option<String>, ttl: Duration) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            validity,
            checked_at: SystemTime::now(),
            detail,
            ttl,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }

    /// Convert an invalid result into a typed error, for callers that want
    /// validation to fail hard.
    pub fn require_valid(&self) -> Result<()> {
        match self.validity {
            Validity::Invalid => Err(Error::CredentialInvalid {
                provider: self.provider_id.clone(),
                detail: self
                    .detail
                    .clone()
                    .unwrap_or_else(|| "credential rejected".to_string()),
            }),
            Validity::Valid | Validity::Unknown => Ok(()),
        }
    }
}

/// One cached validation, bound to the digest of the credential it checked.
struct CachedValidation {
    credential_digest: [u8; 32],
    result: CredentialValidationResult,
    expires_at: Instant,
}

/// Validates credentials against registered providers, with caching.
///
/// The cache is a per-provider concurrent map, so validations for unrelated
/// providers never contend. Each entry remembers only the SHA-256 digest of
/// the credential it validated; presenting a different credential for the
/// same provider replaces the entry immediately.
pub struct CredentialValidator {
    registry: Arc<ProviderRegistry>,
    endpoint: Arc<dyn CredentialEndpoint>,
    cache: DashMap<String, CachedValidation>,
    ttl: Duration,
}

impl CredentialValidator {
    pub fn new(registry: Arc<ProviderRegistry>, endpoint: Arc<dyn CredentialEndpoint>) -> Self {
        Self::with_ttl(registry, endpoint, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(
        registry: Arc<ProviderRegistry>,
        endpoint: Arc<dyn CredentialEndpoint>,
        ttl: Duration,
    ) -> Self {
        Self {
            registry,
            endpoint,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Validate `credential` against the provider's auth endpoint.
    ///
    /// Fails fast with [`Error::CredentialMissing`] when a required
    /// credential is absent — without any network call. Remote outcomes
    /// (valid, invalid, unknown) are returned as a
    /// [`CredentialValidationResult`], not errors.
    pub async fn validate(
        &self,
        provider_id: &str,
        credential: Option<&str>,
    ) -> Result<CredentialValidationResult> {
        let descriptor = self.registry.get(provider_id)?;

        let credential = match (descriptor.credential, credential) {
            (CredentialRequirement::Required, None) => {
                return Err(Error::CredentialMissing(provider_id.to_string()));
            }
            (CredentialRequirement::Optional, None) => {
                return Ok(CredentialValidationResult::new(
                    provider_id,
                    Validity::Valid,
                    Some("no credential supplied; provider rate limits apply".to_string()),
                    self.ttl,
                ));
            }
            (CredentialRequirement::None, _) => {
                return Ok(CredentialValidationResult::new(
                    provider_id,
                    Validity::Valid,
                    None,
                    self.ttl,
                ));
            }
            (_, Some(credential)) => credential,
        };

        let digest = digest_credential(credential);
        if let Some(entry) = self.cache.get(provider_id)
            && entry.credential_digest == digest
            && entry.expires_at > Instant::now()
        {
            debug!(provider = provider_id, "credential cache hit");
            return Ok(entry.result.clone());
        }

        let result = self.check_with_backoff(&descriptor, provider_id, credential).await;

        // A different credential for the same provider overwrites the prior
        // entry; a matching one refreshes it.
        self.cache.insert(
            provider_id.to_string(),
            CachedValidation {
                credential_digest: digest,
                result: result.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(result)
    }

    /// Drop the cached result for a provider, forcing the next validation
    /// to hit the endpoint.
    pub fn invalidate(&self, provider_id: &str) {
        self.cache.remove(provider_id);
    }

    async fn check_with_backoff(
        &self,
        descriptor: &modelmux_model::ProviderDescriptor,
        provider_id: &str,
        credential: &str,
    ) -> CredentialValidationResult {
        let mut last_transient = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            match self.endpoint.check(descriptor, credential).await {
                Ok(()) => {
                    return CredentialValidationResult::new(
                        provider_id,
                        Validity::Valid,
                        None,
                        self.ttl,
                    );
                }
                Err(CheckError::Unauthorized(detail)) => {
                    // Authorization failures are definitive; no retry.
                    return CredentialValidationResult::new(
                        provider_id,
                        Validity::Invalid,
                        Some(detail),
                        self.ttl,
                    );
                }
                Err(CheckError::Transient(detail)) => {
                    warn!(
                        provider = provider_id,
                        attempt,
                        detail = %detail,
                        "transient credential check failure"
                    );
                    last_transient = detail;
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(BACKOFF_BASE * 2u32.pow(attempt - 1)).await;
                    }
                }
            }
        }

        CredentialValidationResult::new(
            provider_id,
            Validity::Unknown,
            Some(format!("check failed after {MAX_ATTEMPTS} attempts: {last_transient}")),
            self.ttl,
        )
    }
}

fn digest_credential(credential: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    hasher.finalize().into()
}
