//! Transport seam for provider reachability probes.

use std::time::Duration;

use async_trait::async_trait;
use modelmux_model::ProviderDescriptor;

/// A failed reachability probe.
#[derive(Debug, thiserror::Error)]
#[error("probe failed: {0}")]
pub struct ProbeError(pub String);

/// One lightweight reachability check against a provider.
///
/// Latency is measured by the monitor around the call; implementations
/// just need to come back quickly when the provider is up.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, provider: &ProviderDescriptor) -> Result<(), ProbeError>;
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Probes providers with an unauthenticated `GET` to their endpoint.
///
/// Any response short of a server error counts as reachable — a 401 from
/// an auth-walled API still proves the provider is up.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, provider: &ProviderDescriptor) -> Result<(), ProbeError> {
        let Some(endpoint) = &provider.endpoint else {
            return Err(ProbeError(format!(
                "provider '{}' has no endpoint to probe",
                provider.id
            )));
        };

        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|err| ProbeError(err.to_string()))?;

        if response.status().is_server_error() {
            return Err(ProbeError(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
