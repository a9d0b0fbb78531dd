//! Bearer-token HTTP credential endpoint.

use std::time::Duration;

use async_trait::async_trait;
use modelmux_model::ProviderDescriptor;
use reqwest::StatusCode;

use crate::endpoint::{CheckError, CredentialEndpoint};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Checks a credential by issuing an authenticated `GET {endpoint}/models`.
///
/// Works for OpenAI-compatible APIs and anything else that rejects bad
/// bearer tokens with a 401/403.
pub struct HttpCredentialEndpoint {
    client: reqwest::Client,
}

impl HttpCredentialEndpoint {
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

impl Default for HttpCredentialEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialEndpoint for HttpCredentialEndpoint {
    async fn check(
        &self,
        provider: &ProviderDescriptor,
        credential: &str,
    ) -> Result<(), CheckError> {
        let Some(endpoint) = &provider.endpoint else {
            return Err(CheckError::Transient(format!(
                "provider '{}' has no endpoint to check against",
                provider.id
            )));
        };

        let url = format!("{}/models", endpoint.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|err| CheckError::Transient(err.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CheckError::Unauthorized(
                format!("auth endpoint returned {}", response.status()),
            )),
            status => Err(CheckError::Transient(format!(
                "auth endpoint returned {status}"
            ))),
        }
    }
}
