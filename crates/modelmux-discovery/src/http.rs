//! OpenAI-compatible `/models` lister.

use std::time::Duration;

use async_trait::async_trait;
use modelmux_model::{ModelDescriptor, ProviderDescriptor};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::lister::{ListError, ModelLister};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Context window assumed for listed models that don't declare one.
const DEFAULT_CONTEXT_LENGTH: u64 = 8_192;

/// `GET {endpoint}/models` response shape shared by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    context_length: Option<u64>,
}

/// Lists models from OpenAI-compatible HTTP APIs.
///
/// Listed models inherit the provider's declared capability set; richer
/// per-model metadata is a provider-specific lister's concern.
pub struct HttpModelLister {
    client: reqwest::Client,
    bearer_token: Option<String>,
}

impl HttpModelLister {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            bearer_token: None,
        }
    }

    /// Attach a bearer token sent with every listing request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

impl Default for HttpModelLister {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelLister for HttpModelLister {
    async fn list_models(
        &self,
        provider: &ProviderDescriptor,
    ) -> Result<Vec<ModelDescriptor>, ListError> {
        let Some(endpoint) = &provider.endpoint else {
            return Err(ListError::Transport(format!(
                "provider '{}' has no endpoint to list from",
                provider.id
            )));
        };

        let url = format!("{}/models", endpoint.trim_end_matches('/'));
        let mut request = self.client.get(&url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ListError::Transport(err.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ListError::Unauthorized(format!(
                    "listing endpoint returned {}",
                    response.status()
                )));
            }
            status => {
                return Err(ListError::Transport(format!(
                    "listing endpoint returned {status}"
                )));
            }
        }

        let parsed: ModelsResponse = response
            .json()
            .await
            .map_err(|err| ListError::Malformed(err.to_string()))?;

        Ok(parsed
            .data
            .into_iter()
            .map(|entry| {
                ModelDescriptor::new(
                    entry.id,
                    provider.id.clone(),
                    entry.context_length.unwrap_or(DEFAULT_CONTEXT_LENGTH),
                )
                .with_capabilities(provider.capabilities.iter().copied())
            })
            .collect())
    }
}
