//! HTTP client for an OpenAI-compatible chat completion endpoint.

use std::time::Duration;

use inbrain_core::{AppConfig, Comment};
use reqwest::{Client, Url};

use crate::error::ClustererError;
use crate::prompt::{build_prompt, parse_proposals, SYSTEM_PROMPT};
use crate::retry::retry_with_backoff;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ProposedCluster};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;
const CLUSTERING_MAX_TOKENS: u32 = 3_000;
const TEMPERATURE: f32 = 0.7;

/// Client for the clustering model.
///
/// Use [`ClustererClient::new`] for production or
/// [`ClustererClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct ClustererClient {
    client: Client,
    api_key: String,
    base_url: Url,
    model: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for ClustererClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClustererClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("api_key", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ClustererClient {
    /// # Errors
    ///
    /// Returns [`ClustererError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ClustererError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ClustererError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClustererError::InvalidRequest`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ClustererError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("inbrain/0.1 (comment-clustering)")
            .build()?;

        // A trailing slash makes Url::join append rather than replace the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            ClustererError::InvalidRequest(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            model: DEFAULT_MODEL.to_owned(),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Build a client from loaded configuration. Returns `Ok(None)` when no
    /// API key is configured.
    ///
    /// # Errors
    ///
    /// Same as [`ClustererClient::with_base_url`].
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, ClustererError> {
        let Some(api_key) = config.clusterer_api_key.as_deref() else {
            return Ok(None);
        };
        let client = Self::with_base_url(
            api_key,
            config.clusterer_timeout_secs,
            &config.clusterer_base_url,
        )?
        .with_model(&config.clusterer_model)
        .with_retry(
            config.clusterer_max_retries,
            config.clusterer_backoff_base_ms,
        );
        Ok(Some(client))
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        model.clone_into(&mut self.model);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model to group `comments` into `num_clusters` themes.
    ///
    /// Transient failures are retried per the client's retry policy.
    ///
    /// # Errors
    ///
    /// - [`ClustererError::Http`] on network failure after retries.
    /// - [`ClustererError::Api`] if the service keeps answering non-2xx.
    /// - [`ClustererError::Deserialize`] if the reply is not the expected JSON.
    pub async fn propose_clusters(
        &self,
        comments: &[Comment],
        num_clusters: u32,
    ) -> Result<Vec<ProposedCluster>, ClustererError> {
        let prompt = build_prompt(comments, num_clusters);
        let reply = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.complete(SYSTEM_PROMPT, &prompt, CLUSTERING_MAX_TOKENS)
        })
        .await?;
        parse_proposals(&reply)
    }

    /// Send one chat completion and return the first choice's text.
    ///
    /// # Errors
    ///
    /// Returns [`ClustererError::Http`] on network failure,
    /// [`ClustererError::Api`] on a non-2xx status, or
    /// [`ClustererError::Deserialize`] if the envelope cannot be decoded.
    pub async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ClustererError> {
        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|e| ClustererError::InvalidRequest(format!("invalid endpoint: {e}")))?;
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClustererError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: ChatResponse =
            serde_json::from_str(&text).map_err(|e| ClustererError::Deserialize {
                context: "chat completion".to_string(),
                source: e,
            })?;

        Ok(envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = ClustererClient::with_base_url("k", 5, "https://api.example.com/openai/v1")
            .expect("client construction should not fail");
        assert_eq!(
            client
                .base_url
                .join("chat/completions")
                .unwrap()
                .as_str(),
            "https://api.example.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ClustererClient::with_base_url("k", 5, "not a url").unwrap_err();
        assert!(matches!(err, ClustererError::InvalidRequest(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = ClustererClient::with_base_url("secret-key", 5, "http://localhost").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
    }
}
