//! OpenAI-compatible chat-completion client.
//!
//! Sends `POST {base}/v1/chat/completions` with the conversation history and
//! returns `choices[0].message.content` exactly as the server produced it.
//! Model discovery against `{base}/v1/models` is exposed separately through
//! `active_model` so it never eats into the completion deadline.

use crate::backend::{CompletionBackend, CompletionRequest, ModelParams};
use crate::error::LlmError;
use crate::models::ModelResolver;
use async_trait::async_trait;
use autoreply_conversation::MessageTurn;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Extracts the top completion's text from a raw response body.
fn extract_reply(body: &str) -> Result<String, LlmError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse {
            reason: e.to_string(),
        })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| LlmError::InvalidResponse {
            reason: "response carries no completion".to_string(),
        })?;

    if content.is_empty() {
        return Err(LlmError::InvalidResponse {
            reason: "completion is empty".to_string(),
        });
    }

    Ok(content)
}

fn snippet(body: &str) -> String {
    body.chars().take(800).collect()
}

/// Client for an OpenAI-compatible inference server.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    completions_url: String,
    resolver: ModelResolver,
}

impl OpenAiCompatClient {
    /// Creates a client for the server at `base_url` (e.g.
    /// `http://192.168.80.1:1234`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;

        let base = base_url.trim_end_matches('/');
        Ok(Self {
            completions_url: format!("{base}/v1/chat/completions"),
            resolver: ModelResolver::new(http.clone(), format!("{base}/v1/models")),
            http,
        })
    }

    #[must_use]
    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    #[must_use]
    pub fn resolver(&self) -> &ModelResolver {
        &self.resolver
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompatClient {
    #[instrument(skip(self, history, params), fields(model = %params.model, turns = history.len()))]
    async fn complete(
        &self,
        history: &[MessageTurn],
        params: &ModelParams,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::from_history(history, params);

        debug!(
            endpoint = %self.completions_url,
            model = %request.model,
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&self.completions_url)
            .timeout(request.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint = %self.completions_url, "Chat completion call failed");
                LlmError::from_transport(&e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        if !status.is_success() {
            warn!(
                endpoint = %self.completions_url,
                status = %status,
                body = %snippet(&body),
                "Inference server returned error"
            );
            return Err(LlmError::InvalidResponse {
                reason: format!("HTTP {status}"),
            });
        }

        extract_reply(&body).inspect_err(|e| {
            warn!(
                error = %e,
                body = %snippet(&body),
                "Unexpected chat completion response"
            );
        })
    }

    fn endpoint(&self) -> &str {
        &self.completions_url
    }

    async fn active_model(&self, configured: &str) -> String {
        self.resolver.resolve(configured).await
    }
}
