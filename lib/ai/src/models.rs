//! Model discovery.
//!
//! Inference servers such as LM Studio serve whichever model the operator
//! loaded. Configuring the model as `auto` (or `*`, or leaving it blank)
//! defers the choice to the server: the first entry of `GET /v1/models` is
//! used. An explicit name is used when the server lists it; otherwise the
//! first listed model stands in. Discovery failures never fail a reply; the
//! configured value is sent as-is instead.

use crate::error::LlmError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns true if `model` asks for server-side model selection.
#[must_use]
pub fn is_auto(model: &str) -> bool {
    matches!(model.trim().to_ascii_lowercase().as_str(), "" | "auto" | "*")
}

/// Picks the model to request given the configured value and the models the
/// server reports.
#[must_use]
pub fn choose_model(configured: &str, available: &[String]) -> String {
    if !is_auto(configured) && available.iter().any(|id| id == configured) {
        return configured.to_string();
    }
    available
        .first()
        .cloned()
        .unwrap_or_else(|| configured.to_string())
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<Model>,
}

#[derive(Deserialize)]
struct Model {
    id: String,
}

/// Resolves configured model names against the server's model listing.
#[derive(Debug, Clone)]
pub struct ModelResolver {
    http: reqwest::Client,
    models_url: String,
}

impl ModelResolver {
    /// Creates a resolver querying `models_url`.
    #[must_use]
    pub fn new(http: reqwest::Client, models_url: impl Into<String>) -> Self {
        Self {
            http,
            models_url: models_url.into(),
        }
    }

    #[must_use]
    pub fn models_url(&self) -> &str {
        &self.models_url
    }

    /// Lists the model identifiers the server reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached, answers with a
    /// non-success status, or the listing cannot be parsed.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let response = self
            .http
            .get(&self.models_url)
            .timeout(DISCOVERY_TIMEOUT)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        if !response.status().is_success() {
            return Err(LlmError::InvalidResponse {
                reason: format!("HTTP {}", response.status()),
            });
        }

        let listing: ModelsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse {
                reason: e.to_string(),
            })?;

        Ok(listing.data.into_iter().map(|m| m.id).collect())
    }

    /// Returns the model identifier to send for `configured`.
    pub async fn resolve(&self, configured: &str) -> String {
        match self.list_models().await {
            Ok(available) => {
                let model = choose_model(configured, &available);
                if !is_auto(configured) && model != configured {
                    info!(
                        configured = %configured,
                        model = %model,
                        "Configured model not loaded; using first available"
                    );
                }
                debug!(
                    endpoint = %self.models_url,
                    model = %model,
                    available = available.len(),
                    "Resolved active model"
                );
                model
            }
            Err(e) => {
                warn!(
                    error = %e,
                    endpoint = %self.models_url,
                    "Could not list models; using configured value"
                );
                configured.to_string()
            }
        }
    }
}
