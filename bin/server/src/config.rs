//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded once at startup via the `config`
//! crate from environment variables (`HOST`, `PORT`, `LM_STUDIO_HOST`,
//! `LM_STUDIO_PORT`, `LM_STUDIO_MODEL`, `LM_TEMPERATURE`, `LM_MAX_TOKENS`,
//! `LM_REQUEST_TIMEOUT`, `ALLOWED_JIDS`, `MAX_TURNS`, `LOG_LEVEL`).

use autoreply_ai::ModelParams;
use autoreply_conversation::{AllowListFilter, MAX_TURNS};
use serde::Deserialize;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the webhook listens on.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Host of the inference server.
    #[serde(default = "default_lm_studio_host")]
    pub lm_studio_host: String,

    #[serde(default = "default_lm_studio_port")]
    pub lm_studio_port: u16,

    /// Model identifier; `auto` picks whatever the server has loaded.
    #[serde(default = "default_lm_studio_model")]
    pub lm_studio_model: String,

    #[serde(default = "default_lm_temperature")]
    pub lm_temperature: f32,

    #[serde(default = "default_lm_max_tokens")]
    pub lm_max_tokens: u32,

    /// Seconds to wait for a completion.
    #[serde(default = "default_lm_request_timeout")]
    pub lm_request_timeout: f64,

    /// Comma-separated conversation identifiers; empty allows everyone.
    #[serde(default)]
    pub allowed_jids: String,

    /// Turns of history kept per conversation.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_lm_studio_host() -> String {
    "192.168.80.1".to_string()
}

fn default_lm_studio_port() -> u16 {
    1234
}

fn default_lm_studio_model() -> String {
    "auto".to_string()
}

fn default_lm_temperature() -> f32 {
    0.7
}

fn default_lm_max_tokens() -> u32 {
    300
}

fn default_lm_request_timeout() -> f64 {
    20.0
}

fn default_max_turns() -> usize {
    MAX_TURNS
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            lm_studio_host: default_lm_studio_host(),
            lm_studio_port: default_lm_studio_port(),
            lm_studio_model: default_lm_studio_model(),
            lm_temperature: default_lm_temperature(),
            lm_max_tokens: default_lm_max_tokens(),
            lm_request_timeout: default_lm_request_timeout(),
            allowed_jids: String::new(),
            max_turns: default_max_turns(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(None)
    }

    /// Loads configuration from `vars` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_source(
        vars: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?
            .try_deserialize()
    }

    /// Base URL of the inference server.
    #[must_use]
    pub fn lm_studio_base_url(&self) -> String {
        format!("http://{}:{}", self.lm_studio_host, self.lm_studio_port)
    }

    /// Address to bind the webhook listener to.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Completion timeout; falls back to the default for negative or
    /// non-finite values.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.lm_request_timeout)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_lm_request_timeout()))
    }

    #[must_use]
    pub fn model_params(&self) -> ModelParams {
        ModelParams::new(self.lm_studio_model.clone())
            .with_temperature(self.lm_temperature)
            .with_max_tokens(self.lm_max_tokens)
            .with_request_timeout(self.request_timeout())
    }

    #[must_use]
    pub fn allow_list(&self) -> AllowListFilter {
        AllowListFilter::from_csv(&self.allowed_jids)
    }
}
