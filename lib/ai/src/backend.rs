//! Completion backend abstraction.
//!
//! A backend turns one conversation history into one reply. The request it
//! sends carries exactly the turns the two parties exchanged; nothing is
//! prepended.

use crate::error::LlmError;
use async_trait::async_trait;
use autoreply_conversation::{MessageTurn, TurnRole};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Instruction message placed ahead of the history.
///
/// Kept as `None`: the model sees only what the user and the assistant said.
pub const SYSTEM_PROMPT: Option<&str> = None;

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Model parameters applied to every completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    /// Model identifier, or `auto` to use whatever the server has loaded.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// How long to wait for the server before giving up.
    pub request_timeout: Duration,
}

impl ModelParams {
    /// Creates parameters for `model` with the service defaults.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replaces the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// The role of a chat message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl From<TurnRole> for ChatRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Self::User,
            TurnRole::Assistant => Self::Assistant,
        }
    }
}

/// A message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: ChatRole::System,
            content: content.to_string(),
        }
    }
}

impl From<&MessageTurn> for ChatMessage {
    fn from(turn: &MessageTurn) -> Self {
        Self {
            role: turn.role().into(),
            content: turn.content().to_string(),
        }
    }
}

/// A chat-completion request, built fresh for every call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(skip)]
    pub timeout: Duration,
}

impl CompletionRequest {
    /// Builds a request replaying `history` in order.
    #[must_use]
    pub fn from_history(history: &[MessageTurn], params: &ModelParams) -> Self {
        let messages = SYSTEM_PROMPT
            .map(ChatMessage::system)
            .into_iter()
            .chain(history.iter().map(ChatMessage::from))
            .collect();

        Self {
            model: params.model.clone(),
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stream: false,
            timeout: params.request_timeout,
        }
    }
}

/// Trait for completion backends.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Produces the model's reply to `history`.
    ///
    /// `params.model` is sent as given; resolve it with
    /// [`CompletionBackend::active_model`] first.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Timeout`] when the server does not answer within
    /// `params.request_timeout`, [`LlmError::Unreachable`] on transport
    /// failures and [`LlmError::InvalidResponse`] when the answer carries no
    /// usable completion.
    async fn complete(&self, history: &[MessageTurn], params: &ModelParams)
    -> Result<String, LlmError>;

    /// Returns a human-readable description of where completions are sent.
    fn endpoint(&self) -> &str;

    /// Returns the model identifier to request for `configured`.
    ///
    /// Any lookup this needs runs on its own deadline, separate from
    /// `request_timeout`.
    async fn active_model(&self, configured: &str) -> String {
        configured.to_string()
    }
}
