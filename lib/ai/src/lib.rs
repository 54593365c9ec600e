//! Chat-completion primitives for the autoreply service.
//!
//! The service speaks the OpenAI chat-completion protocol to a locally
//! hosted inference server (LM Studio and friends). This crate provides:
//!
//! - **Backend trait**: one completion for one conversation history
//! - **OpenAI-compatible client**: the reqwest implementation of that trait
//! - **Model resolution**: mapping `auto` onto whatever model the server has
//!   loaded

pub mod backend;
pub mod error;
pub mod models;
pub mod openai;

pub use backend::{
    ChatMessage, ChatRole, CompletionBackend, CompletionRequest, ModelParams, SYSTEM_PROMPT,
};
pub use error::LlmError;
pub use models::ModelResolver;
pub use openai::OpenAiCompatClient;
