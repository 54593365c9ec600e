//! Domain error types for server operations.
//!
//! `ReplyError` is the failure side of answering one inbound message. It is
//! converted into a stable, user-safe HTTP body: the `message` field stays
//! empty so automation clients relay nothing, and `error` names the failure
//! class. Internal reasons are logged, never returned.

use autoreply_ai::LlmError;
use autoreply_core::ConversationId;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Errors from answering an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// The conversation is not on the allow-list.
    NotPermitted { id: ConversationId },
    /// The inference server did not answer in time.
    Timeout,
    /// The inference server could not be reached.
    Unreachable { reason: String },
    /// The inference server answered without a usable completion.
    InvalidResponse { reason: String },
}

impl ReplyError {
    /// Stable failure code exposed to callers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotPermitted { .. } => "not_permitted",
            Self::Timeout => "timeout",
            Self::Unreachable { .. } => "unreachable",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotPermitted { .. } => StatusCode::FORBIDDEN,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Unreachable { .. } | Self::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPermitted { id } => {
                write!(f, "conversation '{id}' is not permitted")
            }
            Self::Timeout => write!(f, "inference server timed out"),
            Self::Unreachable { reason } => {
                write!(f, "inference server unreachable: {reason}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid completion response: {reason}")
            }
        }
    }
}

impl std::error::Error for ReplyError {}

impl From<LlmError> for ReplyError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => Self::Timeout,
            LlmError::Unreachable { reason } | LlmError::InvalidConfig { reason } => {
                Self::Unreachable { reason }
            }
            LlmError::InvalidResponse { reason } => Self::InvalidResponse { reason },
        }
    }
}

/// Body returned for a failed reply.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: &'static str,
    pub error: &'static str,
}

impl IntoResponse for ReplyError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: "",
            error: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Errors that stop the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// The completion client could not be built.
    Client { reason: String },
    /// The listener could not be bound.
    Bind { addr: String, reason: String },
    /// The server stopped with an I/O error.
    Serve { reason: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client { reason } => {
                write!(f, "failed to build completion client: {reason}")
            }
            Self::Bind { addr, reason } => {
                write!(f, "failed to bind {addr}: {reason}")
            }
            Self::Serve { reason } => write!(f, "server error: {reason}"),
        }
    }
}

impl std::error::Error for StartupError {}
