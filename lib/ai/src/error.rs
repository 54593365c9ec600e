//! Error types for the AI crate.
//!
//! Completion failures are classified into the three outcomes callers act
//! on: the server was too slow, the server could not be reached, or the
//! server answered with something that is not a usable completion.

use std::fmt;

/// Errors from completion backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// No response within the configured window.
    Timeout,
    /// The inference server could not be reached.
    Unreachable { reason: String },
    /// Non-success status, undecodable body, or an empty completion.
    InvalidResponse { reason: String },
    /// The client could not be constructed.
    InvalidConfig { reason: String },
}

impl LlmError {
    /// Classifies a transport error reported by reqwest.
    #[must_use]
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() || err.is_body() {
            Self::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            Self::Unreachable {
                reason: err.to_string(),
            }
        }
    }

    /// Short, stable name of the failure class.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unreachable { .. } => "unreachable",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "inference server timed out"),
            Self::Unreachable { reason } => {
                write!(f, "inference server unreachable: {reason}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid completion response: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid completion client configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for LlmError {}
