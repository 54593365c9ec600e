//! Core types shared across the autoreply workspace.
//!
//! This crate provides the identifier types for conversations and inbound
//! requests, plus the rootcause-based `Result` alias used at the edges of
//! the service.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationId, ReplyId};
