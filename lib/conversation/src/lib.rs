//! Conversation memory for the autoreply service.
//!
//! This crate provides:
//!
//! - **Message turns**: role-tagged text contributed by either party
//! - **Conversation store**: bounded, per-conversation history kept in memory
//! - **Allow-list**: the static filter deciding which conversations are served

pub mod allow_list;
pub mod message;
pub mod store;

pub use allow_list::AllowListFilter;
pub use message::{MessageTurn, TurnRole};
pub use store::{ConversationHistory, ConversationStore, MAX_TURNS};
