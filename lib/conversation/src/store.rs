//! In-memory conversation history.
//!
//! Each conversation keeps at most `max_turns` turns. When an append pushes a
//! history past the bound, the oldest turns are evicted first, so the store
//! always holds the most recent suffix of the conversation in order.
//!
//! Nothing is persisted; histories live until the process exits.

use crate::message::MessageTurn;
use autoreply_core::ConversationId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

/// Default number of turns kept per conversation.
pub const MAX_TURNS: usize = 8;

/// Ordered snapshot of one conversation, oldest turn first.
pub type ConversationHistory = Vec<MessageTurn>;

/// Bounded per-conversation history shared across request handlers.
///
/// Cloning the store yields another handle to the same underlying map.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    max_turns: usize,
    histories: Arc<RwLock<HashMap<ConversationId, VecDeque<MessageTurn>>>>,
}

impl ConversationStore {
    /// Creates an empty store keeping at most `max_turns` turns per
    /// conversation. A bound of zero is raised to one.
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
            histories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Appends a turn, creating the history on first use and evicting the
    /// oldest turns past the bound.
    pub fn append(&self, id: &ConversationId, turn: MessageTurn) {
        let mut histories = self
            .histories
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let history = histories.entry(id.clone()).or_default();
        history.push_back(turn);
        while history.len() > self.max_turns {
            history.pop_front();
        }
    }

    /// Returns the current history for `id`, empty if nothing was recorded.
    #[must_use]
    pub fn get(&self, id: &ConversationId) -> ConversationHistory {
        let histories = self
            .histories
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        histories
            .get(id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of turns recorded for `id`.
    #[must_use]
    pub fn len(&self, id: &ConversationId) -> usize {
        let histories = self
            .histories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        histories.get(id).map_or(0, VecDeque::len)
    }

    /// Returns the number of conversations with at least one turn.
    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.histories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the per-conversation bound.
    #[must_use]
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(MAX_TURNS)
    }
}
