//! Reply orchestration.
//!
//! Answering one inbound message runs through these states:
//!
//! 1. Filtering: conversations off the allow-list are rejected before any
//!    state is touched.
//! 2. Recording the user turn.
//! 3. Completing: the model is resolved first, then the backend sees the
//!    stored history, including the turn just recorded, under
//!    `request_timeout`. No store lock is held while waiting.
//! 4. Recording the assistant turn, then returning the reply.
//!
//! A failed completion leaves the user turn in place; the next message in
//! that conversation is answered with the unanswered turn still in context.
//! Each inbound message makes exactly one completion attempt.

use crate::error::ReplyError;
use autoreply_ai::{CompletionBackend, ModelParams};
use autoreply_conversation::{AllowListFilter, ConversationStore, MessageTurn};
use autoreply_core::ConversationId;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Turns inbound messages into model replies.
pub struct ReplyOrchestrator {
    store: ConversationStore,
    allow_list: AllowListFilter,
    backend: Arc<dyn CompletionBackend>,
    params: ModelParams,
}

impl ReplyOrchestrator {
    /// Creates an orchestrator over an explicitly constructed store.
    #[must_use]
    pub fn new(
        store: ConversationStore,
        allow_list: AllowListFilter,
        backend: Arc<dyn CompletionBackend>,
        params: ModelParams,
    ) -> Self {
        Self {
            store,
            allow_list,
            backend,
            params,
        }
    }

    /// Answers `text` sent in conversation `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::NotPermitted`] for conversations off the
    /// allow-list, and the completion failure class otherwise.
    #[instrument(skip(self, text), fields(conversation_id = %id))]
    pub async fn handle_incoming(
        &self,
        id: &ConversationId,
        text: &str,
    ) -> Result<String, ReplyError> {
        if !self.allow_list.is_allowed(id) {
            debug!("Ignoring message from conversation off the allow-list");
            return Err(ReplyError::NotPermitted { id: id.clone() });
        }

        self.store.append(id, MessageTurn::user(text));
        let history = self.store.get(id);

        let model = self.backend.active_model(&self.params.model).await;
        let params = self.params.clone().with_model(model);

        let completion = self.backend.complete(&history, &params);
        let reply = match tokio::time::timeout(params.request_timeout, completion).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(error = %e, turns = history.len(), "Completion failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout = ?params.request_timeout, "Completion timed out");
                return Err(ReplyError::Timeout);
            }
        };

        self.store.append(id, MessageTurn::assistant(reply.clone()));
        Ok(reply)
    }

    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    #[must_use]
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    #[must_use]
    pub fn backend(&self) -> &dyn CompletionBackend {
        self.backend.as_ref()
    }
}
