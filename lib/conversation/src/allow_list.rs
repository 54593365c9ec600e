//! Static allow-list of conversations the service answers.
//!
//! An empty list places no restriction.

use autoreply_core::ConversationId;
use std::collections::HashSet;

/// Decides whether a conversation may be processed.
#[derive(Debug, Clone, Default)]
pub struct AllowListFilter {
    allowed: HashSet<ConversationId>,
}

impl AllowListFilter {
    /// Creates a filter from the permitted identifiers.
    #[must_use]
    pub fn new<I, T>(allowed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ConversationId>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a comma-separated list, ignoring blank entries and surrounding
    /// whitespace.
    #[must_use]
    pub fn from_csv(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty()),
        )
    }

    /// Returns true if `id` may be processed.
    #[must_use]
    pub fn is_allowed(&self, id: &ConversationId) -> bool {
        self.allowed.is_empty() || self.allowed.contains(id)
    }

    /// Returns true if the filter restricts anything at all.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        !self.allowed.is_empty()
    }
}
