//! Client-side cache of a user's conversation summaries.
//!
//! The cache is replaced wholesale on every refresh; there is no merge
//! logic. When two refreshes overlap, whichever response resolves last wins
//! the whole mapping, so correctness never depends on issue order.

use std::collections::HashSet;

use tracing::debug;

use crate::api::ChatApiClient;
use crate::api::types::ConversationSummary;
use crate::error::ClientResult;

/// Cached conversation summaries, keyed by session ID.
#[derive(Debug, Default)]
pub struct ConversationStore {
    summaries: Vec<ConversationSummary>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached summaries wholesale.
    ///
    /// Server order is preserved. Duplicate session IDs keep the first
    /// occurrence, so the mapping holds at most one summary per session.
    pub fn install(&mut self, summaries: Vec<ConversationSummary>) {
        let mut seen = HashSet::new();
        self.summaries = summaries
            .into_iter()
            .filter(|summary| seen.insert(summary.session_id.clone()))
            .collect();
    }

    /// Fetches the full listing for a user and installs it.
    ///
    /// # Errors
    /// Returns the underlying API error; the cached mapping is untouched on
    /// failure.
    pub async fn refresh(&mut self, api: &ChatApiClient, user_id: &str) -> ClientResult<()> {
        let summaries = api.list_conversations(user_id).await?;
        debug!(count = summaries.len(), "conversation summaries refreshed");
        self.install(summaries);
        Ok(())
    }

    /// Cached summaries in server-provided order. Empty is a normal state.
    pub fn list(&self) -> &[ConversationSummary] {
        &self.summaries
    }

    pub fn get(&self, session_id: &str) -> Option<&ConversationSummary> {
        self.summaries.iter().find(|s| s.session_id == session_id)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn clear(&mut self) {
        self.summaries.clear();
    }
}
