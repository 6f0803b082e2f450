//! Session lifecycle and orchestration.
//!
//! `SessionController` owns all cross-operation state: the signed-in user,
//! the current session pointer, the message transcript, the conversation
//! store and the single in-flight reply slot. One owner, one writer -- the
//! ordering invariants (one send per session, orphaning on switch) are
//! enforced here rather than with locks.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ChatApiClient;
use crate::api::types::{ConversationSummary, HistoryMessage};
use crate::error::{ClientError, ClientResult};
use crate::reply::{ReplyStream, ReplyTicket};
use crate::store::ConversationStore;

/// Fixed assistant line shown when a reply fails. Partial or garbled output
/// is worse than an explicit failure notice, so the accumulated text is
/// dropped in favor of this.
pub const REPLY_FALLBACK_TEXT: &str =
    "I'm sorry, I encountered an error processing your request. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Maps a wire history entry. Unknown kinds (e.g. `system`) are skipped.
    pub fn from_wire(info: &HistoryMessage) -> Option<Self> {
        match info.kind.as_str() {
            "human" => Some(Self::user(info.content.clone())),
            "ai" => Some(Self::assistant(info.content.clone())),
            _ => None,
        }
    }
}

/// Owner of the current user/session identity and orchestrator of all
/// state-changing operations against the chat service.
pub struct SessionController {
    api: ChatApiClient,
    user_id: Option<String>,
    current_session: Option<String>,
    messages: Vec<Message>,
    store: ConversationStore,
    input_enabled: bool,
    /// Monotonic send counter; tickets minted before the latest orphaning
    /// or send no longer match and their results are discarded.
    reply_generation: u64,
    /// Cancellation handle of the in-flight reply, if one is streaming.
    active_reply: Option<CancellationToken>,
}

impl SessionController {
    pub fn new(api: ChatApiClient) -> Self {
        Self {
            api,
            user_id: None,
            current_session: None,
            messages: Vec::new(),
            store: ConversationStore::new(),
            input_enabled: false,
            reply_generation: 0,
            active_reply: None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn current_session(&self) -> Option<&str> {
        self.current_session.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        self.store.list()
    }

    /// Whether the send affordance should be offered. Disabled until a
    /// session is joined and while a reply is streaming.
    pub fn input_enabled(&self) -> bool {
        self.input_enabled && !self.is_streaming()
    }

    pub fn is_streaming(&self) -> bool {
        self.active_reply.is_some()
    }

    /// Signs in and immediately starts a fresh conversation.
    ///
    /// Concurrent logins cannot arise: the exclusive borrow serializes
    /// callers, which is the reject-while-busy policy enforced structurally.
    ///
    /// # Errors
    /// `Validation` for an empty user ID; otherwise whatever the refresh or
    /// session start surfaces.
    pub async fn login(&mut self, user_id: &str) -> ClientResult<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ClientError::validation("User ID is required"));
        }

        self.user_id = Some(user_id.to_string());
        debug!(user_id, "signed in");

        self.store.refresh(&self.api, user_id).await?;
        self.start_or_join("").await
    }

    /// Starts a new session (empty `session_id`) or joins an existing one.
    ///
    /// On success the server-returned ID becomes current, the history is
    /// reloaded wholesale and input is enabled. On failure the prior
    /// session is left untouched.
    ///
    /// # Errors
    /// `Remote` / `Transport` from the start call or the history reload.
    pub async fn start_or_join(&mut self, session_id: &str) -> ClientResult<()> {
        let user_id = self.require_user()?.to_string();
        let response = self.api.start_chat(&user_id, session_id).await?;

        self.current_session = Some(response.session_id);
        self.input_enabled = true;
        self.load_history().await
    }

    /// Sends a message in the current session, binding a fresh reply stream.
    ///
    /// The user message is appended optimistically before the request is
    /// issued; it stays visible even when the send fails. The caller drives
    /// the returned stream and then reports the outcome through
    /// [`complete_reply`](Self::complete_reply) or
    /// [`fail_reply`](Self::fail_reply).
    ///
    /// # Errors
    /// `Validation` for empty text or no current session, `Busy` while a
    /// reply is already streaming. A request failure appends the fallback
    /// assistant line and surfaces the underlying error.
    pub async fn send_message(&mut self, text: &str) -> ClientResult<ReplyStream> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::validation("Message is required"));
        }
        let user_id = self.require_user()?.to_string();
        let Some(session_id) = self.current_session.clone() else {
            return Err(ClientError::validation("No active conversation"));
        };
        if self.active_reply.is_some() {
            return Err(ClientError::busy("A reply is already streaming"));
        }

        self.messages.push(Message::user(text));

        let bytes = match self.api.stream_message(&user_id, &session_id, text).await {
            Ok(bytes) => bytes,
            Err(err) => {
                // Zero chunks arrived; show the failure notice in place of
                // a reply while keeping the optimistic user message.
                self.messages.push(Message::assistant(REPLY_FALLBACK_TEXT));
                return Err(err);
            }
        };

        let cancel = CancellationToken::new();
        self.reply_generation += 1;
        let ticket = ReplyTicket(self.reply_generation);
        self.active_reply = Some(cancel.clone());

        Ok(ReplyStream::new(bytes, ticket, cancel))
    }

    /// Records a completed reply: appends the assistant message and
    /// resynchronizes the conversation listing.
    ///
    /// A stale ticket (the session changed since the send) is discarded
    /// silently -- the orphaned reply must not write into the new session.
    ///
    /// # Errors
    /// Whatever the conversations refresh surfaces.
    pub async fn complete_reply(&mut self, ticket: ReplyTicket, text: &str) -> ClientResult<()> {
        if !self.is_current_reply(ticket) {
            debug!("discarding completion of an orphaned reply");
            return Ok(());
        }
        self.active_reply = None;
        self.messages.push(Message::assistant(text));

        let user_id = self.require_user()?.to_string();
        self.store.refresh(&self.api, &user_id).await
    }

    /// Records a failed reply: drops the partial text and appends the fixed
    /// fallback assistant line. Stale tickets are discarded silently.
    pub fn fail_reply(&mut self, ticket: ReplyTicket) {
        if !self.is_current_reply(ticket) {
            debug!("discarding failure of an orphaned reply");
            return;
        }
        self.active_reply = None;
        self.messages.push(Message::assistant(REPLY_FALLBACK_TEXT));
    }

    /// Switches to another conversation. A no-op when already current.
    ///
    /// Any in-flight reply is orphaned first: its stream stops yielding and
    /// its eventual completion no longer matches the ticket check.
    ///
    /// # Errors
    /// `Remote` / `Transport` from the history reload.
    pub async fn switch_conversation(&mut self, session_id: &str) -> ClientResult<()> {
        if self.current_session.as_deref() == Some(session_id) {
            return Ok(());
        }

        self.orphan_active_reply();
        self.current_session = Some(session_id.to_string());
        self.input_enabled = true;
        self.load_history().await
    }

    /// Deletes a conversation. Call only after the confirmation flow has
    /// produced the target.
    ///
    /// Deleting the current session starts a replacement session before the
    /// summaries refresh, so the controller never ends up without a current
    /// session.
    ///
    /// # Errors
    /// `Remote` when the server reports `success: false`; otherwise
    /// `Remote` / `Transport` from the involved calls.
    pub async fn delete_conversation(&mut self, session_id: &str) -> ClientResult<()> {
        let user_id = self.require_user()?.to_string();
        self.api.delete_conversation(&user_id, session_id).await?;

        if self.current_session.as_deref() == Some(session_id) {
            self.orphan_active_reply();
            self.start_or_join("").await?;
        }

        self.store.refresh(&self.api, &user_id).await
    }

    /// Clears identity, session, transcript and cached summaries. Any
    /// in-flight reply is orphaned.
    pub fn sign_out(&mut self) {
        self.orphan_active_reply();
        self.user_id = None;
        self.current_session = None;
        self.messages.clear();
        self.store.clear();
        self.input_enabled = false;
        debug!("signed out");
    }

    /// Replaces the transcript with the server-side history of the current
    /// session.
    async fn load_history(&mut self) -> ClientResult<()> {
        let user_id = self.require_user()?.to_string();
        let Some(session_id) = self.current_session.clone() else {
            return Err(ClientError::validation("No active conversation"));
        };

        let history = self.api.chat_history(&user_id, &session_id).await?;
        self.messages = history.iter().filter_map(Message::from_wire).collect();
        Ok(())
    }

    fn is_current_reply(&self, ticket: ReplyTicket) -> bool {
        self.active_reply.is_some() && ticket.0 == self.reply_generation
    }

    fn orphan_active_reply(&mut self) {
        if let Some(cancel) = self.active_reply.take() {
            cancel.cancel();
            self.reply_generation += 1;
            debug!("orphaned in-flight reply");
        }
    }

    fn require_user(&self) -> ClientResult<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| ClientError::validation("Not signed in"))
    }
}
