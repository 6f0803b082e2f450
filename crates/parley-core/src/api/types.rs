//! Wire types for the chat service HTTP API.

use serde::{Deserialize, Serialize};

/// Body for `POST /api/chat/start`.
#[derive(Debug, Serialize)]
pub struct StartChatRequest<'a> {
    #[serde(rename = "userID")]
    pub user_id: &'a str,
    /// Empty string asks the server to mint a new session.
    #[serde(rename = "sessionID")]
    pub session_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct StartChatResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(default)]
    pub success: bool,
}

/// Body for `POST /api/chat/stream`.
#[derive(Debug, Serialize)]
pub struct StreamMessageRequest<'a> {
    #[serde(rename = "userID")]
    pub user_id: &'a str,
    #[serde(rename = "sessionID")]
    pub session_id: &'a str,
    pub message: &'a str,
}

/// One entry of the conversations listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConversationSummary {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(rename = "messageCount", default)]
    pub message_count: u64,
}

/// Response of `GET /api/user/conversations`.
///
/// The server serializes an empty listing as `null`, not `[]`.
#[derive(Debug, Deserialize)]
pub struct ListConversationsResponse {
    #[serde(default)]
    pub conversations: Option<Vec<ConversationSummary>>,
}

/// One history entry; `type` is `human`, `ai` or `system`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

/// Response of `GET /api/chat/history`.
#[derive(Debug, Deserialize)]
pub struct ChatHistoryResponse {
    #[serde(default)]
    pub messages: Option<Vec<HistoryMessage>>,
}

/// Body for `POST /api/chat/delete`.
#[derive(Debug, Serialize)]
pub struct DeleteConversationRequest<'a> {
    #[serde(rename = "userID")]
    pub user_id: &'a str,
    #[serde(rename = "sessionID")]
    pub session_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct DeleteConversationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}
