//! HTTP client for the chat service.
//!
//! Thin typed wrapper over the five endpoints of the chat API. Transport
//! failures and non-success responses are classified into `ClientError`
//! kinds here; nothing at this layer retries.

pub mod types;

use futures_util::TryStreamExt;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::reply::ReplyByteStream;
use types::{
    ChatHistoryResponse, ConversationSummary, DeleteConversationRequest,
    DeleteConversationResponse, HistoryMessage, ListConversationsResponse, StartChatRequest,
    StartChatResponse, StreamMessageRequest,
};

/// Standard User-Agent header for parley API requests.
pub const USER_AGENT: &str = concat!("parley/", env!("CARGO_PKG_VERSION"));

/// Chat service API client.
pub struct ChatApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ChatApiClient {
    /// Creates a client for the service at `base_url` (trailing slash tolerated).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a new session (empty `session_id`) or joins an existing one.
    ///
    /// # Errors
    /// `Transport` when the request never got a response, `Remote` for a
    /// non-2xx status.
    pub async fn start_chat(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> ClientResult<StartChatResponse> {
        let url = format!("{}/api/chat/start", self.base_url);
        let request = StartChatRequest {
            user_id,
            session_id,
        };
        let response = self
            .http
            .post(&url)
            .header("user-agent", USER_AGENT)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&e))?;
        let response = check_status(response).await?;
        let parsed: StartChatResponse = read_json(response).await?;
        debug!(session_id = %parsed.session_id, "chat session started");
        Ok(parsed)
    }

    /// Opens the streaming reply request for one message.
    ///
    /// The returned byte stream is the raw chunked response body; fragments
    /// concatenated in arrival order form the assistant's reply.
    ///
    /// # Errors
    /// `Transport` when the request never got a response, `Remote` for a
    /// non-2xx status (the body carries no contract in that case).
    pub async fn stream_message(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> ClientResult<ReplyByteStream> {
        let url = format!("{}/api/chat/stream", self.base_url);
        let request = StreamMessageRequest {
            user_id,
            session_id,
            message,
        };
        let response = self
            .http
            .post(&url)
            .header("user-agent", USER_AGENT)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&e))?;
        let response = check_status(response).await?;
        debug!(session_id, "reply stream opened");
        Ok(Box::pin(
            response
                .bytes_stream()
                .map_err(|e| ClientError::from_reqwest(&e)),
        ))
    }

    /// Fetches the full conversations listing for a user.
    ///
    /// An empty (or `null`) listing is a normal state, not an error.
    ///
    /// # Errors
    /// `Transport` / `Remote` as for the other endpoints.
    pub async fn list_conversations(
        &self,
        user_id: &str,
    ) -> ClientResult<Vec<ConversationSummary>> {
        let url = format!("{}/api/user/conversations", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("user-agent", USER_AGENT)
            .query(&[("userID", user_id)])
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&e))?;
        let response = check_status(response).await?;
        let parsed: ListConversationsResponse = read_json(response).await?;
        Ok(parsed.conversations.unwrap_or_default())
    }

    /// Fetches the message history of one session.
    ///
    /// # Errors
    /// `Transport` / `Remote` as for the other endpoints.
    pub async fn chat_history(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> ClientResult<Vec<HistoryMessage>> {
        let url = format!("{}/api/chat/history", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("user-agent", USER_AGENT)
            .query(&[("userID", user_id), ("sessionID", session_id)])
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&e))?;
        let response = check_status(response).await?;
        let parsed: ChatHistoryResponse = read_json(response).await?;
        Ok(parsed.messages.unwrap_or_default())
    }

    /// Deletes a conversation.
    ///
    /// # Errors
    /// A `success: false` payload is an application failure; the server's
    /// error message is surfaced verbatim when present.
    pub async fn delete_conversation(&self, user_id: &str, session_id: &str) -> ClientResult<()> {
        let url = format!("{}/api/chat/delete", self.base_url);
        let request = DeleteConversationRequest {
            user_id,
            session_id,
        };
        let response = self
            .http
            .post(&url)
            .header("user-agent", USER_AGENT)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&e))?;
        let response = check_status(response).await?;
        let parsed: DeleteConversationResponse = read_json(response).await?;
        if parsed.success {
            debug!(session_id, "conversation deleted");
            Ok(())
        } else {
            Err(ClientError::remote_payload(
                parsed
                    .error
                    .unwrap_or_else(|| "Failed to delete conversation".to_string()),
            ))
        }
    }
}

/// Maps a non-success status to a remote error carrying the body payload.
async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::remote(status.as_u16(), &body))
}

/// Reads a JSON body, treating a garbled body as a stream failure.
async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::transport(format!("Invalid response body: {e}")))
}
