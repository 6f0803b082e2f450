//! Typed errors for client-side chat operations.
//!
//! Every network operation distinguishes a transport failure (no response)
//! from an application failure (response received, non-success payload).
//! Nothing here retries; a retry is always a user-initiated repeat of the
//! action.

use std::fmt;

use serde_json::Value;

/// Categories of client errors for consistent handling at the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Input rejected before any request was issued (empty user ID or message)
    Validation,
    /// An exclusive slot is already occupied (a reply is still streaming)
    Busy,
    /// Response received with a non-success status or payload
    Remote,
    /// Network or stream failure with no usable response
    Transport,
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientErrorKind::Validation => write!(f, "validation"),
            ClientErrorKind::Busy => write!(f, "busy"),
            ClientErrorKind::Remote => write!(f, "remote"),
            ClientErrorKind::Transport => write!(f, "transport"),
        }
    }
}

/// Structured client error with kind and details.
#[derive(Debug, Clone)]
pub struct ClientError {
    /// Error category
    pub kind: ClientErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional context (e.g., raw error body), for diagnostics only
    pub details: Option<String>,
}

impl ClientError {
    /// Creates a new client error.
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates a validation error (correctable by the user).
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Validation, message)
    }

    /// Creates a busy error (an exclusive slot is occupied).
    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Busy, message)
    }

    /// Creates a remote error from a non-success HTTP response.
    ///
    /// The server's `{"error": "..."}` payload is surfaced verbatim when
    /// present; otherwise the HTTP status line is the message and the raw
    /// body is kept as details.
    pub fn remote(status: u16, body: &str) -> Self {
        if let Ok(json) = serde_json::from_str::<Value>(body)
            && let Some(msg) = json.get("error").and_then(|v| v.as_str())
            && !msg.is_empty()
        {
            return Self {
                kind: ClientErrorKind::Remote,
                message: msg.to_string(),
                details: Some(format!("HTTP {status}")),
            };
        }
        Self {
            kind: ClientErrorKind::Remote,
            message: format!("HTTP {status}"),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates a remote error from an application-level failure payload
    /// delivered with a 2xx status (e.g. `{"success": false}`).
    pub fn remote_payload(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Remote, message)
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transport, message)
    }

    /// Classifies a reqwest error as a transport failure.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timed out: {err}")
        } else if err.is_connect() {
            format!("Connection failed: {err}")
        } else {
            format!("Network error: {err}")
        };
        Self::new(ClientErrorKind::Transport, message)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ClientError {}

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
