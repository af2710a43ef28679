// Error handling module
// Defines the error type shared by the API clients and the stores

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the auth and user API clients
#[derive(Error, Debug)]
pub enum AuthError {
    /// Backend answered with a non-2xx status; message is the raw body
    #[error("{body}")]
    Http { status: u16, body: String },

    /// GraphQL response carried errors or no data for the operation
    #[error("{0}")]
    GraphQl(String),

    /// Refresh requested but no refresh token is stored
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// Request never produced a response (connect, timeout, body)
    #[error("HTTP request failed: {source} (kind: {kind})")]
    Transport {
        kind: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Response body was not the expected JSON shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Token storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// HTTP status of the failed response, if the backend answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AuthError::Http { status, .. } => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }

    /// True for 401 responses
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// True for 401 and 403 responses
    pub fn is_rejected_credentials(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }

    /// True when a backend response mentions "session".
    ///
    /// Backends signal an expired session only through the message text,
    /// so this is a plain substring match on the HTTP body or the GraphQL
    /// error messages. Local and transport failures never match.
    pub fn is_session_error(&self) -> bool {
        match self {
            AuthError::Http { body, .. } => body.contains("session"),
            AuthError::GraphQl(message) => message.contains("session"),
            _ => false,
        }
    }

    /// User-facing message provided by the server, if any.
    ///
    /// Looks for a `message` field first and falls back to Django REST
    /// framework's `detail` field. Non-JSON bodies yield `None`.
    pub fn server_message(&self) -> Option<String> {
        let body = match self {
            AuthError::Http { body, .. } => body,
            _ => return None,
        };

        let json: serde_json::Value = serde_json::from_str(body).ok()?;
        ["message", "detail"]
            .iter()
            .find_map(|key| json.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Storage(err.to_string())
    }
}

/// Result type alias for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;
