use std::fmt;

use serde::Serialize;

/// Shared error type used across all relay crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Token exchange failed (non-2xx, transport error or timeout).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Remote agent session creation failed.
    #[error("session creation failed: {0}")]
    Session(String),

    /// Message send failed.
    #[error("message sending failed: {0}")]
    Message(String),

    /// The remote API rejected the bearer token (HTTP 401) on a message send.
    /// Consumed by the session's single refresh-and-resend; only surfaces
    /// when that path is bypassed.
    #[error("access token expired: {0}")]
    TokenExpired(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error classification carried to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "AuthError")]
    Auth,
    #[serde(rename = "SessionError")]
    Session,
    #[serde(rename = "MessageError")]
    Message,
    TokenExpired,
    InvalidRequest,
    UnknownOperation,
    #[serde(rename = "ConfigError")]
    Config,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "AuthError",
            Self::Session => "SessionError",
            Self::Message => "MessageError",
            Self::TokenExpired => "TokenExpired",
            Self::InvalidRequest => "InvalidRequest",
            Self::UnknownOperation => "UnknownOperation",
            Self::Config => "ConfigError",
            Self::Internal => "InternalError",
        }
    }

    /// True for failures caused by the caller's input rather than by a
    /// remote call or the relay itself.
    pub fn is_client_error(self) -> bool {
        matches!(self, Self::InvalidRequest | Self::UnknownOperation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Session(_) => ErrorKind::Session,
            Self::Message(_) => ErrorKind::Message,
            Self::TokenExpired(_) => ErrorKind::TokenExpired,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::UnknownOperation(_) => ErrorKind::UnknownOperation,
            Self::Config(_) => ErrorKind::Config,
            Self::Json(_) => ErrorKind::Internal,
        }
    }
}
