//! Client error types.

use std::fmt;

use confrelay_protocol::{ProtocolError, SpecError};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// IO error.
    Io(std::io::Error),
    /// Transcoding, framing or proxy-reported failure.
    Protocol(ProtocolError),
    /// Connection to the proxy failed.
    Connection(String),
    /// The proxy answered with a non-success HTTP status.
    Http { status: u16, body: String },
    /// Authentication required.
    AuthRequired(String),
    /// Request timed out.
    Timeout(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Protocol(err) => write!(f, "{}", err),
            Self::Connection(msg) => write!(f, "connection error: {}", msg),
            Self::Http { status, body } if body.is_empty() => write!(f, "HTTP error ({})", status),
            Self::Http { status, body } => write!(f, "HTTP error ({}): {}", status, body),
            Self::AuthRequired(msg) => write!(f, "authentication required: {}", msg),
            Self::Timeout(msg) => write!(f, "timeout: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Protocol(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}

impl From<SpecError> for ClientError {
    fn from(err: SpecError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("invalid JSON: {}", err))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout("request to proxy timed out".to_string())
        } else if err.is_connect() {
            Self::Connection(format!("connection failed: {}", err))
        } else {
            Self::Connection(format!("request failed: {}", err))
        }
    }
}
