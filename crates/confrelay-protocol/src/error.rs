//! Protocol error types.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while transcoding, framing or unwrapping a call.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The proxy reported a failed call through its status header or trailer.
    ///
    /// Displays the proxy message only, so callers can surface it verbatim.
    #[error("{message}")]
    Transport { status: u32, message: String },

    /// The frame header declares more payload than the body carries.
    #[error("frame declares {declared} payload bytes but only {available} are available")]
    FrameBounds { declared: usize, available: usize },

    /// The body ended before a complete 5-byte frame header.
    #[error("incomplete frame header: expected 5 bytes, got {received}")]
    IncompleteHeader { received: usize },

    /// Payload does not fit in a 32-bit length prefix.
    #[error("message too large: {size} bytes (max: {max})", max = u32::MAX)]
    MessageTooLarge { size: usize },

    /// A second data frame followed the first one.
    #[error("streamed responses with multiple data frames are not supported")]
    UnsupportedStreaming,

    /// The response body is not valid base64.
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A path spec failed to parse or, in strict mode, did not match.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The external message serializer or deserializer failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors raised by the path resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The spec string is empty or contains an empty segment.
    #[error("invalid path spec {spec:?}: {reason}")]
    InvalidSpec { spec: String, reason: String },

    /// Strict mode: the spec addressed a location that does not exist.
    #[error("path spec {spec:?} has no match at {at:?}")]
    Missing { spec: String, at: String },
}

/// Errors raised while building a spec registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// A spec in the set failed to parse.
    #[error(transparent)]
    Invalid(#[from] PathError),

    /// Two specs in the same set may address the same location.
    #[error("path specs {first:?} and {second:?} overlap for rpc {rpc:?}")]
    Overlap {
        rpc: String,
        first: String,
        second: String,
    },
}

/// Failure reported by an external message codec.
#[derive(Debug, Error)]
#[error("{rpc}: failed to {direction} message: {message}")]
pub struct CodecError {
    rpc: String,
    direction: &'static str,
    message: String,
}

impl CodecError {
    /// Creates an error for a failed request serialization.
    pub fn serialize(rpc: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rpc: rpc.into(),
            direction: "serialize",
            message: message.into(),
        }
    }

    /// Creates an error for a failed response deserialization.
    pub fn deserialize(rpc: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rpc: rpc.into(),
            direction: "deserialize",
            message: message.into(),
        }
    }

    /// Returns the wire path of the RPC that failed.
    pub fn rpc(&self) -> &str {
        &self.rpc
    }
}

impl ProtocolError {
    /// Returns the proxy status code if this is a transport error.
    pub fn status(&self) -> Option<u32> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_displays_proxy_message() {
        let err = ProtocolError::Transport {
            status: 404,
            message: "not found".into(),
        };
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn codec_error_names_rpc_and_direction() {
        let err = CodecError::deserialize("/components.Apps/List", "truncated");
        assert_eq!(
            err.to_string(),
            "/components.Apps/List: failed to deserialize message: truncated"
        );
        assert_eq!(err.rpc(), "/components.Apps/List");
    }
}
