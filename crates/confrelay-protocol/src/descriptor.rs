//! RPC descriptors: the message codec of a single RPC.
//!
//! The protocol crate never interprets message bytes itself. Each RPC
//! supplies a serializer for its request message and a deserializer for
//! its response message through [`RpcDescriptor`].

use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::transcode::ResponseShape;

/// Codec and naming for one RPC.
pub trait RpcDescriptor: Send + Sync {
    /// Wire path appended to the proxy URL, e.g. `/components.Apps/Create`.
    fn path(&self) -> &str;

    /// Method name, e.g. `create`. Selects the response shape.
    fn name(&self) -> &str;

    /// Serializes a transcoded request payload into message bytes.
    fn serialize(&self, payload: &Value) -> Result<Vec<u8>, CodecError>;

    /// Deserializes response message bytes into JSON.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, CodecError>;

    /// Returns the shape used to reverse wire values in responses.
    fn response_shape(&self) -> ResponseShape {
        ResponseShape::for_method(self.name())
    }
}

impl<T: RpcDescriptor + ?Sized> RpcDescriptor for &T {
    fn path(&self) -> &str {
        (**self).path()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn serialize(&self, payload: &Value) -> Result<Vec<u8>, CodecError> {
        (**self).serialize(payload)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        (**self).deserialize(bytes)
    }

    fn response_shape(&self) -> ResponseShape {
        (**self).response_shape()
    }
}

/// Returns the method segment of a wire path, lowercased.
///
/// `/components.Operations/Create` yields `create`.
pub fn method_name(path: &str) -> String {
    path.rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Descriptor for RPCs whose messages travel as JSON text.
///
/// Used for proxies that accept the JSON mapping of the messages, and for
/// inspecting payloads locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRpc {
    path: String,
    name: String,
}

impl JsonRpc {
    /// Creates a descriptor with an explicit method name.
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Creates a descriptor whose method name is taken from the path.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = method_name(&path);
        Self { path, name }
    }
}

impl RpcDescriptor for JsonRpc {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn serialize(&self, payload: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(payload).map_err(|e| CodecError::serialize(&self.path, e.to_string()))
    }

    /// An empty message decodes to an empty object.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        if bytes.is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_slice(bytes).map_err(|e| CodecError::deserialize(&self.path, e.to_string()))
    }
}
