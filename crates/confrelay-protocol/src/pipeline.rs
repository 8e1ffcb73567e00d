//! Request preparation and response completion for one call.
//!
//! [`Transcoder`] composes spec selection, value transcoding, the message
//! codec and framing. It holds no per-call state and can be shared across
//! concurrent calls.

use serde_json::Value;
use tracing::debug;

use crate::descriptor::RpcDescriptor;
use crate::diagnostics::Diagnostics;
use crate::error::{ProtocolResult, SpecError};
use crate::framing::encode_body;
use crate::path::MissingPath;
use crate::registry::{SpecRegistry, TranscodeMode};
use crate::response::{HeaderSource, unwrap_response};
use crate::transcode::{ResponseShape, decode_values, encode_values};

/// Content type of the textual transport, sent as `content-type` and `accept`.
pub const GRPC_WEB_TEXT: &str = "application/grpc-web-text";

/// Returns the headers every request carries.
pub fn request_headers() -> [(&'static str, &'static str); 2] {
    [("content-type", GRPC_WEB_TEXT), ("accept", GRPC_WEB_TEXT)]
}

/// A request payload after value transcoding.
#[derive(Debug, Clone)]
pub struct TranscodedRequest {
    pub payload: Value,
    /// Number of leaves rewritten into wire form.
    pub transformed: usize,
    pub diagnostics: Diagnostics,
}

/// A request ready to be posted.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Base64 text of the framed message.
    pub body: String,
    pub transformed: usize,
    pub diagnostics: Diagnostics,
}

/// A response message after unwrapping and value reversal.
#[derive(Debug, Clone)]
pub struct FinishedResponse {
    pub value: Value,
    /// Number of wire values reversed into plain JSON.
    pub reversed: usize,
    pub diagnostics: Diagnostics,
}

/// Per-process transcoding configuration.
#[derive(Debug, Clone, Default)]
pub struct Transcoder {
    registry: SpecRegistry,
    missing: MissingPath,
}

impl Transcoder {
    /// Creates a transcoder from a spec registry.
    pub fn new(registry: SpecRegistry, missing: MissingPath) -> Self {
        Self { registry, missing }
    }

    /// Creates a transcoder with the built-in specs for `mode`.
    pub fn builtin(mode: TranscodeMode, missing: MissingPath) -> Result<Self, SpecError> {
        Ok(Self::new(SpecRegistry::builtin(mode)?, missing))
    }

    /// Returns the spec registry.
    pub fn registry(&self) -> &SpecRegistry {
        &self.registry
    }

    /// Returns the missing-path mode.
    pub fn missing_paths(&self) -> MissingPath {
        self.missing
    }

    /// Rewrites the leaves selected for `rpc` into wire form.
    pub fn transcode_request(&self, rpc: &str, mut payload: Value) -> ProtocolResult<TranscodedRequest> {
        let mut diagnostics = Diagnostics::new();
        let specs = self.registry.specs_for(rpc);
        let transformed = encode_values(&mut payload, specs, self.missing, &mut diagnostics)?;
        debug!(rpc, specs = specs.len(), transformed, "transcoded request values");
        Ok(TranscodedRequest {
            payload,
            transformed,
            diagnostics,
        })
    }

    /// Reverses wire values in a decoded response according to `shape`.
    pub fn transcode_response(&self, shape: ResponseShape, mut value: Value) -> FinishedResponse {
        let mut diagnostics = Diagnostics::new();
        let reversed = decode_values(&mut value, shape, &mut diagnostics);
        FinishedResponse {
            value,
            reversed,
            diagnostics,
        }
    }

    /// Transcodes, serializes and frames a request payload.
    pub fn prepare_request<D>(&self, descriptor: &D, payload: Value) -> ProtocolResult<PreparedRequest>
    where
        D: RpcDescriptor + ?Sized,
    {
        let transcoded = self.transcode_request(descriptor.path(), payload)?;
        let message = descriptor.serialize(&transcoded.payload)?;
        let body = encode_body(&message)?;
        debug!(
            rpc = descriptor.path(),
            message_bytes = message.len(),
            body_bytes = body.len(),
            "prepared request"
        );
        Ok(PreparedRequest {
            body,
            transformed: transcoded.transformed,
            diagnostics: transcoded.diagnostics,
        })
    }

    /// Checks status, unframes, deserializes and reverses a response.
    pub fn finish_response<D, H>(
        &self,
        descriptor: &D,
        body: &str,
        headers: &H,
    ) -> ProtocolResult<FinishedResponse>
    where
        D: RpcDescriptor + ?Sized,
        H: HeaderSource + ?Sized,
    {
        let message = unwrap_response(body, headers)?;
        let value = descriptor.deserialize(&message)?;
        let shape = descriptor.response_shape();
        let finished = self.transcode_response(shape, value);
        debug!(
            rpc = descriptor.path(),
            method = descriptor.name(),
            ?shape,
            message_bytes = message.len(),
            reversed = finished.reversed,
            "finished response"
        );
        Ok(finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::JsonRpc;
    use crate::error::{CodecError, ProtocolError};
    use crate::framing::{decode_body, decode_frame};
    use serde_json::json;

    fn transcoder() -> Transcoder {
        Transcoder::builtin(TranscodeMode::Paths, MissingPath::Lenient).unwrap()
    }

    #[test]
    fn prepare_request_frames_transcoded_message() {
        let rpc = JsonRpc::from_path("/components.Operations/Create");
        let prepared = transcoder()
            .prepare_request(&rpc, json!({"operation": {"payload": {"p": {"data": true}}}}))
            .unwrap();

        assert_eq!(prepared.transformed, 1);
        let bytes = decode_body(&prepared.body).unwrap();
        let (frame, rest) = decode_frame(&bytes).unwrap();
        assert!(rest.is_empty());
        let message: Value = serde_json::from_slice(frame.payload).unwrap();
        assert_eq!(
            message,
            json!({"operation": {"payload": {"p": {"data": {"kind": "boolValue", "boolValue": true}}}}})
        );
    }

    #[test]
    fn finish_response_reverses_by_shape() {
        let rpc = JsonRpc::from_path("/components.Operations/Get");
        let message = json!({"payload": {"p": {"data": {"kind": "numberValue", "numberValue": 2.5}}}});
        let body = encode_body(&serde_json::to_vec(&message).unwrap()).unwrap();

        let finished = transcoder().finish_response(&rpc, &body, &[("grpc-status", "0")][..]).unwrap();
        assert_eq!(finished.value, json!({"payload": {"p": {"data": 2.5}}}));
        assert_eq!(finished.reversed, 1);
        assert!(finished.diagnostics.is_empty());
    }

    #[test]
    fn finish_response_surfaces_transport_error() {
        let rpc = JsonRpc::from_path("/components.Operations/Get");
        let headers = [("grpc-status", "404"), ("grpc-message", "not found")];
        let err = transcoder().finish_response(&rpc, "", &headers[..]).unwrap_err();
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn finish_response_surfaces_codec_error() {
        let rpc = JsonRpc::from_path("/components.Operations/Get");
        let body = encode_body(b"\x01\x02").unwrap();
        let err = transcoder()
            .finish_response(&rpc, &body, &Vec::<(String, String)>::new())
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Codec(_)));
    }

    #[test]
    fn strict_mode_fails_before_serializing() {
        struct Unreachable;

        impl RpcDescriptor for Unreachable {
            fn path(&self) -> &str {
                "/x.Y/Create"
            }
            fn name(&self) -> &str {
                "create"
            }
            fn serialize(&self, _: &Value) -> Result<Vec<u8>, CodecError> {
                panic!("serialize called after a strict miss")
            }
            fn deserialize(&self, _: &[u8]) -> Result<Value, CodecError> {
                unreachable!()
            }
        }

        let mut registry = SpecRegistry::new();
        registry.register("/x.Y/Create", ["spec.data"]).unwrap();
        let transcoder = Transcoder::new(registry, MissingPath::Strict);

        let err = transcoder.prepare_request(&Unreachable, json!({})).unwrap_err();
        assert!(matches!(err, ProtocolError::Path(_)));
    }

    #[test]
    fn unregistered_rpc_in_allow_list_mode_is_untouched() {
        let transcoder = Transcoder::builtin(TranscodeMode::AllowList, MissingPath::Strict).unwrap();
        let payload = json!({"operation": {"payload": {"p": {"data": 1}}}});
        let transcoded = transcoder.transcode_request("/components.Apps/Create", payload.clone()).unwrap();
        assert_eq!(transcoded.payload, payload);
        assert_eq!(transcoded.transformed, 0);
    }

    #[test]
    fn request_headers_use_text_transport() {
        assert_eq!(
            request_headers(),
            [("content-type", GRPC_WEB_TEXT), ("accept", GRPC_WEB_TEXT)]
        );
    }
}
