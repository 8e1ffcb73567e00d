//! Value transcoding and grpc-web-text framing for confrelay.
//!
//! Configuration objects are plain JSON, but the remote service stores
//! free-form values as a tagged union ("wire values"). This crate rewrites
//! the selected leaves of a request into that representation, frames the
//! serialized message for the textual transport, and reverses both steps on
//! the response.
//!
//! # Wire Overview
//!
//! Each message travels in one frame, base64-encoded in the HTTP body:
//! - 1 byte: flag (`0x00` data, `0x80` trailer)
//! - 4 bytes: payload length (u32, big-endian)
//! - N bytes: serialized message
//!
//! Call status is reported through the `grpc-status` and `grpc-message`
//! headers, or in a trailer frame after the data frame.
//!
//! # Example
//!
//! ```rust
//! use confrelay_protocol::{JsonRpc, MissingPath, TranscodeMode, Transcoder};
//! use serde_json::json;
//!
//! let transcoder = Transcoder::builtin(TranscodeMode::Paths, MissingPath::Lenient).unwrap();
//! let rpc = JsonRpc::from_path("/components.Operations/Create");
//! let request = transcoder
//!     .prepare_request(&rpc, json!({"operation": {"payload": {"msg": {"data": "hi"}}}}))
//!     .unwrap();
//! assert_eq!(request.transformed, 1);
//! ```

mod descriptor;
mod diagnostics;
mod error;
mod framing;
mod path;
mod pipeline;
mod registry;
mod response;
mod transcode;
mod value;

pub use descriptor::{JsonRpc, RpcDescriptor, method_name};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{CodecError, PathError, ProtocolError, ProtocolResult, SpecError};
pub use framing::{
    DATA_FLAG, Frame, FrameReader, HEADER_LEN, TRAILER_FLAG, decode_body, decode_frame, encode_body,
    encode_frame, encode_frame_with_flag,
};
pub use path::{MissingPath, PathSpec, Segment, WILDCARD, resolve, resolve_all};
pub use pipeline::{
    FinishedResponse, GRPC_WEB_TEXT, PreparedRequest, TranscodedRequest, Transcoder, request_headers,
};
pub use registry::{
    ALLOW_LIST_RPCS, ALLOW_LIST_SPECS, DEFAULT_SPECS, SpecRegistry, SpecSet, TranscodeMode,
};
pub use response::{
    ERROR_STATUS_THRESHOLD, FALLBACK_MESSAGE, HeaderSource, MESSAGE_HEADER, STATUS_HEADER, Trailer,
    check_status, unwrap_response,
};
pub use transcode::{ResponseShape, decode_values, encode_values};
pub use value::{
    KIND_FIELD, Kind, MAX_EXACT_INTEGER, NULL_VALUE, WireList, WireStruct, WireValue, from_wire,
    from_wire_json, is_wire_value, to_wire,
};
