//! Local transcoding commands.

use std::path::Path;

use confrelay_protocol::{ResponseShape, Transcoder};
use tracing::debug;

use crate::commands::{print_json, read_json, report};
use crate::error::ClientResult;

/// Rewrites the leaves selected for `rpc` and prints the payload.
pub fn request(transcoder: &Transcoder, rpc: &str, file: Option<&Path>) -> ClientResult<()> {
    let payload = read_json(file)?;
    let transcoded = transcoder.transcode_request(rpc, payload)?;
    debug!(rpc, transformed = transcoded.transformed, "transcoded request");
    report(&transcoded.diagnostics);
    print_json(&transcoded.payload)
}

/// Reverses wire values by the shape of `method` and prints the result.
pub fn response(transcoder: &Transcoder, method: &str, file: Option<&Path>) -> ClientResult<()> {
    let value = read_json(file)?;
    let shape = ResponseShape::for_method(method);
    let finished = transcoder.transcode_response(shape, value);
    debug!(method, ?shape, reversed = finished.reversed, "transcoded response");
    report(&finished.diagnostics);
    print_json(&finished.value)
}
