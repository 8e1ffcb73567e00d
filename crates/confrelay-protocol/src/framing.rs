//! Length-prefixed framing for the grpc-web-text transport.
//!
//! Every message is wrapped in a frame with a 5-byte header, and the framed
//! bytes travel base64-encoded in the HTTP body:
//!
//! ```text
//! +----------+----------------+-------------------+
//! | flag (1) | length (4 BE)  |  payload          |
//! +----------+----------------+-------------------+
//! ```
//!
//! A flag of `0x00` marks a data frame. A set high bit (`0x80`) marks a
//! trailer frame carrying `name:value` header lines.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{ProtocolError, ProtocolResult};

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 5;

/// Flag of an uncompressed data frame.
pub const DATA_FLAG: u8 = 0x00;

/// Bit marking a trailer frame.
pub const TRAILER_FLAG: u8 = 0x80;

/// A frame borrowed from a decoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub flag: u8,
    pub payload: &'a [u8],
}

impl Frame<'_> {
    /// Returns true if this is a trailer frame.
    pub fn is_trailer(&self) -> bool {
        self.flag & TRAILER_FLAG != 0
    }
}

/// Frames `payload` as a single data frame.
///
/// # Example
///
/// ```rust
/// use confrelay_protocol::encode_frame;
///
/// assert_eq!(encode_frame(&[]).unwrap(), vec![0, 0, 0, 0, 0]);
/// assert_eq!(encode_frame(b"hi").unwrap(), vec![0, 0, 0, 0, 2, b'h', b'i']);
/// ```
pub fn encode_frame(payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    encode_frame_with_flag(DATA_FLAG, payload)
}

/// Frames `payload` with an explicit flag byte.
pub fn encode_frame_with_flag(flag: u8, payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::MessageTooLarge {
        size: payload.len(),
    })?;

    let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
    buffer.push(flag);
    buffer.extend_from_slice(&len.to_be_bytes());
    buffer.extend_from_slice(payload);
    Ok(buffer)
}

/// Frames `payload` and base64-encodes it into a request body.
pub fn encode_body(payload: &[u8]) -> ProtocolResult<String> {
    Ok(STANDARD.encode(encode_frame(payload)?))
}

/// Decodes a base64 response body into raw frame bytes.
///
/// Proxies encode each frame separately, so a body may be several padded
/// base64 chunks back to back. Whitespace is ignored.
pub fn decode_body(body: &str) -> ProtocolResult<Vec<u8>> {
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let mut out = Vec::with_capacity(compact.len() / 4 * 3);

    let mut rest = compact.as_str();
    while !rest.is_empty() {
        let end = match rest.find('=') {
            Some(pos) => rest[pos..]
                .find(|c: char| c != '=')
                .map_or(rest.len(), |n| pos + n),
            None => rest.len(),
        };
        STANDARD.decode_vec(&rest[..end], &mut out)?;
        rest = &rest[end..];
    }

    Ok(out)
}

/// Decodes the frame at the start of `bytes`, returning it with the
/// remaining bytes.
pub fn decode_frame(bytes: &[u8]) -> ProtocolResult<(Frame<'_>, &[u8])> {
    if bytes.len() < HEADER_LEN {
        return Err(ProtocolError::IncompleteHeader {
            received: bytes.len(),
        });
    }

    let flag = bytes[0];
    let len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    let available = bytes.len() - HEADER_LEN;

    if len > available {
        return Err(ProtocolError::FrameBounds {
            declared: len,
            available,
        });
    }

    let (payload, rest) = bytes[HEADER_LEN..].split_at(len);
    Ok((Frame { flag, payload }, rest))
}

/// Iterates over the frames of a decoded body.
///
/// Stops after the first error.
pub struct FrameReader<'a> {
    remaining: &'a [u8],
    failed: bool,
}

impl<'a> FrameReader<'a> {
    /// Creates a reader over decoded body bytes.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            remaining: bytes,
            failed: false,
        }
    }

    /// Returns the bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.remaining
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = ProtocolResult<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining.is_empty() {
            return None;
        }

        match decode_frame(self.remaining) {
            Ok((frame, rest)) => {
                self.remaining = rest;
                Some(Ok(frame))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
