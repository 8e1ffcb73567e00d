//! Response unwrapping: proxy status headers, trailers and the data frame.
//!
//! The proxy reports call status through `grpc-status` / `grpc-message`
//! headers rather than the HTTP status line. A failed call may also carry
//! its status in a trailer frame at the end of the body.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{ProtocolError, ProtocolResult};
use crate::framing::{Frame, FrameReader, decode_body};

/// Header carrying the numeric call status.
pub const STATUS_HEADER: &str = "grpc-status";

/// Header carrying the human-readable failure message.
pub const MESSAGE_HEADER: &str = "grpc-message";

/// Message used when a failed call carries no message header.
pub const FALLBACK_MESSAGE: &str = "unable to execute operation.";

/// Status codes at or above this value fail the call.
pub const ERROR_STATUS_THRESHOLD: u32 = 400;

/// Case-insensitive header lookup.
///
/// Implemented for plain maps and pair slices here; HTTP clients wrap their
/// own header types.
pub trait HeaderSource {
    /// Returns the value of the header `name`, if present.
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str).or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }
}

impl<K: AsRef<str>, V: AsRef<str>> HeaderSource for [(K, V)] {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| AsRef::<str>::as_ref(k).eq_ignore_ascii_case(name))
            .map(|(_, v)| AsRef::<str>::as_ref(v))
    }
}

impl<K: AsRef<str>, V: AsRef<str>> HeaderSource for Vec<(K, V)> {
    fn header(&self, name: &str) -> Option<&str> {
        self.as_slice().header(name)
    }
}

/// Metadata decoded from a trailer frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trailer {
    entries: Vec<(String, String)>,
}

impl Trailer {
    /// Parses `name:value` lines separated by CRLF (or bare LF).
    ///
    /// Returns `None` if the payload is not UTF-8.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(payload).ok()?;
        let entries = text
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();
        Some(Self { entries })
    }

    /// Returns the parsed entries in order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

impl HeaderSource for Trailer {
    fn header(&self, name: &str) -> Option<&str> {
        self.entries.as_slice().header(name)
    }
}

/// Fails with [`ProtocolError::Transport`] if `headers` report a status at
/// or above [`ERROR_STATUS_THRESHOLD`].
///
/// A missing status header means success. A status that is not a number is
/// ignored with a warning.
pub fn check_status<H: HeaderSource + ?Sized>(headers: &H) -> ProtocolResult<()> {
    let Some(raw) = headers.header(STATUS_HEADER) else {
        return Ok(());
    };

    let status = match raw.trim().parse::<u32>() {
        Ok(status) => status,
        Err(_) => {
            warn!(status = raw, "ignoring non-numeric status header");
            return Ok(());
        }
    };

    if status < ERROR_STATUS_THRESHOLD {
        return Ok(());
    }

    let message = headers
        .header(MESSAGE_HEADER)
        .filter(|m| !m.is_empty())
        .map(decode_message)
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

    debug!(status, message = %message, "proxy reported failure");
    Err(ProtocolError::Transport { status, message })
}

/// Messages are percent-encoded on the wire; undecodable ones are kept raw.
fn decode_message(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|m| m.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Extracts the payload of the first data frame from a response.
///
/// 1. Status headers at or above 400 fail the call before decoding.
/// 2. The body is base64-decoded and the first frame's bounds validated.
/// 3. A trailer frame after the data frame is checked like the headers;
///    a malformed trailer is discarded.
/// 4. A second data frame is rejected: streamed responses are unsupported.
///
/// A body holding only a trailer with a successful status yields an empty
/// payload.
pub fn unwrap_response<H: HeaderSource + ?Sized>(body: &str, headers: &H) -> ProtocolResult<Vec<u8>> {
    check_status(headers)?;

    let bytes = decode_body(body)?;
    let mut reader = FrameReader::new(&bytes);

    let first = match reader.next() {
        Some(frame) => frame?,
        None => return Err(ProtocolError::IncompleteHeader { received: 0 }),
    };

    if first.is_trailer() {
        check_trailer(&first)?;
        return Ok(Vec::new());
    }

    for next in reader {
        match next {
            Ok(frame) if frame.is_trailer() => {
                check_trailer(&frame)?;
                break;
            }
            Ok(_) => return Err(ProtocolError::UnsupportedStreaming),
            Err(e) => {
                debug!(error = %e, "discarding malformed bytes after data frame");
                break;
            }
        }
    }

    Ok(first.payload.to_vec())
}

fn check_trailer(frame: &Frame<'_>) -> ProtocolResult<()> {
    match Trailer::parse(frame.payload) {
        Some(trailer) => check_status(&trailer),
        None => {
            debug!(len = frame.payload.len(), "discarding non-UTF-8 trailer");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{TRAILER_FLAG, encode_body, encode_frame, encode_frame_with_flag};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn no_headers() -> Vec<(String, String)> {
        Vec::new()
    }

    fn body_with_trailer(payload: &[u8], trailer: &str) -> String {
        let mut bytes = encode_frame(payload).unwrap();
        bytes.extend(encode_frame_with_flag(TRAILER_FLAG, trailer.as_bytes()).unwrap());
        STANDARD.encode(bytes)
    }

    #[test]
    fn status_404_rejects_with_message() {
        let headers = [("grpc-status", "404"), ("grpc-message", "not found")];
        let err = unwrap_response("", &headers[..]).unwrap_err();
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn status_500_without_message_uses_fallback() {
        let headers = [("grpc-status", "500")];
        let err = unwrap_response("not even base64", &headers[..]).unwrap_err();
        assert_eq!(err.to_string(), FALLBACK_MESSAGE);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Grpc-Status".to_string(), "403".to_string());
        headers.insert("Grpc-Message".to_string(), "permission%20denied".to_string());
        let err = check_status(&headers).unwrap_err();
        assert_eq!(err.to_string(), "permission denied");
    }

    #[test]
    fn low_and_non_numeric_statuses_pass() {
        assert!(check_status(&[("grpc-status", "0")][..]).is_ok());
        assert!(check_status(&[("grpc-status", "399")][..]).is_ok());
        assert!(check_status(&[("grpc-status", "oops")][..]).is_ok());
        assert!(check_status(&no_headers()).is_ok());
    }

    #[test]
    fn returns_first_data_frame_payload() {
        let body = encode_body(b"payload").unwrap();
        let payload = unwrap_response(&body, &no_headers()).unwrap();
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn empty_payload_frame() {
        let body = encode_body(&[]).unwrap();
        assert!(unwrap_response(&body, &no_headers()).unwrap().is_empty());
    }

    #[test]
    fn empty_body_is_incomplete() {
        let err = unwrap_response("", &no_headers()).unwrap_err();
        assert!(matches!(err, ProtocolError::IncompleteHeader { received: 0 }));
    }

    #[test]
    fn truncated_frame_is_a_bounds_error() {
        let mut bytes = encode_frame(b"abcdef").unwrap();
        bytes.truncate(8);
        let err = unwrap_response(&STANDARD.encode(bytes), &no_headers()).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FrameBounds {
                declared: 6,
                available: 3
            }
        ));
    }

    #[test]
    fn ok_trailer_is_discarded() {
        let body = body_with_trailer(b"data", "grpc-status:0\r\ngrpc-message:\r\n");
        assert_eq!(unwrap_response(&body, &no_headers()).unwrap(), b"data");
    }

    #[test]
    fn failing_trailer_rejects() {
        let body = body_with_trailer(b"data", "grpc-status: 409\r\ngrpc-message: already%20exists\r\n");
        let err = unwrap_response(&body, &no_headers()).unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "already exists");
    }

    #[test]
    fn trailer_only_body() {
        let ok = STANDARD.encode(encode_frame_with_flag(TRAILER_FLAG, b"grpc-status:0\r\n").unwrap());
        assert!(unwrap_response(&ok, &no_headers()).unwrap().is_empty());

        let failed =
            STANDARD.encode(encode_frame_with_flag(TRAILER_FLAG, b"grpc-status:500\r\n").unwrap());
        let err = unwrap_response(&failed, &no_headers()).unwrap_err();
        assert_eq!(err.to_string(), FALLBACK_MESSAGE);
    }

    #[test]
    fn malformed_trailing_bytes_are_discarded() {
        let mut bytes = encode_frame(b"data").unwrap();
        bytes.extend_from_slice(&[TRAILER_FLAG, 0, 0]);
        let payload = unwrap_response(&STANDARD.encode(bytes), &no_headers()).unwrap();
        assert_eq!(payload, b"data");
    }

    #[test]
    fn second_data_frame_is_rejected() {
        let mut bytes = encode_frame(b"one").unwrap();
        bytes.extend(encode_frame(b"two").unwrap());
        let err = unwrap_response(&STANDARD.encode(bytes), &no_headers()).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedStreaming));
    }

    #[test]
    fn trailer_parsing() {
        let trailer = Trailer::parse(b"Grpc-Status: 0\r\nx-extra:a:b\nno-colon\r\n").unwrap();
        assert_eq!(
            trailer.entries(),
            &[
                ("grpc-status".to_string(), "0".to_string()),
                ("x-extra".to_string(), "a:b".to_string()),
            ]
        );
        assert_eq!(trailer.header("GRPC-STATUS"), Some("0"));
        assert!(Trailer::parse(&[0xff, 0xfe]).is_none());
    }
}
