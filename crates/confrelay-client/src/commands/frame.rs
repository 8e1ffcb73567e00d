//! Framing commands for inspecting raw proxy traffic.

use std::path::Path;

use confrelay_protocol::{MESSAGE_HEADER, STATUS_HEADER, encode_body, unwrap_response};

use crate::commands::read_input;
use crate::error::ClientResult;

/// Frames the input bytes and prints the base64 body.
pub fn encode(file: Option<&Path>) -> ClientResult<()> {
    let payload = read_input(file)?;
    println!("{}", encode_body(&payload)?);
    Ok(())
}

/// Unwraps a base64 body and prints the first data frame as hex.
pub fn decode(file: Option<&Path>, status: Option<&str>, message: Option<&str>) -> ClientResult<()> {
    let body = read_input(file)?;
    let headers = status_headers(status, message);
    let payload = unwrap_response(&String::from_utf8_lossy(&body), &headers)?;
    println!("{}", to_hex(&payload));
    Ok(())
}

fn status_headers(status: Option<&str>, message: Option<&str>) -> Vec<(&'static str, String)> {
    let mut headers = Vec::new();
    if let Some(status) = status {
        headers.push((STATUS_HEADER, status.to_string()));
    }
    if let Some(message) = message {
        headers.push((MESSAGE_HEADER, message.to_string()));
    }
    headers
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn hex_output() {
        assert_eq!(to_hex(&[0x00, 0x0f, 0xab]), "000fab");
        assert_eq!(to_hex(&[]), "");
    }

    #[test]
    fn decode_reports_status_failure() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", encode_body(b"x").unwrap()).unwrap();
        let err = decode(Some(file.path()), Some("404"), Some("not found")).unwrap_err();
        assert_eq!(err.to_string(), "not found");
        assert!(decode(Some(file.path()), Some("0"), None).is_ok());
    }
}
