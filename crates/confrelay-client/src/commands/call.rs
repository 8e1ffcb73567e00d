//! Calling an RPC through the proxy.

use std::path::Path;

use confrelay_protocol::JsonRpc;

use crate::commands::{print_json, read_json, report};
use crate::error::{ClientError, ClientResult};
use crate::proxy::ProxyClient;

/// Calls `rpc` with a JSON message and prints the reversed response.
pub async fn run(
    client: &ProxyClient,
    rpc: &str,
    method: Option<&str>,
    headers: &[String],
    file: Option<&Path>,
) -> ClientResult<()> {
    let descriptor = match method {
        Some(method) => JsonRpc::new(rpc, method),
        None => JsonRpc::from_path(rpc),
    };
    let headers = parse_headers(headers)?;
    let payload = read_json(file)?;

    let outcome = client.execute(&descriptor, payload, &headers).await?;
    report(&outcome.request_diagnostics);
    report(&outcome.response_diagnostics);
    print_json(&outcome.value)
}

/// Splits `NAME:VALUE` arguments.
fn parse_headers(raw: &[String]) -> ClientResult<Vec<(&str, &str)>> {
    raw.iter()
        .map(|h| {
            h.split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| ClientError::Config(format!("invalid header {:?}, expected NAME:VALUE", h)))
        })
        .collect()
}
