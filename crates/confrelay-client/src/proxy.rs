//! HTTP client for the grpc-web-text proxy.

use std::sync::Arc;

use confrelay_protocol::{
    Diagnostics, HeaderSource, RpcDescriptor, Transcoder, check_status, request_headers,
};
use futures_util::future::join_all;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Response headers exposed to the protocol status check.
pub struct ProxyHeaders<'a>(pub &'a HeaderMap);

impl HeaderSource for ProxyHeaders<'_> {
    fn header(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Result of one call, with the diagnostics of both directions.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub value: Value,
    pub request_diagnostics: Diagnostics,
    pub response_diagnostics: Diagnostics,
}

/// Client for RPCs tunneled through the proxy.
///
/// Cheap to clone; clones share the connection pool and transcoder.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http_client: reqwest::Client,
    base_url: String,
    transcoder: Arc<Transcoder>,
    token: Option<String>,
}

impl ProxyClient {
    /// Creates a client posting to `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        timeout: std::time::Duration,
        transcoder: Transcoder,
    ) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Connection(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transcoder: Arc::new(transcoder),
            token: None,
        })
    }

    /// Creates a client from configuration, resolving the auth token.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let client = Self::new(
            config.proxy.base_url(),
            config.proxy.timeout(),
            config.transcode.transcoder()?,
        )?;
        Ok(match config.auth.resolve_token()? {
            Some(token) => client.with_token(token),
            None => client,
        })
    }

    /// Sends `authorization: Bearer <token>` with every call.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns the URL an RPC is posted to.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Returns the transcoder used for every call.
    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    /// Calls an RPC and returns its reversed response value.
    ///
    /// `extra_headers` are sent after the transport headers. An
    /// `authorization` entry replaces the configured token.
    pub async fn call<D>(
        &self,
        descriptor: &D,
        payload: Value,
        extra_headers: &[(&str, &str)],
    ) -> ClientResult<Value>
    where
        D: RpcDescriptor + ?Sized,
    {
        self.execute(descriptor, payload, extra_headers)
            .await
            .map(|outcome| outcome.value)
    }

    /// Calls an RPC and returns the value with its diagnostics.
    pub async fn execute<D>(
        &self,
        descriptor: &D,
        payload: Value,
        extra_headers: &[(&str, &str)],
    ) -> ClientResult<CallOutcome>
    where
        D: RpcDescriptor + ?Sized,
    {
        let prepared = self.transcoder.prepare_request(descriptor, payload)?;
        let url = self.url_for(descriptor.path());

        let mut request = self.http_client.post(&url);
        for (name, value) in request_headers() {
            request = request.header(name, value);
        }

        let overrides_auth = extra_headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION.as_str()));
        if let Some(token) = self.token.as_deref().filter(|_| !overrides_auth) {
            request = request.bearer_auth(token);
        }
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }

        debug!(
            rpc = descriptor.path(),
            url = %url,
            body_bytes = prepared.body.len(),
            transformed = prepared.transformed,
            "posting request"
        );

        let response = request.body(prepared.body).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        debug!(
            rpc = descriptor.path(),
            status = status.as_u16(),
            body_bytes = body.len(),
            "received response"
        );

        // Proxy-reported status wins over the HTTP status line.
        check_status(&ProxyHeaders(&headers))?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::AuthRequired(
                "proxy rejected the token; set [auth] token in config.toml".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let finished = self
            .transcoder
            .finish_response(descriptor, &body, &ProxyHeaders(&headers))?;

        Ok(CallOutcome {
            value: finished.value,
            request_diagnostics: prepared.diagnostics,
            response_diagnostics: finished.diagnostics,
        })
    }

    /// Issues independent calls concurrently.
    ///
    /// Results are returned in input order; one failure does not affect the
    /// others.
    pub async fn call_all<'a, D, I>(
        &self,
        calls: I,
        extra_headers: &[(&str, &str)],
    ) -> Vec<ClientResult<Value>>
    where
        D: RpcDescriptor + ?Sized + 'a,
        I: IntoIterator<Item = (&'a D, Value)>,
    {
        join_all(
            calls
                .into_iter()
                .map(|(descriptor, payload)| self.call(descriptor, payload, extra_headers)),
        )
        .await
    }
}
