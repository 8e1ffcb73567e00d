//! CLI and proxy client for confrelay.
//!
//! This crate provides the `confrelay` command-line interface and
//! [`ProxyClient`], which posts transcoded, framed RPC messages to the
//! grpc-web-text proxy.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod proxy;
pub mod secret;
pub mod tracing;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use proxy::{CallOutcome, ProxyClient, ProxyHeaders};
