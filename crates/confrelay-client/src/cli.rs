//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// confrelay - Configuration objects over the grpc-web-text proxy
#[derive(Debug, Parser)]
#[command(name = "confrelay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CONFRELAY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Rewrite JSON payloads between plain and wire form
    Transcode {
        #[command(subcommand)]
        action: TranscodeAction,
    },

    /// Frame and unframe grpc-web-text bodies
    Frame {
        #[command(subcommand)]
        action: FrameAction,
    },

    /// Call an RPC through the proxy with a JSON message
    Call {
        /// RPC wire path, e.g. /components.Apps/Get
        #[arg(long)]
        rpc: String,

        /// Method name selecting the response shape (default: last path segment)
        #[arg(long)]
        method: Option<String>,

        /// Extra request header as NAME:VALUE (can be repeated)
        #[arg(long = "header", short = 'H', action = clap::ArgAction::Append)]
        headers: Vec<String>,

        /// JSON payload file (stdin if omitted)
        file: Option<PathBuf>,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

/// Transcoding actions.
#[derive(Debug, Subcommand)]
pub enum TranscodeAction {
    /// Rewrite the leaves selected for an RPC into wire values
    Request {
        /// RPC wire path selecting the spec set
        #[arg(long)]
        rpc: String,

        /// JSON payload file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Reverse wire values in a decoded response
    Response {
        /// Method name selecting the response shape (list, get, create, ...)
        #[arg(long)]
        method: String,

        /// JSON response file (stdin if omitted)
        file: Option<PathBuf>,
    },
}

/// Framing actions.
#[derive(Debug, Subcommand)]
pub enum FrameAction {
    /// Frame raw bytes and print the base64 body
    Encode {
        /// Payload file (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Unwrap a base64 body and print the payload as hex
    Decode {
        /// Body file (stdin if omitted)
        file: Option<PathBuf>,

        /// Status header value to check before decoding
        #[arg(long)]
        status: Option<String>,

        /// Message header value reported with a failing status
        #[arg(long, requires = "status")]
        message: Option<String>,
    },
}
