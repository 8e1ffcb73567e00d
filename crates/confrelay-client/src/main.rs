//! confrelay CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use confrelay_client::cli::{Cli, Command, ConfigAction, FrameAction, LogFormat, TranscodeAction};
use confrelay_client::commands;
use confrelay_client::config::ClientConfig;
use confrelay_client::error::{ClientError, ClientResult};
use confrelay_client::proxy::ProxyClient;
use confrelay_client::tracing::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::default()
    };
    let format = match cli.log_format {
        LogFormat::Pretty => TracingOutputFormat::Pretty,
        LogFormat::Compact => TracingOutputFormat::Compact,
        LogFormat::Json => TracingOutputFormat::Json,
    };
    if let Err(e) = init_tracing(tracing_config.with_format(format)) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path).map_err(ClientError::Config)?,
        None => ClientConfig::load().map_err(ClientError::Config)?,
    };

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
        Command::Transcode { action } => {
            let transcoder = config.transcode.transcoder()?;
            match action {
                TranscodeAction::Request { rpc, file } => {
                    commands::transcode::request(&transcoder, &rpc, file.as_deref())
                }
                TranscodeAction::Response { method, file } => {
                    commands::transcode::response(&transcoder, &method, file.as_deref())
                }
            }
        }
        Command::Frame { action } => match action {
            FrameAction::Encode { file } => commands::frame::encode(file.as_deref()),
            FrameAction::Decode {
                file,
                status,
                message,
            } => commands::frame::decode(file.as_deref(), status.as_deref(), message.as_deref()),
        },
        Command::Call {
            rpc,
            method,
            headers,
            file,
        } => {
            let client = ProxyClient::from_config(&config)?;
            commands::call::run(&client, &rpc, method.as_deref(), &headers, file.as_deref()).await
        }
    }
}
