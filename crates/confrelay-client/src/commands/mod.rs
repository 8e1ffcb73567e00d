//! Subcommand implementations.

pub mod call;
pub mod config;
pub mod frame;
pub mod transcode;

use std::io::Read;
use std::path::Path;

use confrelay_protocol::{Diagnostic, Diagnostics};
use serde_json::Value;

use crate::error::ClientResult;

/// Reads a file, or stdin when no file is given.
pub(crate) fn read_input(file: Option<&Path>) -> ClientResult<Vec<u8>> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Reads and parses a JSON document.
pub(crate) fn read_json(file: Option<&Path>) -> ClientResult<Value> {
    Ok(serde_json::from_slice(&read_input(file)?)?)
}

/// Prints a JSON value to stdout.
pub(crate) fn print_json(value: &Value) -> ClientResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints warnings to stderr, one per line.
///
/// Unmatched path specs are expected in lenient mode and only logged.
pub(crate) fn report(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        if !matches!(diagnostic, Diagnostic::PathNoMatch { .. }) {
            eprintln!("warning: {}", diagnostic);
        }
    }
}
