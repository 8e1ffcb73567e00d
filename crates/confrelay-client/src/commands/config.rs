//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
///
/// Builds the spec registry, checks the proxy URL and resolves the token.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    let transcoder = config.transcode.transcoder()?;
    for entry in &config.transcode.rpc {
        println!(
            "{}: {} path specs",
            entry.path,
            transcoder.registry().specs_for(&entry.path).len()
        );
    }

    let base_url = config.proxy.base_url();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        return Err(ClientError::Config(format!(
            "proxy url must start with http:// or https://, got {:?}",
            base_url
        )));
    }
    if config.proxy.timeout == 0 {
        return Err(ClientError::Config("proxy timeout must be greater than zero".to_string()));
    }

    if config.auth.resolve_token()?.is_some() {
        println!("Auth token resolved.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    let config_path = ClientConfig::default_path();
    println!("config: {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = ClientConfig::default();
        config.proxy.url = Some("ftp://proxy".to_string());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("proxy url"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = ClientConfig::default();
        config.proxy.timeout = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(validate(&ClientConfig::default()).is_ok());
    }
}
