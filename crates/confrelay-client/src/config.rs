//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/confrelay/config.toml` by default.
//!
//! The auth token supports secret references:
//! - `pass::path/in/store` resolved via `pass show`
//! - `env::VAR_NAME` resolved from the environment
//! - plain text used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use confrelay_protocol::{MissingPath, SpecRegistry, TranscodeMode, Transcoder};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the confrelay client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Proxy connection settings.
    pub proxy: ProxySettings,

    /// Credentials sent with every call.
    pub auth: AuthSettings,

    /// Request and response value transcoding.
    pub transcode: TranscodeSettings,
}

/// Built-in proxy deployments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    /// Returns the proxy base URL of this environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://frontend-proxy.prod.bot.rele.ai",
            Self::Development => "https://frontend-proxy.dev.bot.rele.ai",
        }
    }
}

/// Proxy connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Deployment to talk to.
    pub environment: Environment,

    /// Explicit base URL, overriding `environment`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            url: None,
            timeout: 30,
        }
    }
}

impl ProxySettings {
    /// Returns the base URL calls are posted to, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Credentials settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Bearer token (supports `pass::` and `env::` prefixes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthSettings {
    /// Resolves the configured token, expanding secret references.
    ///
    /// Returns `Ok(None)` if no token is configured.
    pub fn resolve_token(&self) -> ClientResult<Option<String>> {
        self.token
            .as_deref()
            .map(|raw| {
                crate::secret::resolve(raw)
                    .map_err(|e| ClientError::AuthRequired(format!("failed to resolve token: {}", e)))
            })
            .transpose()
    }
}

/// Transcoding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeSettings {
    /// Built-in spec set to start from.
    pub mode: TranscodeMode,

    /// Behavior when a path spec addresses a missing location.
    pub missing_paths: MissingPath,

    /// Additional per-RPC spec sets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rpc: Vec<RpcSpecs>,
}

/// Path specs registered for one RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSpecs {
    /// Wire path, e.g. `/components.Apps/Create`.
    pub path: String,

    /// Dotted path specs, `$ANY` matching any key or index.
    pub specs: Vec<String>,
}

impl TranscodeSettings {
    /// Builds the spec registry: the built-in set for `mode` plus every
    /// `[[transcode.rpc]]` entry.
    pub fn registry(&self) -> ClientResult<SpecRegistry> {
        let mut registry = SpecRegistry::builtin(self.mode)?;
        for entry in &self.rpc {
            registry.register(entry.path.as_str(), &entry.specs)?;
        }
        Ok(registry)
    }

    /// Builds a transcoder from these settings.
    pub fn transcoder(&self) -> ClientResult<Transcoder> {
        Ok(Transcoder::new(self.registry()?, self.missing_paths))
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("confrelay")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert!(!config.debug);
        assert_eq!(config.proxy.environment, Environment::Production);
        assert_eq!(config.proxy.base_url(), "https://frontend-proxy.prod.bot.rele.ai");
        assert_eq!(config.proxy.timeout(), Duration::from_secs(30));
        assert_eq!(config.transcode.mode, TranscodeMode::Paths);
        assert_eq!(config.transcode.missing_paths, MissingPath::Lenient);
        assert!(config.auth.resolve_token().unwrap().is_none());
    }

    #[test]
    fn full_toml() {
        let toml_content = r#"
debug = true

[proxy]
environment = "development"
timeout = 5

[auth]
token = "plain-token"

[transcode]
mode = "allow_list"
missing_paths = "strict"

[[transcode.rpc]]
path = "/components.Apps/Create"
specs = ["app.request.headers.$ANY.data", "app.request.body.$ANY.data"]
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert!(config.debug);
        assert_eq!(config.proxy.base_url(), "https://frontend-proxy.dev.bot.rele.ai");
        assert_eq!(config.proxy.timeout(), Duration::from_secs(5));
        assert_eq!(config.auth.resolve_token().unwrap().as_deref(), Some("plain-token"));

        let transcoder = config.transcode.transcoder().unwrap();
        assert_eq!(transcoder.missing_paths(), MissingPath::Strict);
        let registry = transcoder.registry();
        assert_eq!(registry.specs_for("/components.Apps/Create").len(), 2);
        assert_eq!(registry.specs_for("/components.Operations/Create").len(), 5);
        assert!(registry.specs_for("/components.Apps/Get").is_empty());
    }

    #[test]
    fn url_overrides_environment() {
        let config: ClientConfig =
            toml::from_str("[proxy]\nenvironment = \"development\"\nurl = \"http://127.0.0.1:8080/\"\n")
                .unwrap();
        assert_eq!(config.proxy.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn overlapping_rpc_specs_are_rejected() {
        let toml_content = r#"
[[transcode.rpc]]
path = "/x.Y/Create"
specs = ["a.$ANY.data", "a.b.data"]
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        let err = config.transcode.registry().unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn token_env_reference() {
        unsafe {
            std::env::set_var("_CONFRELAY_TEST_TOKEN", "from-env");
        }
        let auth = AuthSettings {
            token: Some("env::_CONFRELAY_TEST_TOKEN".to_string()),
        };
        assert_eq!(auth.resolve_token().unwrap().as_deref(), Some("from-env"));
        unsafe {
            std::env::remove_var("_CONFRELAY_TEST_TOKEN");
        }

        let missing = AuthSettings {
            token: Some("env::_CONFRELAY_UNSET_TOKEN_12345".to_string()),
        };
        assert!(matches!(missing.resolve_token(), Err(ClientError::AuthRequired(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[proxy]\ntimeout = 12").unwrap();
        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.proxy.timeout, 12);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transcode]\nmode = \"sideways\"").unwrap();
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(err.starts_with("failed to parse config"));
    }

    #[test]
    fn dump_roundtrips() {
        let mut config = ClientConfig::default();
        config.transcode.rpc.push(RpcSpecs {
            path: "/x.Y/Z".to_string(),
            specs: vec!["a.data".to_string()],
        });
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.transcode.rpc.len(), 1);
        assert_eq!(parsed.proxy.timeout, 30);
    }
}
