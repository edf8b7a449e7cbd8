//! Configuration management for mcpdemo
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence, lowest to highest: built-in defaults, YAML file,
//! environment variables, CLI flags.

use crate::cli::{Cli, Commands};
use crate::error::{DemoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for mcpdemo
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Settings shared by the chat and example clients
    #[serde(default)]
    pub client: ClientConfig,
}

/// Server configuration
///
/// Binds `0.0.0.0:8000` with catalog reload enabled unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Reload the catalog when its file changes
    #[serde(default = "default_reload")]
    pub reload: bool,

    /// Interval between keep-alive comments on SSE streams
    #[serde(default = "default_sse_keepalive_seconds")]
    pub sse_keepalive_seconds: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_reload() -> bool {
    true
}

fn default_sse_keepalive_seconds() -> u64 {
    15
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reload: default_reload(),
            sse_keepalive_seconds: default_sse_keepalive_seconds(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// SSE keep-alive interval as a [`Duration`]
    pub fn sse_keepalive(&self) -> Duration {
        Duration::from_secs(self.sse_keepalive_seconds)
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the running server; the MCP endpoint is `<url>/mcp`
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl ClientConfig {
    /// Resolve the streamable-HTTP MCP endpoint from the base URL
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Config`] if `server_url` is not a valid URL
    ///
    /// # Examples
    ///
    /// ```
    /// use mcpdemo::config::ClientConfig;
    ///
    /// let client = ClientConfig::default();
    /// assert_eq!(client.endpoint().unwrap().as_str(), "http://localhost:8000/mcp");
    /// ```
    pub fn endpoint(&self) -> Result<url::Url> {
        let mut base = url::Url::parse(&self.server_url).map_err(|e| {
            DemoError::Config(format!("Invalid server_url '{}': {}", self.server_url, e))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("mcp")
            .map_err(|e| DemoError::Config(format!("Invalid server_url: {}", e)).into())
    }

    /// Request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &Path, cli: &Cli) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Parse a YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Config`] on read or parse failure
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DemoError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DemoError::Config(format!("Failed to parse config: {}", e)).into())
    }

    /// Serialize to the YAML written into a fresh environment
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("MCPDEMO_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("MCPDEMO_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid MCPDEMO_PORT: {}", port);
            }
        }

        if let Ok(reload) = std::env::var("MCPDEMO_RELOAD") {
            match parse_bool(&reload) {
                Some(value) => self.server.reload = value,
                None => tracing::warn!("Invalid MCPDEMO_RELOAD: {}", reload),
            }
        }

        if let Ok(url) = std::env::var("MCP_SERVER_URL") {
            self.client.server_url = url;
        }

        if let Ok(timeout) = std::env::var("MCPDEMO_REQUEST_TIMEOUT") {
            if let Ok(value) = timeout.parse() {
                self.client.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MCPDEMO_REQUEST_TIMEOUT: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        match &cli.command {
            Commands::Serve {
                host,
                port,
                no_reload,
            } => {
                if let Some(host) = host {
                    self.server.host = host.clone();
                }
                if let Some(port) = port {
                    self.server.port = *port;
                }
                if *no_reload {
                    self.server.reload = false;
                }
            }
            Commands::Chat { url } | Commands::Example { url } => {
                if let Some(url) = url {
                    self.client.server_url = url.clone();
                }
            }
            Commands::Setup => {}
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Config`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(DemoError::Config("server.host cannot be empty".to_string()).into());
        }

        if self.server.port == 0 {
            return Err(
                DemoError::Config("server.port must be greater than 0".to_string()).into(),
            );
        }

        if self.server.sse_keepalive_seconds == 0 {
            return Err(DemoError::Config(
                "server.sse_keepalive_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        let url = url::Url::parse(&self.client.server_url).map_err(|e| {
            DemoError::Config(format!(
                "client.server_url '{}' is not a valid URL: {}",
                self.client.server_url, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(DemoError::Config(format!(
                "client.server_url must use http or https, got {}",
                url.scheme()
            ))
            .into());
        }

        if self.client.request_timeout_seconds == 0 {
            return Err(DemoError::Config(
                "client.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in [
            "MCPDEMO_HOST",
            "MCPDEMO_PORT",
            "MCPDEMO_RELOAD",
            "MCP_SERVER_URL",
            "MCPDEMO_REQUEST_TIMEOUT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert!(config.server.reload);
        assert_eq!(config.client.server_url, "http://localhost:8000");
        assert_eq!(config.client.request_timeout_seconds, 30);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_host() {
        let mut config = Config::default();
        config.server.host = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = Config::default();
        config.client.server_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.client.server_url = "ftp://example.com".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("http or https"));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.client.request_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_endpoint_handles_trailing_slash_and_prefix() {
        let mut client = ClientConfig::default();
        client.server_url = "http://127.0.0.1:9000/".to_string();
        assert_eq!(client.endpoint().unwrap().as_str(), "http://127.0.0.1:9000/mcp");

        client.server_url = "http://example.com/demo".to_string();
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "http://example.com/demo/mcp"
        );
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "server:\n  port: 9100\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.client, ClientConfig::default());
    }

    #[test]
    fn test_yaml_roundtrip_of_defaults() {
        let yaml = Config::default().to_yaml().unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    #[serial]
    fn test_load_missing_file_uses_defaults() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.yaml"), &Cli::default()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "client:\n  server_url: http://10.0.0.2:8080").unwrap();
        let config = Config::load(file.path(), &Cli::default()).unwrap();
        assert_eq!(config.client.server_url, "http://10.0.0.2:8080");
    }

    #[test]
    #[serial]
    fn test_load_rejects_malformed_yaml() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [unterminated").unwrap();
        let err = Config::load(file.path(), &Cli::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    #[serial]
    fn test_env_vars_override_file_values() {
        clear_env();
        std::env::set_var("MCPDEMO_PORT", "8123");
        std::env::set_var("MCPDEMO_RELOAD", "off");
        std::env::set_var("MCP_SERVER_URL", "http://remote:8123");

        let mut config = Config::default();
        config.apply_env_vars();
        clear_env();

        assert_eq!(config.server.port, 8123);
        assert!(!config.server.reload);
        assert_eq!(config.client.server_url, "http://remote:8123");
    }

    #[test]
    #[serial]
    fn test_invalid_env_port_is_ignored() {
        clear_env();
        std::env::set_var("MCPDEMO_PORT", "not-a-port");
        let mut config = Config::default();
        config.apply_env_vars();
        clear_env();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_beat_env() {
        clear_env();
        std::env::set_var("MCPDEMO_PORT", "8123");
        let cli = Cli {
            command: Commands::Serve {
                host: Some("127.0.0.1".to_string()),
                port: Some(9999),
                no_reload: true,
            },
            ..Cli::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.yaml"), &cli).unwrap();
        clear_env();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9999);
        assert!(!config.server.reload);
    }

    #[test]
    fn test_client_url_override() {
        let cli = Cli {
            command: Commands::Example {
                url: Some("http://override:1".to_string()),
            },
            ..Cli::default()
        };
        let mut config = Config::default();
        config.apply_cli_overrides(&cli);
        assert_eq!(config.client.server_url, "http://override:1");
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
