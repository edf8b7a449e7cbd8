//! Command-line interface definition for mcpdemo
//!
//! This module defines the CLI structure using clap's derive API. Each
//! subcommand maps to one launcher: environment setup, the MCP server, the
//! interactive chat client, and the scripted example client.

use clap::{Parser, Subcommand};

/// Default location of the bootstrapped environment, relative to the
/// working directory.
pub const DEFAULT_ENV_DIR: &str = ".mcpdemo";

/// mcpdemo - Model Context Protocol demo server and clients
///
/// Serves example prompts, resources and tools over HTTP, and ships two
/// clients that exercise them.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcpdemo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults to `<env-dir>/config.yaml`)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory holding the bootstrapped environment
    #[arg(long, global = true, env = "MCPDEMO_ENV_DIR", default_value = DEFAULT_ENV_DIR)]
    pub env_dir: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for mcpdemo
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create the environment, or confirm an existing one is reused
    Setup,

    /// Bootstrap the environment if needed, then start the MCP server
    Serve {
        /// Interface to bind (default 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (default 8000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Disable reloading the catalog when it changes on disk
        #[arg(long)]
        no_reload: bool,
    },

    /// Start the interactive chat client
    Chat {
        /// Server base URL (overrides MCP_SERVER_URL and config)
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Run the scripted example client against a running server
    Example {
        /// Server base URL (overrides MCP_SERVER_URL and config)
        #[arg(short, long)]
        url: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            env_dir: DEFAULT_ENV_DIR.to_string(),
            verbose: false,
            command: Commands::Serve {
                host: None,
                port: None,
                no_reload: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert!(cli.config.is_none());
        assert_eq!(cli.env_dir, ".mcpdemo");
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { .. }));
    }

    #[test]
    fn test_cli_parse_setup() {
        let cli = Cli::try_parse_from(["mcpdemo", "setup"]).unwrap();
        assert!(matches!(cli.command, Commands::Setup));
    }

    #[test]
    fn test_cli_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["mcpdemo", "serve"]).unwrap();
        if let Commands::Serve {
            host,
            port,
            no_reload,
        } = cli.command
        {
            assert!(host.is_none());
            assert!(port.is_none());
            assert!(!no_reload);
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_cli_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "mcpdemo",
            "serve",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
            "--no-reload",
        ])
        .unwrap();
        if let Commands::Serve {
            host,
            port,
            no_reload,
        } = cli.command
        {
            assert_eq!(host.as_deref(), Some("127.0.0.1"));
            assert_eq!(port, Some(9000));
            assert!(no_reload);
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_cli_parse_serve_rejects_bad_port() {
        let cli = Cli::try_parse_from(["mcpdemo", "serve", "--port", "eighty"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_chat_with_url() {
        let cli = Cli::try_parse_from(["mcpdemo", "chat", "--url", "http://h:1"]).unwrap();
        if let Commands::Chat { url } = cli.command {
            assert_eq!(url.as_deref(), Some("http://h:1"));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_example() {
        let cli = Cli::try_parse_from(["mcpdemo", "example"]).unwrap();
        assert!(matches!(cli.command, Commands::Example { url: None }));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mcpdemo",
            "chat",
            "--env-dir",
            "/tmp/env",
            "-c",
            "custom.yaml",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.env_dir, "/tmp/env");
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_missing_command() {
        assert!(Cli::try_parse_from(["mcpdemo"]).is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        assert!(Cli::try_parse_from(["mcpdemo", "deploy"]).is_err());
    }
}
