/*!
Command handlers for the CLI

One handler per subcommand:

- `setup`   - bootstrap the environment directory
- `serve`   - bootstrap if needed, then run the MCP server
- `chat`    - interactive chat client
- `example` - scripted example client

Client handlers require an existing environment and never create one.
*/

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::Config;
use crate::environment::Environment;
use crate::error::Result;

pub mod chat;
pub mod example;
pub mod special_commands;

/// Configuration file to use: `--config` if given, else the environment's
fn config_path(cli: &Cli, env: &Environment) -> PathBuf {
    cli.config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| env.config_path())
}

/// Load and validate the configuration for an environment
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or a setting is invalid
pub fn load_config(cli: &Cli, env: &Environment) -> Result<Config> {
    let config = Config::load(&config_path(cli, env), cli)?;
    config.validate()?;
    Ok(config)
}

/// Open the environment for a client command
///
/// # Errors
///
/// Returns [`crate::error::DemoError::EnvironmentMissing`] when setup has
/// not been run; nothing is created
pub fn require_environment(cli: &Cli) -> Result<Environment> {
    Environment::require(Path::new(&cli.env_dir))
}

pub mod setup {
    //! Environment bootstrap command

    use super::*;
    use crate::environment::BootstrapOutcome;
    use colored::Colorize;

    /// Create or reuse the environment and report which happened
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or its files cannot be written
    pub fn run_setup(cli: &Cli) -> Result<(Environment, BootstrapOutcome)> {
        let (env, outcome) = Environment::ensure(&cli.env_dir)?;
        match outcome {
            BootstrapOutcome::Created => println!(
                "{} environment at {}",
                "Created".green(),
                env.root().display()
            ),
            BootstrapOutcome::Reused => println!(
                "{} existing environment at {}",
                "Reusing".yellow(),
                env.root().display()
            ),
        }
        Ok((env, outcome))
    }
}

pub mod serve {
    //! Server launcher command

    use super::*;

    /// Bootstrap the environment if needed, then serve until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns bootstrap, configuration or bind errors
    pub async fn run_serve(cli: &Cli) -> Result<()> {
        let (env, outcome) = Environment::ensure(&cli.env_dir)?;
        tracing::info!("Environment {}: {}", outcome, env.root().display());

        let config = load_config(cli, &env)?;
        crate::server::run(&config, &env).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use crate::environment::BootstrapOutcome;
    use crate::error::DemoError;
    use serial_test::serial;
    use tempfile::TempDir;

    fn cli_for(dir: &Path, command: Commands) -> Cli {
        Cli {
            env_dir: dir.display().to_string(),
            command,
            ..Cli::default()
        }
    }

    #[test]
    fn test_setup_twice_reuses() {
        let tmp = TempDir::new().unwrap();
        let cli = cli_for(&tmp.path().join("env"), Commands::Setup);

        let (_, first) = setup::run_setup(&cli).unwrap();
        let (_, second) = setup::run_setup(&cli).unwrap();
        assert_eq!(first, BootstrapOutcome::Created);
        assert_eq!(second, BootstrapOutcome::Reused);
    }

    #[test]
    fn test_require_environment_missing_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("absent");
        let cli = cli_for(&root, Commands::Chat { url: None });

        let err = require_environment(&cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DemoError>(),
            Some(DemoError::EnvironmentMissing { .. })
        ));
        assert!(!root.exists());
    }

    #[test]
    #[serial]
    fn test_load_config_applies_cli_url() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("env");
        let (env, _) = Environment::ensure(&root).unwrap();
        let cli = cli_for(
            &root,
            Commands::Chat {
                url: Some("http://127.0.0.1:9000".to_string()),
            },
        );

        std::env::remove_var("MCP_SERVER_URL");
        let config = load_config(&cli, &env).unwrap();
        assert_eq!(config.client.server_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let tmp = TempDir::new().unwrap();
        let (env, _) = Environment::ensure(tmp.path().join("env")).unwrap();
        let cli = Cli {
            config: Some("/elsewhere/config.yaml".to_string()),
            ..Cli::default()
        };
        assert_eq!(config_path(&cli, &env), PathBuf::from("/elsewhere/config.yaml"));
        assert_eq!(config_path(&Cli::default(), &env), env.config_path());
    }
}
