//! mcpdemo - MCP demo server and clients
//!
#![doc = "Main entry point for the mcpdemo binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mcpdemo::cli::{Cli, Commands};
use mcpdemo::commands;
use mcpdemo::error::DemoError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        // Instructional exit: the message is the whole diagnostic.
        if let Some(DemoError::EnvironmentMissing { .. }) = e.downcast_ref::<DemoError>() {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Setup => {
            commands::setup::run_setup(cli)?;
            Ok(())
        }
        Commands::Serve { .. } => {
            tracing::info!("Starting MCP server");
            commands::serve::run_serve(cli).await
        }
        Commands::Chat { .. } => {
            let env = commands::require_environment(cli)?;
            let config = commands::load_config(cli, &env)?;
            commands::chat::run_chat(&config.client).await
        }
        Commands::Example { .. } => {
            let env = commands::require_environment(cli)?;
            let config = commands::load_config(cli, &env)?;
            commands::example::run_example(&config.client).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default = if verbose { "mcpdemo=debug" } else { "mcpdemo=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
