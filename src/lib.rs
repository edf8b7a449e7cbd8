//! mcpdemo - a Model Context Protocol demonstration harness
//!
//! The library behind the `mcpdemo` binary: an HTTP MCP server exposing a
//! small fixed set of prompts, resources and tools, and the clients that
//! talk to it.
//!
//! # Architecture
//!
//! - `environment`: bootstraps the isolated environment directory
//! - `catalog`: the demo data set (weather table and facts)
//! - `prompts`, `resources`, `tools`: the capabilities
//! - `registry`: all capabilities with unique names per category
//! - `server`: axum server, JSON-RPC dispatch, sessions, catalog reload
//! - `mcp`: protocol types and the client stack
//! - `commands`: subcommand handlers
//! - `config`, `error`, `cli`: ambient plumbing
//!
//! # Example
//!
//! ```no_run
//! use mcpdemo::environment::Environment;
//! use mcpdemo::{Cli, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (env, _outcome) = Environment::ensure(".mcpdemo")?;
//!     let config = Config::load(&env.config_path(), &Cli::default())?;
//!     config.validate()?;
//!     mcpdemo::server::run(&config, &env).await
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod environment;
pub mod error;
pub mod mcp;
pub mod prompts;
pub mod registry;
pub mod resources;
pub mod server;
pub mod tools;

pub use cli::Cli;
pub use config::Config;
pub use error::{DemoError, Result};
pub use registry::{Capability, CapabilityKind, Registry};
