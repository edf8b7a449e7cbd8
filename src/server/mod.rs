//! MCP server
//!
//! An axum application exposing the capability registry over streamable
//! HTTP (`/mcp`) and the legacy SSE transport (`/sse` + `/messages/`).
//! [`run`] is the server launcher: it loads the environment's catalog,
//! optionally starts the reload watcher, binds and serves until Ctrl-C.

pub mod handler;
pub mod reload;
pub mod routes;
pub mod session;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::environment::Environment;
use crate::error::{DemoError, Result};
use crate::registry::Registry;

pub use handler::Dispatcher;
pub use routes::router;
pub use session::SessionStore;

/// Shared state handed to every route
#[derive(Debug, Clone)]
pub struct AppState {
    /// JSON-RPC dispatcher
    pub dispatcher: Dispatcher,
    /// Live sessions of both transports
    pub sessions: SessionStore,
    /// SSE keep-alive interval
    pub keepalive: Duration,
}

impl AppState {
    /// State serving `registry` over `catalog`
    pub fn new(registry: Arc<Registry>, catalog: Catalog, keepalive: Duration) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry, catalog),
            sessions: SessionStore::new(),
            keepalive,
        }
    }

    /// Demo registry over the built-in catalog
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(
            Arc::new(Registry::with_defaults()?),
            Catalog::default(),
            Duration::from_secs(15),
        ))
    }
}

/// Bind the listening socket
///
/// # Errors
///
/// Returns [`DemoError::Bind`] carrying the socket error, for example when
/// the port is already in use
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|source| {
        DemoError::Bind {
            addr: addr.to_string(),
            source,
        }
        .into()
    })
}

/// Serve `state` on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Start the server for an environment and block until Ctrl-C
///
/// # Arguments
///
/// * `config` - Effective configuration
/// * `env` - Bootstrapped environment providing the catalog
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the address cannot
/// be bound
pub async fn run(config: &Config, env: &Environment) -> Result<()> {
    let catalog = Catalog::new(env.load_catalog()?);
    let registry = Arc::new(Registry::with_defaults()?);
    tracing::info!(
        prompts = registry.prompts.len(),
        resources = registry.resources.uris().count(),
        tools = registry.tools.len(),
        "Capabilities registered"
    );

    let _watcher = if config.server.reload {
        match reload::watch_catalog(env.catalog_path(), catalog.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("Catalog reload disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let state = AppState::new(registry, catalog, config.server.sse_keepalive());
    let listener = bind(&config.server.bind_addr()).await?;
    tracing::info!("MCP server listening on http://{}", listener.local_addr()?);

    serve(listener, state, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => tracing::warn!("Could not listen for Ctrl-C: {}", e),
    }
}
