//! Shared helpers for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use mcpdemo::config::ClientConfig;
use mcpdemo::server::{bind, serve, AppState};

/// A demo server running on an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve the default registry and catalog on `127.0.0.1:0`
    pub async fn start() -> Self {
        Self::start_with(AppState::with_defaults().expect("default state")).await
    }

    pub async fn start_with(state: AppState) -> Self {
        let listener = bind("127.0.0.1:0").await.expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            serve(listener, state, async {
                let _ = rx.await;
            })
            .await
            .expect("server error");
        });
        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client settings pointing at this server
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.base_url(),
            request_timeout_seconds: 5,
        }
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(Duration::from_secs(5), &mut self.handle).await;
    }
}
