//! Connected MCP sessions
//!
//! [`McpSession`] ties a [`Transport`] to a [`JsonRpcClient`] and runs the
//! handshake. Two background tasks do the plumbing: one pumps outbound
//! messages into `Transport::send`, the other forwards `Transport::receive`
//! into the client's read loop. Dropping the session cancels both.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::mcp::client::{request_id_of, start_read_loop, JsonRpcClient};
use crate::mcp::protocol::{InitializedMcpProtocol, McpProtocol};
use crate::mcp::transport::http::HttpTransport;
use crate::mcp::transport::Transport;
use crate::mcp::types::Implementation;

/// A negotiated connection to one server
#[derive(Debug)]
pub struct McpSession {
    protocol: InitializedMcpProtocol,
    cancellation: CancellationToken,
}

impl McpSession {
    /// Connect to the server described by `config` over streamable HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is invalid, the server cannot be
    /// reached or the handshake fails
    pub async fn connect(config: &ClientConfig, client_name: &str) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let label = endpoint.to_string();
        let transport = HttpTransport::new(endpoint, HashMap::new(), config.request_timeout())?;
        Self::connect_with(
            Arc::new(transport),
            client_name,
            config.request_timeout(),
            label,
        )
        .await
    }

    /// Run the handshake over an arbitrary transport
    pub async fn connect_with(
        transport: Arc<dyn Transport>,
        client_name: &str,
        timeout: Duration,
        label: impl Into<String>,
    ) -> Result<Self> {
        let cancellation = CancellationToken::new();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        let client = Arc::new(
            JsonRpcClient::new(out_tx)
                .with_server_label(label)
                .with_default_timeout(timeout),
        );

        // Outbound pump
        {
            let transport = Arc::clone(&transport);
            let client = Arc::clone(&client);
            let token = cancellation.clone();
            tokio::spawn(async move {
                loop {
                    let msg = tokio::select! {
                        _ = token.cancelled() => break,
                        msg = out_rx.recv() => match msg {
                            Some(msg) => msg,
                            None => break,
                        },
                    };
                    if let Err(e) = transport.send(msg.clone()).await {
                        tracing::debug!("MCP send failed: {}", e);
                        if let Some(id) = request_id_of(&msg) {
                            client.fail_pending(id, e.to_string()).await;
                        }
                    }
                }
            });
        }

        // Inbound forwarder
        {
            let transport = Arc::clone(&transport);
            let token = cancellation.clone();
            tokio::spawn(async move {
                let mut stream = transport.receive();
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        item = stream.next() => match item {
                            Some(raw) => {
                                if in_tx.send(raw).is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
            });
        }

        start_read_loop(in_rx, cancellation.clone(), Arc::clone(&client));

        let info = Implementation {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        match McpProtocol::new(client).initialize(info).await {
            Ok(protocol) => Ok(Self {
                protocol,
                cancellation,
            }),
            Err(e) => {
                cancellation.cancel();
                Err(e)
            }
        }
    }

    /// The negotiated protocol handle
    pub fn protocol(&self) -> &InitializedMcpProtocol {
        &self.protocol
    }
}

impl std::ops::Deref for McpSession {
    type Target = InitializedMcpProtocol;

    fn deref(&self) -> &Self::Target {
        &self.protocol
    }
}

impl Drop for McpSession {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
