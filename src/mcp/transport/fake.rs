//! In-process fake transport for tests
//!
//! [`FakeTransport`] implements [`Transport`] over Tokio channels. The paired
//! [`FakeTransportHandle`] plays the server: it reads what the client sent
//! and injects replies.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, Mutex};

use crate::error::{DemoError, Result};
use crate::mcp::transport::Transport;

/// Channel-backed [`Transport`]
#[derive(Debug)]
pub struct FakeTransport {
    outbound_tx: mpsc::UnboundedSender<String>,
    inbound_rx: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
}

/// Server side of a [`FakeTransport`]
#[derive(Debug)]
pub struct FakeTransportHandle {
    /// Messages the client sent
    pub outbound_rx: mpsc::UnboundedReceiver<String>,
    /// Feed replies to the client
    pub inbound_tx: mpsc::UnboundedSender<String>,
}

impl FakeTransport {
    /// A transport and the handle driving it
    pub fn new() -> (Self, FakeTransportHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<String>();

        (
            Self {
                outbound_tx,
                inbound_rx: Arc::new(Mutex::new(inbound_rx)),
            },
            FakeTransportHandle {
                outbound_rx,
                inbound_tx,
            },
        )
    }
}

impl FakeTransportHandle {
    /// Next message the client sent, parsed
    pub async fn next_message(&mut self) -> Option<serde_json::Value> {
        let raw = self.outbound_rx.recv().await?;
        serde_json::from_str(&raw).ok()
    }

    /// Reply to request `id` with `result`
    pub fn reply(&self, id: &serde_json::Value, result: serde_json::Value) {
        let response = serde_json::json!({"jsonrpc": "2.0", "id": id, "result": result});
        let _ = self.inbound_tx.send(response.to_string());
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send(&self, message: String) -> Result<()> {
        self.outbound_tx.send(message).map_err(|e| {
            DemoError::McpTransport(format!("FakeTransport outbound channel closed: {}", e)).into()
        })
    }

    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.inbound_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_reaches_handle() {
        let (transport, mut handle) = FakeTransport::new();
        transport
            .send(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#.to_string())
            .await
            .unwrap();
        let msg = handle.next_message().await.unwrap();
        assert_eq!(msg["method"], "ping");
    }

    #[tokio::test]
    async fn test_reply_reaches_receive_in_order() {
        let (transport, handle) = FakeTransport::new();
        for i in 0..3 {
            handle.reply(&serde_json::json!(i), serde_json::json!({}));
        }

        let mut stream = transport.receive();
        for i in 0..3 {
            let raw = tokio::time::timeout(Duration::from_secs(2), stream.next())
                .await
                .expect("timed out")
                .expect("stream ended");
            let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(value["id"], i);
        }
    }

    #[tokio::test]
    async fn test_send_fails_when_handle_dropped() {
        let (transport, handle) = FakeTransport::new();
        drop(handle);
        assert!(transport.send("x".to_string()).await.is_err());
    }

    #[test]
    fn test_object_safe() {
        let (transport, _handle) = FakeTransport::new();
        let _boxed: Box<dyn Transport> = Box::new(transport);
    }
}
