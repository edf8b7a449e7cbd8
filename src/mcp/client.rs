//! Transport-agnostic async JSON-RPC 2.0 client
//!
//! [`JsonRpcClient`] correlates outgoing requests with incoming responses.
//! It never touches the network itself:
//!
//! - Requests are serialized and pushed onto an outbound channel; whoever
//!   owns the receiving end (see [`crate::mcp::session`]) writes them to a
//!   transport.
//! - [`start_read_loop`] consumes inbound message strings and completes the
//!   matching pending request.
//! - A [`tokio_util::sync::CancellationToken`] stops the read loop; pending
//!   requests then fail instead of waiting for their timeout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::{DemoError, Result};
use crate::mcp::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR};

/// Timeout applied when the caller does not pass one
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type NotificationHandler = Box<dyn Fn(serde_json::Value) + Send + Sync + 'static>;

type PendingMap =
    HashMap<u64, oneshot::Sender<std::result::Result<serde_json::Value, JsonRpcError>>>;

/// Async JSON-RPC 2.0 client
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use tokio_util::sync::CancellationToken;
/// use mcpdemo::mcp::client::{start_read_loop, JsonRpcClient};
///
/// # async fn example() -> mcpdemo::error::Result<()> {
/// let (out_tx, _out_rx) = mpsc::unbounded_channel::<String>();
/// let (_in_tx, in_rx) = mpsc::unbounded_channel::<String>();
/// let client = Arc::new(JsonRpcClient::new(out_tx));
/// start_read_loop(in_rx, CancellationToken::new(), Arc::clone(&client));
/// let _: serde_json::Value = client.request("ping", serde_json::json!({}), None).await?;
/// # Ok(())
/// # }
/// ```
pub struct JsonRpcClient {
    pub(crate) next_id: AtomicU64,
    pub(crate) pending: Arc<Mutex<PendingMap>>,
    pub(crate) outbound_tx: mpsc::UnboundedSender<String>,
    pub(crate) notification_handlers: Arc<Mutex<HashMap<String, NotificationHandler>>>,
    server_label: String,
    default_timeout: Duration,
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("server", &self.server_label)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl JsonRpcClient {
    /// Client writing serialized messages to `outbound_tx`
    pub fn new(outbound_tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
            outbound_tx,
            notification_handlers: Arc::new(Mutex::new(HashMap::new())),
            server_label: "(unknown)".to_string(),
            default_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Name the server in timeout errors
    pub fn with_server_label(mut self, label: impl Into<String>) -> Self {
        self.server_label = label.into();
        self
    }

    /// Replace [`DEFAULT_REQUEST_TIMEOUT`]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Send a request and wait for its result
    ///
    /// # Arguments
    ///
    /// * `method` - JSON-RPC method name
    /// * `params` - Serializable parameters
    /// * `timeout` - Overrides the client's default timeout
    ///
    /// # Errors
    ///
    /// - [`DemoError::McpTimeout`] if no response arrives in time
    /// - [`DemoError::McpTransport`] if the message cannot be delivered
    /// - [`DemoError::Mcp`] if the server answers with a JSON-RPC error
    /// - [`DemoError::Serialization`] if the result has the wrong shape
    pub async fn request<P, R>(
        &self,
        method: &str,
        params: P,
        timeout: Option<Duration>,
    ) -> Result<R>
    where
        P: serde::Serialize + Send,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        // Register before sending so a fast response cannot be missed.
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let message = serde_json::to_string(&JsonRpcRequest::new(
            serde_json::json!(id),
            method,
            Some(serde_json::to_value(params)?),
        ))?;

        if self.outbound_tx.send(message).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(DemoError::McpTransport("outbound channel closed".to_string()).into());
        }

        let deadline = timeout.unwrap_or(self.default_timeout);
        let outcome = match tokio::time::timeout(deadline, rx).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.pending.lock().await.remove(&id);
                return Err(DemoError::McpTimeout {
                    server: self.server_label.clone(),
                    method: method.to_string(),
                }
                .into());
            }
        };

        let rpc_result = outcome.map_err(|_| {
            DemoError::McpTransport("connection closed before response arrived".to_string())
        })?;

        let value = rpc_result.map_err(|e| DemoError::Mcp(e.message))?;

        serde_json::from_value(value).map_err(|e| DemoError::Serialization(e).into())
    }

    /// Send a notification; no response is expected
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::McpTransport`] if the outbound channel is closed
    pub fn notify<P: serde::Serialize + Send>(&self, method: &str, params: P) -> Result<()> {
        let message = serde_json::to_string(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": serde_json::to_value(params)?
        }))?;

        self.outbound_tx
            .send(message)
            .map_err(|_| DemoError::McpTransport("outbound channel closed".to_string()))?;

        Ok(())
    }

    /// Register a handler for a server notification
    pub async fn on_notification(
        &self,
        method: impl Into<String>,
        f: impl Fn(serde_json::Value) + Send + Sync + 'static,
    ) {
        self.notification_handlers
            .lock()
            .await
            .insert(method.into(), Box::new(f));
    }

    /// Fail a pending request immediately
    ///
    /// Used when the transport could not deliver the request, so the caller
    /// sees the delivery error instead of a timeout.
    pub async fn fail_pending(&self, id: u64, message: impl Into<String>) {
        if let Some(tx) = self.pending.lock().await.remove(&id) {
            let _ = tx.send(Err(JsonRpcError::new(INTERNAL_ERROR, message)));
        }
    }

    /// Number of requests awaiting a response
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

/// Numeric id of a serialized outgoing request, if it has one
pub fn request_id_of(raw: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    if value.get("method").is_none() {
        return None;
    }
    value.get("id")?.as_u64()
}

/// Spawn the task routing inbound messages to `client`
///
/// The loop ends when `cancellation` fires or `inbound_rx` closes; either
/// way every pending request is dropped so its caller fails promptly.
pub fn start_read_loop(
    mut inbound_rx: mpsc::UnboundedReceiver<String>,
    cancellation: CancellationToken,
    client: Arc<JsonRpcClient>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,

                maybe_msg = inbound_rx.recv() => match maybe_msg {
                    Some(raw) => dispatch_message(&raw, &client).await,
                    None => break,
                },
            }
        }
        client.pending.lock().await.clear();
    })
}

async fn dispatch_message(raw: &str, client: &Arc<JsonRpcClient>) {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("MCP read loop: failed to parse inbound JSON: {e}");
            return;
        }
    };

    // A batch reply is routed item by item.
    if let serde_json::Value::Array(items) = value {
        for item in items {
            route_value(item, client).await;
        }
        return;
    }

    route_value(value, client).await;
}

async fn route_value(value: serde_json::Value, client: &Arc<JsonRpcClient>) {
    let has_id = value.get("id").is_some_and(|id| !id.is_null());
    let has_method = value.get("method").is_some();
    let has_outcome = value.get("result").is_some() || value.get("error").is_some();

    if has_id && has_outcome && !has_method {
        handle_response(value, client).await;
    } else if has_id && has_method {
        reject_server_request(value, client);
    } else if has_method {
        handle_notification(value, client).await;
    } else if has_outcome {
        // Error replies to unparseable requests carry a null id.
        tracing::warn!("MCP read loop: uncorrelated reply: {value}");
    } else {
        tracing::debug!("MCP read loop: ignoring unclassifiable message");
    }
}

async fn handle_response(value: serde_json::Value, client: &Arc<JsonRpcClient>) {
    let id_val = &value["id"];
    let id = match id_val
        .as_u64()
        .or_else(|| id_val.as_str().and_then(|s| s.parse().ok()))
    {
        Some(id) => id,
        None => {
            tracing::warn!("MCP read loop: response has non-integer id: {id_val}");
            return;
        }
    };

    let Some(tx) = client.pending.lock().await.remove(&id) else {
        tracing::debug!("MCP read loop: received response for unknown id {id}; ignoring");
        return;
    };

    let outcome = match value.get("error") {
        Some(error_val) => Err(serde_json::from_value::<JsonRpcError>(error_val.clone())
            .unwrap_or_else(|_| {
                JsonRpcError::new(INTERNAL_ERROR, format!("malformed error object: {error_val}"))
            })),
        None => Ok(value
            .get("result")
            .cloned()
            .unwrap_or(serde_json::Value::Null)),
    };

    // The caller may already have timed out.
    let _ = tx.send(outcome);
}

/// The demo clients expose no client-side methods.
fn reject_server_request(value: serde_json::Value, client: &Arc<JsonRpcClient>) {
    let method = value
        .get("method")
        .and_then(|m| m.as_str())
        .unwrap_or_default();
    let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);

    let response = JsonRpcResponse::failure(id, JsonRpcError::method_not_found(method));
    if let Ok(serialized) = serde_json::to_string(&response) {
        let _ = client.outbound_tx.send(serialized);
    }
}

async fn handle_notification(value: serde_json::Value, client: &Arc<JsonRpcClient>) {
    let Some(method) = value.get("method").and_then(|m| m.as_str()) else {
        return;
    };
    let params = value
        .get("params")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    let handlers = client.notification_handlers.lock().await;
    match handlers.get(method) {
        Some(handler) => handler(params),
        None => tracing::debug!("MCP read loop: no handler for notification '{method}'; ignoring"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn make_client() -> (
        Arc<JsonRpcClient>,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedSender<String>,
        CancellationToken,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();
        let token = CancellationToken::new();
        let client = Arc::new(
            JsonRpcClient::new(out_tx)
                .with_server_label("test")
                .with_default_timeout(Duration::from_secs(5)),
        );
        start_read_loop(in_rx, token.clone(), Arc::clone(&client));
        (client, out_rx, in_tx, token)
    }

    async fn next_request(rx: &mut mpsc::UnboundedReceiver<String>) -> serde_json::Value {
        let raw = rx.recv().await.unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_request_resolves_with_result() {
        let (client, mut out_rx, in_tx, _token) = make_client();

        tokio::spawn(async move {
            let req = next_request(&mut out_rx).await;
            assert_eq!(req["method"], "tools/list");
            let reply = serde_json::json!({"jsonrpc": "2.0", "id": req["id"], "result": {"tools": []}});
            in_tx.send(reply.to_string()).unwrap();
        });

        let result: serde_json::Value = client
            .request("tools/list", serde_json::json!({}), None)
            .await
            .unwrap();
        assert_eq!(result["tools"], serde_json::json!([]));
        assert_eq!(client.pending_len().await, 0);
    }

    #[tokio::test]
    async fn test_request_error_becomes_mcp_error() {
        let (client, mut out_rx, in_tx, _token) = make_client();

        tokio::spawn(async move {
            let req = next_request(&mut out_rx).await;
            let reply = serde_json::json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "error": {"code": -32602, "message": "Invalid params: nope"}
            });
            in_tx.send(reply.to_string()).unwrap();
        });

        let err = client
            .request::<_, serde_json::Value>("prompts/get", serde_json::json!({}), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid params: nope"));
    }

    #[tokio::test]
    async fn test_request_times_out() {
        let (client, _out_rx, _in_tx, _token) = make_client();
        let err = client
            .request::<_, serde_json::Value>(
                "ping",
                serde_json::json!({}),
                Some(Duration::from_millis(20)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DemoError>(),
            Some(DemoError::McpTimeout { .. })
        ));
        assert_eq!(client.pending_len().await, 0);
    }

    #[tokio::test]
    async fn test_cancellation_fails_pending() {
        let (client, mut out_rx, _in_tx, token) = make_client();

        tokio::spawn(async move {
            let _ = out_rx.recv().await;
            token.cancel();
        });

        let err = client
            .request::<_, serde_json::Value>("ping", serde_json::json!({}), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection closed"));
    }

    #[tokio::test]
    async fn test_fail_pending_surfaces_message() {
        let (client, mut out_rx, _in_tx, _token) = make_client();
        let failer = Arc::clone(&client);

        tokio::spawn(async move {
            let raw = out_rx.recv().await.unwrap();
            let id = request_id_of(&raw).unwrap();
            failer.fail_pending(id, "connection refused").await;
        });

        let err = client
            .request::<_, serde_json::Value>("ping", serde_json::json!({}), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_server_request_is_rejected() {
        let (_client, mut out_rx, in_tx, _token) = make_client();
        in_tx
            .send(r#"{"jsonrpc":"2.0","id":"s1","method":"sampling/createMessage"}"#.to_string())
            .unwrap();

        let reply = next_request(&mut out_rx).await;
        assert_eq!(reply["id"], "s1");
        assert_eq!(reply["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_notification_handler_runs() {
        let (client, _out_rx, in_tx, _token) = make_client();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        client
            .on_notification("notifications/message", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        in_tx
            .send(r#"{"jsonrpc":"2.0","method":"notifications/message","params":{}}"#.to_string())
            .unwrap();

        for _ in 0..50 {
            if hits.load(Ordering::SeqCst) == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("notification handler did not run");
    }

    #[test]
    fn test_request_id_of() {
        assert_eq!(request_id_of(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#), Some(7));
        assert_eq!(request_id_of(r#"{"jsonrpc":"2.0","method":"ping"}"#), None);
        assert_eq!(request_id_of(r#"{"jsonrpc":"2.0","id":7,"result":{}}"#), None);
        assert_eq!(request_id_of("garbage"), None);
    }
}
