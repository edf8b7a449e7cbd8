//! Streamable HTTP transport
//!
//! Every outbound JSON-RPC message is sent as an HTTP POST to the MCP
//! endpoint. The server may reply with:
//!
//! - `application/json` -- a direct JSON response body
//! - `text/event-stream` -- an SSE stream carrying one or more JSON-RPC
//!   messages
//! - `202 Accepted` -- an acknowledgement with no body (notifications)
//!
//! # Session management
//!
//! The `Mcp-Session-Id` header returned with the `initialize` response is
//! stored and attached to every later POST. A `404` while a session is
//! active means the server forgot it; the session is cleared and
//! `DemoError::Mcp("mcp session expired")` is returned.
//!
//! # Drop behaviour
//!
//! Dropping the transport with an active session issues a best-effort HTTP
//! DELETE on a helper thread so the server can release the session.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use tokio::sync::{mpsc, RwLock};

use crate::error::{DemoError, Result};
use crate::mcp::transport::Transport;
use crate::mcp::types::LATEST_PROTOCOL_VERSION;

const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Streamable HTTP transport
///
/// # Examples
///
/// ```no_run
/// use std::collections::HashMap;
/// use std::time::Duration;
/// use url::Url;
/// use mcpdemo::mcp::transport::http::HttpTransport;
///
/// # fn example() -> mcpdemo::error::Result<()> {
/// let transport = HttpTransport::new(
///     Url::parse("http://localhost:8000/mcp")?,
///     HashMap::new(),
///     Duration::from_secs(30),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: url::Url,
    session_id: Arc<RwLock<Option<String>>>,
    /// Extra headers merged into every request.
    headers: HashMap<String, String>,
    response_tx: mpsc::UnboundedSender<String>,
    response_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>>,
}

impl HttpTransport {
    /// Construct a transport targeting `endpoint`
    ///
    /// No network I/O happens here.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - MCP endpoint URL, e.g. `http://localhost:8000/mcp`
    /// * `headers` - Extra headers added to every request
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::Http`] if the HTTP client cannot be built
    pub fn new(
        endpoint: url::Url,
        headers: HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DemoError::from)?;

        let (response_tx, response_rx) = mpsc::unbounded_channel();

        Ok(Self {
            http_client,
            endpoint,
            session_id: Arc::new(RwLock::new(None)),
            headers,
            response_tx,
            response_rx: Arc::new(tokio::sync::Mutex::new(response_rx)),
        })
    }

    /// Endpoint this transport posts to
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }

    /// Session id issued by the server, once initialized
    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    /// POST one message to the endpoint.
    ///
    /// Headers on every POST: `Content-Type: application/json`,
    /// `Accept: application/json, text/event-stream`,
    /// `Mcp-Protocol-Version`, and `Mcp-Session-Id` once a session exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or a `404` arrives while a session is active.
    async fn send(&self, message: String) -> Result<()> {
        let mut req = self
            .http_client
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .header("Mcp-Protocol-Version", LATEST_PROTOCOL_VERSION)
            .body(message);

        if let Some(id) = self.session_id.read().await.as_deref() {
            req = req.header(SESSION_HEADER, id);
        }

        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let response = req
            .send()
            .await
            .map_err(|e| DemoError::McpTransport(format!("HTTP POST failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            let mut sid = self.session_id.write().await;
            if sid.take().is_some() {
                return Err(DemoError::Mcp("mcp session expired".into()).into());
            }
            return Err(DemoError::McpTransport("HTTP 404 Not Found".into()).into());
        }

        if status == reqwest::StatusCode::ACCEPTED {
            return Ok(());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DemoError::McpTransport(format!(
                "HTTP POST returned status {}: {}",
                status,
                body.trim()
            ))
            .into());
        }

        if let Some(new_session_id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
        {
            let mut sid = self.session_id.write().await;
            if sid.is_none() {
                tracing::debug!(session = %new_session_id, "MCP session established");
                *sid = Some(new_session_id);
            }
        }

        let content_type = response
            .headers()
            .get("Content-Type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("text/event-stream") {
            let byte_stream = response.bytes_stream();
            let response_tx = self.response_tx.clone();
            tokio::spawn(async move {
                parse_sse_stream(byte_stream, response_tx).await;
            });
        } else {
            let body = response.text().await.map_err(|e| {
                DemoError::McpTransport(format!("failed to read response body: {}", e))
            })?;
            if !body.trim().is_empty() {
                let _ = self.response_tx.send(body);
            }
        }

        Ok(())
    }

    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>> {
        let rx = Arc::clone(&self.response_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        // Skip cleanup rather than block if the lock is held.
        let session_id = match self.session_id.try_read() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };

        if let Some(sid) = session_id {
            let endpoint = self.endpoint.as_str().to_string();
            let mut extra_headers = self.headers.clone();
            extra_headers.insert(SESSION_HEADER.to_string(), sid);

            // A blocking client must not run on the async runtime's threads.
            let _ = std::thread::spawn(move || {
                if let Ok(client) = reqwest::blocking::Client::builder()
                    .timeout(Duration::from_secs(5))
                    .build()
                {
                    let mut req = client.delete(&endpoint);
                    for (k, v) in &extra_headers {
                        req = req.header(k.as_str(), v.as_str());
                    }
                    let _ = req.send();
                }
            });
        }
    }
}

/// Forward complete `data:` payloads of an SSE byte stream to `response_tx`
///
/// Events are separated by a blank line. `event: ping` events, `[PING]`
/// payloads and comment lines are dropped. Runs until the stream ends.
pub async fn parse_sse_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>>,
    response_tx: mpsc::UnboundedSender<String>,
) {
    use futures::StreamExt;

    let mut buffer = String::new();

    tokio::pin!(byte_stream);

    while let Some(chunk_result) = byte_stream.next().await {
        let Ok(chunk) = chunk_result else {
            break;
        };

        let Ok(text) = std::str::from_utf8(&chunk) else {
            continue;
        };

        buffer.push_str(&text.replace("\r\n", "\n"));

        while let Some(pos) = buffer.find("\n\n") {
            let event_block = buffer[..pos].to_string();
            buffer.drain(..pos + 2);
            process_sse_event(&event_block, &response_tx);
        }
    }

    if !buffer.trim().is_empty() {
        process_sse_event(&buffer, &response_tx);
    }
}

fn process_sse_event(event_block: &str, response_tx: &mpsc::UnboundedSender<String>) {
    let mut data_lines: Vec<&str> = Vec::new();
    let mut event_type: Option<&str> = None;

    for line in event_block.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.trim());
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim());
        }
    }

    if event_type.is_some_and(|et| et.eq_ignore_ascii_case("ping")) {
        return;
    }

    let data = data_lines.join("\n");
    if data.is_empty() || data.eq_ignore_ascii_case("[ping]") {
        return;
    }

    let _ = response_tx.send(data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt as _;

    fn make_transport(endpoint: &str) -> HttpTransport {
        HttpTransport::new(
            url::Url::parse(endpoint).unwrap(),
            HashMap::new(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn sse_chunks(chunks: &[&str]) -> impl Stream<Item = reqwest::Result<Bytes>> {
        let owned: Vec<reqwest::Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.to_string())))
            .collect();
        futures::stream::iter(owned)
    }

    #[tokio::test]
    async fn test_receive_initially_empty() {
        let t = make_transport("http://localhost:9999/mcp");
        let mut stream = t.receive();
        let result = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
        assert!(result.is_err(), "expected timeout on empty receive stream");
    }

    #[tokio::test]
    async fn test_session_id_initially_none() {
        let t = make_transport("http://localhost:9999/mcp");
        assert!(t.session_id().await.is_none());
        assert_eq!(t.endpoint().path(), "/mcp");
    }

    #[tokio::test]
    async fn test_parse_sse_two_events() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        parse_sse_stream(sse_chunks(&["data: first\n\ndata: second\n\n"]), tx).await;
        assert_eq!(rx.try_recv().unwrap(), "first");
        assert_eq!(rx.try_recv().unwrap(), "second");
    }

    #[tokio::test]
    async fn test_parse_sse_event_split_across_chunks() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        parse_sse_stream(
            sse_chunks(&["event: message\nda", "ta: {\"id\":1}\r\n", "\r\n"]),
            tx,
        )
        .await;
        assert_eq!(rx.try_recv().unwrap(), r#"{"id":1}"#);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_parse_sse_pings_and_comments_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        parse_sse_stream(
            sse_chunks(&[": keep-alive\n\nevent: ping\ndata: x\n\ndata: [PING]\n\ndata: real\n\n"]),
            tx,
        )
        .await;
        assert_eq!(rx.try_recv().unwrap(), "real");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_parse_sse_trailing_event_without_blank_line() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        parse_sse_stream(sse_chunks(&["data: tail"]), tx).await;
        assert_eq!(rx.try_recv().unwrap(), "tail");
    }

    #[tokio::test]
    async fn test_send_to_closed_port_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let t = make_transport(&format!("http://{addr}/mcp"));
        let err = t.send("{}".to_string()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DemoError>(),
            Some(DemoError::McpTransport(_))
        ));
    }
}
