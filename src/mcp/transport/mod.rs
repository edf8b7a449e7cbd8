//! MCP transport abstraction
//!
//! A [`Transport`] moves serialized JSON-RPC messages between the client and
//! a server. Callers `send` one message string at a time and read replies
//! from the `receive` stream; framing and session handling belong to the
//! implementation.
//!
//! - [`http::HttpTransport`] -- streamable HTTP against the demo server's
//!   `/mcp` endpoint.
//! - [`fake::FakeTransport`] -- in-process fake used in tests.

use std::pin::Pin;

use futures::Stream;

use crate::error::Result;

/// Abstraction over MCP transport implementations
///
/// Used polymorphically through `Arc<dyn Transport>`, so the session wiring
/// in [`crate::mcp::session`] works the same over HTTP and the test fake.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send a complete JSON-RPC message string to the server.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::DemoError::McpTransport`] if the message could
    /// not be delivered.
    async fn send(&self, message: String) -> Result<()>;

    /// Stream of inbound JSON-RPC message strings.
    ///
    /// Each item is one complete JSON value (a message or a batch). The
    /// stream ends when the transport is closed.
    fn receive(&self) -> Pin<Box<dyn Stream<Item = String> + Send + '_>>;
}

pub mod http;

#[cfg(test)]
pub mod fake;
