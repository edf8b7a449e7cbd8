//! MCP client support
//!
//! Used by the `chat` and `example` commands to talk to the demo server.
//!
//! - `types`     -- protocol types and JSON-RPC primitives, shared with the server
//! - `client`    -- transport-agnostic async JSON-RPC 2.0 client
//! - `protocol`  -- typed MCP lifecycle wrapper over `JsonRpcClient`
//! - `session`   -- wires a transport to a client and runs the handshake
//! - `transport` -- `Transport` trait and the streamable HTTP implementation

pub mod client;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

pub use session::McpSession;
pub use types::*;
