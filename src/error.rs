//! Error types for mcpdemo
//!
//! This module defines the domain errors raised by the environment
//! bootstrap, the server, and the MCP clients, using `thiserror` for
//! ergonomic error handling.

use thiserror::Error;

/// Main error type for mcpdemo operations
///
/// Fallible functions return [`Result`], which wraps these variants in
/// `anyhow::Error`; callers that need to react to a specific failure (the
/// launcher checking for a missing environment, for example) downcast.
#[derive(Error, Debug)]
pub enum DemoError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A client was launched before the environment was bootstrapped
    #[error(
        "Environment not found at {path}. Please run the server setup first \
         (`mcpdemo setup` or scripts/run_server.sh)."
    )]
    EnvironmentMissing {
        /// Directory that was expected to hold the environment
        path: String,
    },

    /// Environment files exist but could not be used
    #[error("Environment error: {0}")]
    Environment(String),

    /// The HTTP listener could not bind
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// Two capabilities in the same category share a name
    #[error("Duplicate {kind} capability: {name}")]
    DuplicateCapability {
        /// Category tag (`prompt`, `resource`, `tool`)
        kind: String,
        /// Offending name
        name: String,
    },

    /// Arguments did not match what a prompt or tool expects
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// No resource matches the URI
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The server answered a request with a JSON-RPC error
    #[error("MCP error: {0}")]
    Mcp(String),

    /// The request never reached the server, or its reply never came back
    #[error("MCP transport error: {0}")]
    McpTransport(String),

    /// No response arrived in time
    #[error("MCP timeout: {method} on {server}")]
    McpTimeout {
        /// Server URL
        server: String,
        /// Method that timed out
        method: String,
    },

    /// The server picked a protocol revision this client does not speak
    #[error("MCP protocol version mismatch: expected one of {expected:?}, got {got}")]
    McpProtocolVersion {
        /// Revisions the client accepts
        expected: Vec<String>,
        /// Revision the server chose
        got: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem watcher errors
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type alias for mcpdemo operations
///
/// Uses `anyhow::Error` so call sites can attach context while still
/// allowing a downcast to [`DemoError`].
pub type Result<T> = anyhow::Result<T>;
