//! Tools module for mcpdemo
//!
//! This module contains the tool executor trait, the tool registry, and the
//! four demo tools: BMI calculation, temperature conversion, word counting,
//! and a context-annotated echo.
//!
//! Tools separate two kinds of failure. Arguments of the wrong shape are an
//! `Err(DemoError::InvalidArguments)` and surface as JSON-RPC `-32602`.
//! Well-formed arguments the tool refuses (a negative height, an unknown
//! unit) are an `Ok` result with `isError: true`, so the caller sees the
//! tool's own message.

pub mod bmi;
pub mod echo;
pub mod temperature;
pub mod word_count;

use crate::error::{DemoError, Result};
use crate::mcp::types::{CallToolResponse, McpTool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Rejections of well-formed tool input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// BMI needs strictly positive weight and height
    #[error("Weight and height must be positive values")]
    NonPositiveMeasurement,

    /// Temperature unit outside C/F/K
    #[error("Units must be 'C', 'F', or 'K'")]
    UnknownUnit(String),
}

/// Invocation metadata handed to every tool call
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// JSON-RPC id of the `tools/call` request, rendered as text
    pub request_id: String,
    /// When the server received the call
    pub received_at: DateTime<Utc>,
}

impl ToolContext {
    /// Context stamped with the current time
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            received_at: Utc::now(),
        }
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// # Examples
///
/// ```no_run
/// use mcpdemo::tools::{ToolContext, ToolExecutor};
/// use mcpdemo::mcp::types::{CallToolResponse, McpTool};
/// use mcpdemo::error::Result;
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// struct Ping;
///
/// #[async_trait]
/// impl ToolExecutor for Ping {
///     fn definition(&self) -> McpTool {
///         McpTool {
///             name: "ping".to_string(),
///             description: Some("Answers pong".to_string()),
///             input_schema: serde_json::json!({"type": "object", "properties": {}}),
///         }
///     }
///
///     async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<CallToolResponse> {
///         Ok(CallToolResponse::text("pong"))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Metadata returned by `tools/list`
    fn definition(&self) -> McpTool;

    /// Executes the tool with the given arguments
    ///
    /// # Arguments
    ///
    /// * `args` - Tool arguments object (`null` when the caller sent none)
    /// * `ctx` - Invocation metadata
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::InvalidArguments`] when `args` does not match
    /// the tool's input schema
    async fn execute(&self, args: serde_json::Value, ctx: &ToolContext)
        -> Result<CallToolResponse>;
}

/// Deserialize a tool's arguments, mapping shape errors to
/// [`DemoError::InvalidArguments`]
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: serde_json::Value) -> Result<T> {
    let args = if args.is_null() {
        serde_json::json!({})
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| DemoError::InvalidArguments(format!("{}: {}", tool, e)).into())
}

/// Round to two decimal places for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Tool registry for managing available tools
///
/// Names are unique; listing preserves registration order.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolExecutor>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry holding the four demo tools
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(bmi::CalculateBmiTool))?;
        registry.register(Arc::new(temperature::ConvertTemperatureTool))?;
        registry.register(Arc::new(word_count::WordCountTool))?;
        registry.register(Arc::new(echo::EchoWithContextTool))?;
        Ok(registry)
    }

    /// Register a tool executor under the name from its definition
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::DuplicateCapability`] if the name is taken
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) -> Result<()> {
        let name = executor.definition().name;
        if self.tools.contains_key(&name) {
            return Err(DemoError::DuplicateCapability {
                kind: "tool".to_string(),
                name,
            }
            .into());
        }
        self.order.push(name.clone());
        self.tools.insert(name, executor);
        Ok(())
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// All tool definitions in registration order
    pub fn definitions(&self) -> Vec<McpTool> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|executor| executor.definition())
            .collect()
    }

    /// Registered names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
