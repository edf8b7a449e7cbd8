//! `echo_with_context` tool
//!
//! Returns the message annotated with the id of the `tools/call` request and
//! the time the server received it.

use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::Deserialize;

use super::{parse_args, ToolContext, ToolExecutor};
use crate::error::Result;
use crate::mcp::types::{CallToolResponse, McpTool};

/// Tool name on the wire
pub const NAME: &str = "echo_with_context";

/// Render the echo text for `message` under `ctx`
pub fn render_echo(message: &str, ctx: &ToolContext) -> String {
    format!(
        "Echo: {}\nRequest ID: {}\nTimestamp: {}",
        message,
        ctx.request_id,
        ctx.received_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

#[derive(Debug, Deserialize)]
struct EchoArgs {
    message: String,
}

/// Executor for [`NAME`]
pub struct EchoWithContextTool;

#[async_trait]
impl ToolExecutor for EchoWithContextTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: NAME.to_string(),
            description: Some(
                "Echo a message back with the request ID and server timestamp".to_string(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string", "description": "Message to echo"}
                },
                "required": ["message"]
            }),
        }
    }

    async fn execute(
        &self,
        args: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<CallToolResponse> {
        let args: EchoArgs = parse_args(NAME, args)?;
        tracing::info!(request_id = %ctx.request_id, "Echo requested: {}", args.message);
        Ok(CallToolResponse::text(render_echo(&args.message, ctx)))
    }
}
