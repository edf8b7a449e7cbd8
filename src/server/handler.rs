//! JSON-RPC dispatcher
//!
//! Turns one decoded JSON-RPC message (or a batch) into the reply the HTTP
//! layer should send. Transport concerns such as sessions and status codes
//! stay in [`super::routes`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::DemoError;
use crate::mcp::types::{
    CallToolParams, GetPromptParams, Implementation, InitializeParams, InitializeResponse,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListPromptsResponse,
    ListResourceTemplatesResponse, ListResourcesResponse, ListToolsResponse, ReadResourceParams,
    LATEST_PROTOCOL_VERSION, METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_PING,
    METHOD_PROMPTS_GET, METHOD_PROMPTS_LIST, METHOD_RESOURCES_LIST, METHOD_RESOURCES_READ,
    METHOD_RESOURCES_TEMPLATES_LIST, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, NOTIF_CANCELLED,
    SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::registry::Registry;
use crate::tools::ToolContext;

/// `serverInfo.name` reported by `initialize`
pub const SERVER_NAME: &str = "mcp-server-demo";

const INSTRUCTIONS: &str = "Demo server: try the greeting prompt, read weather://london \
                            or facts://random, or call calculate_bmi.";

type MethodResult = std::result::Result<Value, JsonRpcError>;

/// Routes JSON-RPC methods to the capability registry
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    catalog: Catalog,
}

impl Dispatcher {
    /// Dispatcher over `registry`, reading resource data from `catalog`
    pub fn new(registry: Arc<Registry>, catalog: Catalog) -> Self {
        Self { registry, catalog }
    }

    /// The registry being served
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle a decoded message body
    ///
    /// Accepts a single message or a batch. Returns `None` when nothing needs
    /// to be sent back: notifications, client responses, or a batch made up
    /// only of those.
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        match message {
            Value::Array(items) if items.is_empty() => Some(to_value(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::invalid_request("empty batch"),
            ))),
            Value::Array(items) => {
                let mut replies = Vec::new();
                for item in items {
                    if let Some(reply) = self.handle_single(item).await {
                        replies.push(to_value(reply));
                    }
                }
                (!replies.is_empty()).then_some(Value::Array(replies))
            }
            single => self.handle_single(single).await.map(to_value),
        }
    }

    async fn handle_single(&self, message: Value) -> Option<JsonRpcResponse> {
        if is_client_response(&message) {
            debug!("Ignoring client response: {}", message);
            return None;
        }

        let id = message.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(e),
                ))
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
            ));
        }

        self.dispatch(request).await
    }

    /// Dispatch a parsed request; `None` for notifications
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.notify(&request);
            return None;
        };

        debug!(method = %request.method, id = %id, "Dispatching request");

        let result = match request.method.as_str() {
            METHOD_INITIALIZE => self.initialize(request.params),
            METHOD_PING => Ok(serde_json::json!({})),
            METHOD_TOOLS_LIST => self.list_tools(),
            METHOD_TOOLS_CALL => self.call_tool(request.params, &id).await,
            METHOD_RESOURCES_LIST => self.list_resources(),
            METHOD_RESOURCES_TEMPLATES_LIST => self.list_resource_templates(),
            METHOD_RESOURCES_READ => self.read_resource(request.params).await,
            METHOD_PROMPTS_LIST => self.list_prompts(),
            METHOD_PROMPTS_GET => self.get_prompt(request.params),
            method => {
                warn!("Unknown method: {}", method);
                Err(JsonRpcError::method_not_found(method))
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => {
                debug!(code = error.code, "Request failed: {}", error.message);
                JsonRpcResponse::failure(id, error)
            }
        })
    }

    fn notify(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            METHOD_INITIALIZED => info!("Client initialized"),
            NOTIF_CANCELLED => debug!("Client cancelled a request"),
            other => debug!("Ignoring notification: {}", other),
        }
    }

    fn initialize(&self, params: Option<Value>) -> MethodResult {
        let params: InitializeParams = parse_params(params)?;
        let protocol_version = negotiate_version(&params.protocol_version);

        info!(
            client = %params.client_info.name,
            version = %params.client_info.version,
            protocol = %protocol_version,
            "Client connected"
        );

        to_result(InitializeResponse {
            protocol_version: protocol_version.to_string(),
            capabilities: self.registry.server_capabilities(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        })
    }

    fn list_tools(&self) -> MethodResult {
        to_result(ListToolsResponse {
            tools: self.registry.tools.definitions(),
            next_cursor: None,
        })
    }

    async fn call_tool(&self, params: Option<Value>, id: &Value) -> MethodResult {
        let params: CallToolParams = parse_params(params)?;
        let tool = self.registry.tools.get(&params.name).ok_or_else(|| {
            JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name))
        })?;

        let ctx = ToolContext::new(request_id_text(id));
        info!(tool = %params.name, request_id = %ctx.request_id, "Calling tool");

        let arguments = params.arguments.unwrap_or(Value::Null);
        let response = tool.execute(arguments, &ctx).await.map_err(map_error)?;
        to_result(response)
    }

    fn list_resources(&self) -> MethodResult {
        to_result(ListResourcesResponse {
            resources: self.registry.resources.resources().to_vec(),
        })
    }

    fn list_resource_templates(&self) -> MethodResult {
        to_result(ListResourceTemplatesResponse {
            resource_templates: self.registry.resources.templates().to_vec(),
        })
    }

    async fn read_resource(&self, params: Option<Value>) -> MethodResult {
        let params: ReadResourceParams = parse_params(params)?;
        let response = self
            .registry
            .resources
            .read(&params.uri, &self.catalog)
            .await
            .map_err(map_error)?;
        to_result(response)
    }

    fn list_prompts(&self) -> MethodResult {
        to_result(ListPromptsResponse {
            prompts: self.registry.prompts.list(),
        })
    }

    fn get_prompt(&self, params: Option<Value>) -> MethodResult {
        let params: GetPromptParams = parse_params(params)?;
        let args = params.arguments.unwrap_or_default();
        let response = self
            .registry
            .prompts
            .render(&params.name, &args)
            .map_err(map_error)?;
        to_result(response)
    }
}

/// Pick the protocol revision to answer with
///
/// # Examples
///
/// ```
/// use mcpdemo::server::handler::negotiate_version;
///
/// assert_eq!(negotiate_version("2024-11-05"), "2024-11-05");
/// assert_eq!(negotiate_version("1999-01-01"), "2025-11-25");
/// ```
pub fn negotiate_version(requested: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|v| *v == requested)
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

/// True if `message` is a single `initialize` request or a batch holding one
pub fn contains_initialize(message: &Value) -> bool {
    let is_init = |m: &Value| m.get("method").and_then(Value::as_str) == Some(METHOD_INITIALIZE);
    match message {
        Value::Array(items) => items.iter().any(is_init),
        single => is_init(single),
    }
}

fn is_client_response(message: &Value) -> bool {
    message.get("method").is_none()
        && (message.get("result").is_some() || message.get("error").is_some())
}

fn request_id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_params<T: DeserializeOwned>(
    params: Option<Value>,
) -> std::result::Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(params).map_err(JsonRpcError::invalid_params)
}

fn to_result<T: serde::Serialize>(value: T) -> MethodResult {
    serde_json::to_value(value).map_err(JsonRpcError::internal)
}

fn to_value(response: JsonRpcResponse) -> Value {
    serde_json::to_value(&response).unwrap_or_else(|e| {
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": response.id,
            "error": JsonRpcError::internal(e),
        })
    })
}

fn map_error(err: anyhow::Error) -> JsonRpcError {
    match err.downcast_ref::<DemoError>() {
        Some(DemoError::InvalidArguments(detail)) => JsonRpcError::invalid_params(detail),
        Some(DemoError::ResourceNotFound(uri)) => JsonRpcError::resource_not_found(uri),
        _ => JsonRpcError::internal(err),
    }
}
