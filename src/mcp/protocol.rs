//! Typed MCP lifecycle wrapper over [`JsonRpcClient`]
//!
//! [`McpProtocol`] can only `initialize`; a successful handshake yields an
//! [`InitializedMcpProtocol`] exposing the typed prompt, resource and tool
//! methods. Using the type system this way keeps un-negotiated sessions
//! from issuing capability requests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DemoError, Result};
use crate::mcp::client::JsonRpcClient;
use crate::mcp::types::{
    CallToolParams, CallToolResponse, ClientCapabilities, GetPromptParams, GetPromptResponse,
    Implementation, InitializeParams, InitializeResponse, ListPromptsResponse,
    ListResourceTemplatesResponse, ListResourcesResponse, ListToolsResponse, McpTool, Prompt,
    ReadResourceParams, ReadResourceResponse, Resource, ResourceTemplate, LATEST_PROTOCOL_VERSION,
    METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_PING, METHOD_PROMPTS_GET, METHOD_PROMPTS_LIST,
    METHOD_RESOURCES_LIST, METHOD_RESOURCES_READ, METHOD_RESOURCES_TEMPLATES_LIST,
    METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, SUPPORTED_PROTOCOL_VERSIONS,
};

/// Server capability categories a session can check for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerCapabilityFlag {
    /// `tools/*`
    Tools,
    /// `resources/*`
    Resources,
    /// `prompts/*`
    Prompts,
}

/// A client that has not completed the handshake yet
#[derive(Debug)]
pub struct McpProtocol {
    client: Arc<JsonRpcClient>,
}

impl McpProtocol {
    /// Wrap a wired client
    pub fn new(client: Arc<JsonRpcClient>) -> Self {
        Self { client }
    }

    /// Perform the `initialize` handshake
    ///
    /// Requests [`LATEST_PROTOCOL_VERSION`], checks the server answered with
    /// a revision this client speaks, then sends `notifications/initialized`.
    ///
    /// # Errors
    ///
    /// Returns the request error, or [`DemoError::McpProtocolVersion`] if the
    /// server picked an unsupported revision
    pub async fn initialize(self, client_info: Implementation) -> Result<InitializedMcpProtocol> {
        let response: InitializeResponse = self
            .client
            .request(
                METHOD_INITIALIZE,
                InitializeParams {
                    protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
                    capabilities: ClientCapabilities::default(),
                    client_info,
                },
                None,
            )
            .await?;

        if !SUPPORTED_PROTOCOL_VERSIONS.contains(&response.protocol_version.as_str()) {
            return Err(DemoError::McpProtocolVersion {
                expected: SUPPORTED_PROTOCOL_VERSIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                got: response.protocol_version,
            }
            .into());
        }

        self.client
            .notify(METHOD_INITIALIZED, serde_json::json!({}))?;

        tracing::debug!(
            server = %response.server_info.name,
            protocol = %response.protocol_version,
            "MCP session initialized"
        );

        Ok(InitializedMcpProtocol {
            client: self.client,
            initialize_response: response,
        })
    }
}

/// A negotiated session
#[derive(Debug)]
pub struct InitializedMcpProtocol {
    client: Arc<JsonRpcClient>,
    /// What the server said during the handshake
    pub initialize_response: InitializeResponse,
}

impl InitializedMcpProtocol {
    /// Server name and version
    pub fn server_info(&self) -> &Implementation {
        &self.initialize_response.server_info
    }

    /// Negotiated protocol revision
    pub fn protocol_version(&self) -> &str {
        &self.initialize_response.protocol_version
    }

    /// Whether the server advertised `capability`
    pub fn capable(&self, capability: ServerCapabilityFlag) -> bool {
        let caps = &self.initialize_response.capabilities;
        match capability {
            ServerCapabilityFlag::Tools => caps.tools.is_some(),
            ServerCapabilityFlag::Resources => caps.resources.is_some(),
            ServerCapabilityFlag::Prompts => caps.prompts.is_some(),
        }
    }

    /// `tools/list`
    pub async fn list_tools(&self) -> Result<Vec<McpTool>> {
        let resp: ListToolsResponse = self
            .client
            .request(METHOD_TOOLS_LIST, serde_json::json!({}), None)
            .await?;
        Ok(resp.tools)
    }

    /// `tools/call`
    ///
    /// A tool that rejects its input still returns `Ok`; check
    /// [`CallToolResponse::is_error`].
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResponse> {
        self.client
            .request(
                METHOD_TOOLS_CALL,
                CallToolParams {
                    name: name.to_string(),
                    arguments,
                },
                None,
            )
            .await
    }

    /// `resources/list`
    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        let resp: ListResourcesResponse = self
            .client
            .request(METHOD_RESOURCES_LIST, serde_json::json!({}), None)
            .await?;
        Ok(resp.resources)
    }

    /// `resources/templates/list`
    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>> {
        let resp: ListResourceTemplatesResponse = self
            .client
            .request(METHOD_RESOURCES_TEMPLATES_LIST, serde_json::json!({}), None)
            .await?;
        Ok(resp.resource_templates)
    }

    /// `resources/read`
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResponse> {
        self.client
            .request(
                METHOD_RESOURCES_READ,
                ReadResourceParams {
                    uri: uri.to_string(),
                },
                None,
            )
            .await
    }

    /// `prompts/list`
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>> {
        let resp: ListPromptsResponse = self
            .client
            .request(METHOD_PROMPTS_LIST, serde_json::json!({}), None)
            .await?;
        Ok(resp.prompts)
    }

    /// `prompts/get`
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Option<HashMap<String, String>>,
    ) -> Result<GetPromptResponse> {
        self.client
            .request(
                METHOD_PROMPTS_GET,
                GetPromptParams {
                    name: name.to_string(),
                    arguments,
                },
                None,
            )
            .await
    }

    /// `ping`
    pub async fn ping(&self) -> Result<()> {
        let _: serde_json::Value = self
            .client
            .request(METHOD_PING, serde_json::json!({}), None)
            .await?;
        Ok(())
    }
}
