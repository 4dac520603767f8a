//! MCP Server implementation - the protocol server core.
//!
//! Every tool invocation, whatever transport it came from, ends up in
//! [`McpServer::invoke`]: the call is looked up, validated, dispatched to its
//! handler with the per-call [`CallContext`], and the outcome is encoded as
//! either a tool result or a protocol error. Nothing from one invocation is
//! kept for the next.
//!
//! The STDIO transport reaches `invoke` through the rmcp `ServerHandler`
//! implementation below, using the process-wide credential. The HTTP
//! transport calls it directly with a context built from each request.

use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::config::Config;
use super::context::CallContext;
use super::error::Error;
use crate::domains::amap::AmapClient;
use crate::domains::tools::{ToolRegistry, build_tool_registry};

/// Usage instructions advertised to clients.
pub const INSTRUCTIONS: &str = "Weather lookup server. Call `query_weather` with an address \
     to receive the live weather report for that location as JSON text.";

/// The main MCP server handler.
///
/// Cloning is cheap: the configuration and the tool registry are shared and
/// immutable.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registered tools.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> super::Result<Self> {
        if config.upstream.base_url.trim().is_empty() {
            return Err(Error::config("upstream base URL must not be empty"));
        }

        let client = AmapClient::new(&config.upstream)?;
        let registry = build_tool_registry(client)?;

        Ok(Self::with_registry(config, registry))
    }

    /// Create a server around an already-built registry.
    pub fn with_registry(config: Config, registry: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// List all available tools.
    pub fn tools(&self) -> Vec<Tool> {
        self.registry.tools()
    }

    /// Context for transports whose credential is fixed for the process.
    pub fn process_context(&self) -> CallContext {
        CallContext::new(self.config.credentials.api_key.clone())
    }

    /// Run one tool invocation and encode its outcome.
    ///
    /// Unknown tools and invalid arguments become `invalid_params` errors
    /// before any handler runs; handler faults become `internal_error`.
    #[instrument(skip(self, arguments, context), fields(session = ?context.session_id()))]
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        context: CallContext,
    ) -> Result<CallToolResult, McpError> {
        debug!("Tool call received");

        match self.registry.dispatch(name, arguments, context).await {
            Ok(result) => {
                info!(is_error = ?result.is_error, "Tool call responded");
                Ok(result)
            }
            Err(e) if e.is_protocol_error() => {
                warn!("Tool call rejected: {}", e);
                Err(e.into())
            }
            Err(e) => {
                error!("Tool call faulted: {}", e);
                Err(e.into())
            }
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip_all)]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip_all, fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.invoke(&request.name, request.arguments, self.process_context())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::first_text;
    use crate::domains::tools::definitions::weather::query_weather::MISSING_KEY_MESSAGE;
    use serde_json::json;

    fn server() -> McpServer {
        McpServer::new(Config::default()).unwrap()
    }

    fn args(value: serde_json::Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn test_new_rejects_empty_base_url() {
        let mut config = Config::default();
        config.upstream.base_url = String::new();
        assert!(matches!(McpServer::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_lists_weather_tool() {
        let names: Vec<_> = server().tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["query_weather"]);
    }

    #[test]
    fn test_get_info_enables_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.instructions.as_deref(), Some(INSTRUCTIONS));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let err = server()
            .invoke("get_forecast", args(json!({ "address": "x" })), CallContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("get_forecast"));
    }

    #[tokio::test]
    async fn test_empty_address_is_validation_error() {
        let err = server()
            .invoke(
                "query_weather",
                args(json!({ "address": "" })),
                CallContext::new(Some("k1".to_string())),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("address"));
        assert_eq!(err.data.unwrap()["field"], "address");
    }

    #[tokio::test]
    async fn test_process_context_without_key() {
        let server = server();
        assert!(server.process_context().credential().is_none());

        let result = server
            .invoke(
                "query_weather",
                args(json!({ "address": "Beijing" })),
                server.process_context(),
            )
            .await
            .unwrap();
        assert_eq!(first_text(&result), Some(MISSING_KEY_MESSAGE));
    }

    #[test]
    fn test_process_context_uses_configured_key() {
        let mut config = Config::default();
        config.credentials.api_key = Some("process-key".to_string());
        let server = McpServer::new(config).unwrap();
        assert_eq!(server.process_context().credential(), Some("process-key"));
    }
}
