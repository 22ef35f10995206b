//! MCP server handler implementation.
//!
//! Routes tool calls to the registration that hosts the offline worker.
use std::sync::Arc;

use crate::tools::{
    WorkerFetchParams,
    cache::{CacheGetParams, get_impl, list_impl},
    worker_fetch::fetch_impl,
    worker_status::status_impl,
};
use offline_core::Registration;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The offline-sw MCP server handler.
#[derive(Clone)]
pub struct OfflineServer {
    registration: Arc<Registration>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OfflineServer {
    pub fn new(registration: Arc<Registration>) -> Self {
        Self { registration, tool_router: Self::tool_router() }
    }

    /// Route a page request through the active worker.
    ///
    /// Non-GET requests, extension schemes and streaming upgrades are reported as pass-through.
    /// Everything else is answered network-first with a cached or 503 fallback.
    #[tool(
        description = "Send a request through the offline worker. Returns the response and whether it came from the network, the cache, or the offline fallback."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.registration, params.0).await
    }

    #[tool(description = "Report the active and waiting worker versions and their lifecycle states.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.registration).await
    }

    #[tool(description = "List every cache store and the entries it holds.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.registration).await
    }

    /// Read one entry from the active store without touching the network.
    #[tool(description = "Look up a GET request URL in the active worker's cache.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.registration, params.0).await
    }
}

impl ServerHandler for OfflineServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offline-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
