//! MCP server implementation for archgrade.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, ServerHandler},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool_handler,
};

use crate::context::{Context, FromRef};

/// archgrade MCP server.
///
/// Exposes the submission evaluator and the service catalog to AI assistants
/// and other MCP clients.
#[derive(Clone)]
pub struct McpServer {
    pub(crate) ctx: Arc<Context>,
    tool_router: ToolRouter<McpServer>,
}

impl McpServer {
    /// Create a new MCP server with the given context.
    pub fn new(ctx: Context) -> Self {
        tracing::info!("Initializing archgrade MCP server");

        Self {
            ctx: Arc::new(ctx),
            tool_router: Self::tool_router(),
        }
    }

    /// Build the combined tool router from all tool modules.
    fn tool_router() -> ToolRouter<Self> {
        Self::evaluation_tools() + Self::catalog_tools()
    }

    /// Resolve a dependency from the context.
    pub fn resolve<T: FromRef<Context>>(&self) -> T {
        T::from_ref(&self.ctx)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"archgrade - Cloud Architecture Submission Evaluator

Scores cloud-architecture diagrams against challenges.

## Node ids

Nodes are identified as `<provider>-<serviceId>-<suffix>`, e.g. `aws-ec2-t2-micro-1`.
The middle segments are the catalog service id; use list_services to find them.
Mark pre-existing infrastructure with `isExisting: true`; it is free and does not
count toward complexity.

## Pipeline

1. Phase 1 (gate): cost <= maxCost, required categories present, graph connected,
   service count within bounds. Failure returns status Too Expensive,
   Wrong Architecture or Incomplete with score 0.
2. Phase 2 (rules): nine architecture heuristics, -25 points per warning.
3. Phase 3 (optional): LLM review, only when `qualitative` is true and an
   oracle is configured.

## Tools

- **evaluate_submission** - Full evaluation with score and feedback
- **estimate_cost** - Monthly cost per node
- **check_connectivity** - Structural connectivity check
- **list_services** - Browse the priced service catalog
"#
                .to_string(),
            ),
        }
    }
}
