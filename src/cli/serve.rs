//! HTTP server command handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use color_eyre::Result;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use tower::ServiceBuilder;

use crate::config::Config;
use crate::context::Context;
use crate::mcp::McpServer;

use super::App;

/// Authentication middleware state.
#[derive(Clone)]
struct AuthState {
    api_key: Option<Arc<str>>,
}

impl AuthState {
    /// Whether an `Authorization` header value grants access.
    fn authorize(&self, header: Option<&str>) -> bool {
        let Some(expected) = &self.api_key else {
            return true;
        };

        header
            .and_then(|h| h.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected.as_ref())
    }
}

/// Authentication middleware that checks for the configured Bearer key.
async fn auth_middleware(State(state): State<AuthState>, req: Request, next: Next) -> Response {
    if req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    if state.authorize(auth_header) {
        next.run(req).await
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

impl App {
    /// Run the MCP server with HTTP transport.
    pub async fn run_serve(&self, host: &str, port: u16) -> Result<()> {
        tracing::info!("Starting archgrade HTTP server");

        let config = Config::load()?;

        if config.server.api_key.is_some() {
            tracing::info!("API key authentication enabled");
        } else {
            tracing::warn!("No API key configured - server is unprotected!");
        }

        let auth_state = AuthState {
            api_key: config.server.api_key.as_deref().map(Arc::from),
        };

        let ctx = Context::from_config(config)?;

        let service = StreamableHttpService::new(
            move || Ok(McpServer::new(ctx.clone())),
            Arc::new(LocalSessionManager::default()),
            StreamableHttpServerConfig::default(),
        );

        let app = Router::new()
            .route("/health", get(health))
            .fallback_service(ServiceBuilder::new().service(service))
            .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| color_eyre::eyre::eyre!("Invalid address {}:{}: {}", host, port, e))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to bind to {}: {}", addr, e))?;

        tracing::info!("archgrade HTTP server listening on http://{}", addr);

        axum::serve(listener, app).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            color_eyre::eyre::eyre!("HTTP server error: {}", e)
        })?;

        tracing::info!("HTTP server shutting down");
        Ok(())
    }
}
