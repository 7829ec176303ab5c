//! HTTP server: one chat route plus the embedded UI.
pub mod routes;
pub mod service;
pub mod state;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{Router, response::Html, routing::get};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use state::AppState;

/// The single-page chat client, compiled into the binary.
const INDEX_HTML: &str = include_str!("../../static/index.html");

/// The chat HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(index))
            .route("/health", get(health))
            .nest("/api", routes::api_routes())
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> Result<()> {
        let server_cfg = &self.state.config().server;
        let addr: SocketAddr = format!("{}:{}", server_cfg.host, server_cfg.port)
            .parse()
            .context("invalid server address")?;

        let router = self.router();

        info!("Serving chat UI on http://{addr}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        axum::serve(listener, router)
            .await
            .context("server error")?;

        Ok(())
    }
}

/// GET / — the embedded chat page.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_index_html_embedded() {
        assert!(super::INDEX_HTML.contains("<html"));
        assert!(super::INDEX_HTML.contains("/api/chat"));
    }
}
