use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ingest::Ingestor;
use crate::storage::SqliteStore;

pub mod mcp;
pub mod routes;

/// Server state shared by the HTTP and MCP surfaces
pub struct AppState {
    pub ingestor: Arc<Ingestor>,
    /// Document location used when a sync request names none
    pub default_url: String,
}

impl AppState {
    pub fn new(ingestor: Arc<Ingestor>, default_url: impl Into<String>) -> Self {
        Self {
            ingestor,
            default_url: default_url.into(),
        }
    }

    pub fn store(&self) -> &SqliteStore {
        self.ingestor.store()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/versions", get(routes::list_versions))
        .route("/versions/{version}", delete(routes::delete_version))
        .route("/endpoints", get(routes::list_endpoints))
        .route("/endpoints/{id}", get(routes::get_endpoint))
        .route("/schemas/{version}/{name}", get(routes::get_schema))
        .route("/stats", get(routes::get_stats))
        .route("/sync", post(routes::sync))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    tracing::info!("Starting server on {}", addr);
    println!("🌍 Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
