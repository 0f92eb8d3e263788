//! HTTP API over a shared tag store
//!
//! The store is blocking, so every handler hops onto the blocking pool
//! before touching it. The store's own mutex still serializes the calls.

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::storage::TagStore;

pub mod routes;

/// Server state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TagStore>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/stats", get(routes::get_stats))
        .route("/tags", get(routes::get_distinct_tags).delete(routes::delete_all_tags))
        .route("/tags/records", get(routes::get_all_records))
        .route("/tags/{tag_id}", get(routes::get_tag).delete(routes::delete_tag))
        .route(
            "/alerts/{alert_id}/tags",
            get(routes::get_alert_tags).delete(routes::delete_alert_tags),
        )
        .route(
            "/alerts/{alert_id}/tags/{key}",
            get(routes::get_alert_tag)
                .put(routes::put_alert_tag)
                .delete(routes::delete_alert_tag),
        )
        .route("/admin/reconnect", post(routes::reconnect))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, store: Arc<TagStore>) -> anyhow::Result<()> {
    let app = create_router(AppState { store });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
