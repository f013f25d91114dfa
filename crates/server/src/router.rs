//! Router assembly and the listening loop.

use crate::handlers::{
    chat_handler, clear_documents_handler, create_session_handler, delete_session_handler,
    get_session_handler, health_handler, index_handler, set_mode_handler, stats_handler,
    upload_handler,
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use docchat_core::AppResult;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the application router.
///
/// `max_upload_bytes` caps request bodies, including multipart uploads.
pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/stats", get(stats_handler))
        .route(
            "/api/documents",
            post(upload_handler).delete(clear_documents_handler),
        )
        .route("/api/sessions", post(create_session_handler))
        .route(
            "/api/sessions/{id}",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route("/api/sessions/{id}/mode", put(set_mode_handler))
        .route("/api/sessions/{id}/chat", post(chat_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the application until the process is stopped.
pub async fn run(
    state: AppState,
    host: &str,
    port: u16,
    max_upload_bytes: usize,
) -> AppResult<()> {
    let app = create_app(state, max_upload_bytes);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!("docchat listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
