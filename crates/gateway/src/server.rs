//! Router assembly and server startup.

use std::future::Future;
use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::routes::prompt_handler;
use crate::service::PromptService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub prompts: Arc<dyn PromptService>,
}

/// Build the router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/prompt", post(prompt_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves. Requests already in progress
/// are drained before this returns.
pub async fn start_server<F>(
    bind: &str,
    port: u16,
    state: AppState,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(state);
    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
