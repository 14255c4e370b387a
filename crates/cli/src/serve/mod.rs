//! `casegen serve` -- web front end and JSON API for test-case generation.
//!
//! Endpoints:
//! - GET  /                     - Input form (function code or requirement text)
//! - GET  /health               - Server status
//! - POST /generate/function    - Form post, renders the results page
//! - POST /generate/requirement - Form post, renders the results page
//! - POST /api/generate         - JSON in, extraction result out
//! - POST /api/add_test_case    - Acknowledge a manually added test case
//!
//! Completion calls are blocking and run on tokio's blocking pool, so one
//! slow model reply never stalls the other requests.

mod handlers;
mod pages;
mod state;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use casegen_completion::ChatCompletionClient;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use self::handlers::{
    handle_add_test_case, handle_api_generate, handle_generate_function,
    handle_generate_requirement, handle_health, handle_index, handle_not_found,
};
use self::state::AppState;
use crate::config::Settings;

/// Maximum request body size: 10 MB.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Build the application router over `state`.
pub(crate) fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/generate/function", post(handle_generate_function))
        .route("/generate/requirement", post(handle_generate_requirement))
        .route("/api/generate", post(handle_api_generate))
        .route("/api/add_test_case", post(handle_add_test_case))
        .fallback(handle_not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on `host:port` and run until Ctrl+C.
pub async fn start_server(
    host: &str,
    port: u16,
    settings: Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    if settings.uses_placeholder_key() {
        tracing::warn!(
            "no API key configured; completion requests will likely be rejected \
             (set CUSTOM_API_KEY)"
        );
    }

    let client = ChatCompletionClient::new(settings.client_config());
    let state = Arc::new(AppState::new(
        Arc::new(client),
        settings.default_model.clone(),
    ));
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        address = %addr,
        endpoint = %settings.base_url,
        model = %settings.default_model,
        timeout_secs = settings.timeout.as_secs(),
        "casegen listening"
    );
    eprintln!("casegen listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received shutdown signal"),
        Err(e) => {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
