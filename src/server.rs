//! HTTP surface for the page assistant.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::assistant::{self, AskError, AskRequest, AssistantConfig, UnifiedResult};

#[derive(Clone)]
struct AppState {
    assistant: Arc<AssistantConfig>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    commit: &'static str,
}

enum ApiError {
    Ask(AskError),
    Worker,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Ask(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    error!(error = %err, %status, "ask request failed");
                }
                (status, err.to_string())
            }
            Self::Worker => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ask worker did not complete".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(config: AssistantConfig) -> Router {
    let state = AppState {
        assistant: Arc::new(config),
    };

    Router::new()
        .route("/api/health", get(health))
        .route("/api/ask", post(ask))
        .layer(
            // Browser extensions call the API from their own origin.
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE]),
        )
        .with_state(state)
}

/// Binds `addr` and serves until the process receives Ctrl-C.
pub async fn serve(addr: SocketAddr, config: AssistantConfig) -> std::io::Result<()> {
    if !config.api_key_present() {
        warn!("{} is not set; ask requests will fail", assistant::API_KEY_ENV);
    }

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, model = %config.model, "listening");

    axum::serve(listener, router(config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("PAGEASK_GIT_SHA"),
    })
}

async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<UnifiedResult>, ApiError> {
    let config = Arc::clone(&state.assistant);

    // The outbound call is blocking; a client disconnect does not cancel it.
    let result = tokio::task::spawn_blocking(move || assistant::ask(&request, &config))
        .await
        .map_err(|err| {
            error!(error = %err, "ask worker panicked");
            ApiError::Worker
        })?;

    result.map(Json).map_err(ApiError::Ask)
}
