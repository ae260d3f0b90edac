//! HTTP request handlers

use super::types::{ChatRequest, ChatResponse, ClearResponse, ErrorResponse, OperationsResponse};
use super::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Reply body when a turn fails for any reason
const PROCESSING_ERROR: &str = "An error occurred while processing your request";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // User turns
        .route("/api/chat", post(chat))
        // Thread lifecycle
        .route("/api/threads/:id/clear", post(clear_thread))
        // Operation catalogue
        .route("/api/operations", get(list_operations))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// User Turns
// ============================================================

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.user_input.trim().is_empty() {
        return Err(AppError::BadRequest("user_input is required".to_string()));
    }

    let response = state
        .assistant
        .submit_turn(req.thread_id.as_deref(), &req.user_input)
        .await
        .map_err(|e| {
            tracing::error!(thread_id = ?req.thread_id, error = %e, "Chat turn failed");
            AppError::Internal(PROCESSING_ERROR.to_string())
        })?;

    Ok(Json(ChatResponse { response }))
}

// ============================================================
// Thread Lifecycle
// ============================================================

async fn clear_thread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ClearResponse> {
    let existed = state.assistant.clear_thread(&id).await;
    Json(ClearResponse {
        success: true,
        existed,
    })
}

// ============================================================
// Operations
// ============================================================

async fn list_operations(State(state): State<AppState>) -> Json<OperationsResponse> {
    Json(OperationsResponse {
        operations: state.assistant.operations(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("clinic-concierge ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
