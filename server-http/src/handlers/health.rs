use crate::api::{ApiResponse, HealthResponse};
use crate::middleware::HttpError;
use crate::state::AppState;
use arbor::errors::AppError;
use axum::{extract::State, Json};

const HEALTH_PROBE_KEY: &str = "health:probe";

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let probe = state.cache.exists(HEALTH_PROBE_KEY).await;
    let cache = if probe.is_fallback() { "unavailable" } else { "ok" };

    Json(ApiResponse::new(
        "Server is running",
        HealthResponse { status: "OK", cache },
    ))
}

/// Router fallback
pub async fn not_found() -> HttpError {
    AppError::not_found("API NOT FOUND!").into()
}
