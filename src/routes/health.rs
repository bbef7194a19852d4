use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::AppState;
use crate::utils::{error_codes, error_to_api_response, success_to_api_response};

/// 健康检查接口
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({"status": "ok"})),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                error_to_api_response(error_codes::INTERNAL_ERROR, "数据库不可用".to_string()),
            )
        }
    }
}

/// 核心指标快照
#[axum::debug_handler]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, success_to_api_response(state.metrics.snapshot()))
}
