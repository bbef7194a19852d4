use axum::{extract::Extension, http::StatusCode, response::IntoResponse};

use crate::jobs;
use crate::utils::{Claims, success_to_api_response};

/// 触发后台邮件任务，立即返回
#[axum::debug_handler]
pub async fn trigger_task(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    let job_id = jobs::send_mock_email(format!("{}@example.com", claims.sub));

    (
        StatusCode::ACCEPTED,
        success_to_api_response(serde_json::json!({
            "message": "任务已启动",
            "job_id": job_id,
        })),
    )
}
