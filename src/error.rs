use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::common::ApiResponse;
use crate::utils::error_codes;

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    PermissionDenied,
    NotFound,
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, msg) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                error_codes::AUTH_FAILED,
                "未授权访问".to_string(),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                error_codes::PERMISSION_DENIED,
                "权限不足".to_string(),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                error_codes::NOT_FOUND,
                "资源不存在".to_string(),
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "内部服务器错误".to_string(),
            ),
        };

        let body = Json(ApiResponse::<()> {
            code,
            msg,
            resp_data: None,
        });

        (status, body).into_response()
    }
}
