use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    utils::{
        Claims, error_codes, error_to_api_response, generate_token, hash_password, require_role,
        success_to_api_response, verify_password,
    },
};

use super::model::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserEntity, UserInfo};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    // 检查用户名格式
    if req.username.is_empty()
        || !req.username.chars().all(|c| c.is_alphanumeric() || c == '_')
    {
        return (
            StatusCode::OK,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "用户名格式无效，只允许使用字母、数字和下划线".to_string(),
            ),
        );
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(_) => {
            return (
                StatusCode::OK,
                error_to_api_response(error_codes::INTERNAL_ERROR, "密码处理失败".to_string()),
            );
        }
    };

    match UserEntity::create(&state.pool, &req.username, &password_hash).await {
        Ok(user) => (
            StatusCode::CREATED,
            success_to_api_response(RegisterResponse {
                id: user.id,
                username: user.username,
            }),
        ),
        Err(e) => {
            if e.to_string().contains("unique constraint")
                || e.to_string().contains("duplicate key")
            {
                (
                    StatusCode::OK,
                    error_to_api_response(error_codes::USER_EXISTS, "用户已存在".to_string()),
                )
            } else {
                tracing::error!("Failed to create user: {}", e);
                (
                    StatusCode::OK,
                    error_to_api_response(error_codes::INTERNAL_ERROR, "创建用户失败".to_string()),
                )
            }
        }
    }
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = match UserEntity::find_by_username(&state.pool, &req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::OK,
                error_to_api_response(error_codes::AUTH_FAILED, "用户名或密码错误".to_string()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to load user: {}", e);
            return (
                StatusCode::OK,
                error_to_api_response(error_codes::INTERNAL_ERROR, "数据库错误".to_string()),
            );
        }
    };

    match verify_password(&req.password, &user.password_hash) {
        Ok(true) => {}
        _ => {
            return (
                StatusCode::OK,
                error_to_api_response(error_codes::AUTH_FAILED, "用户名或密码错误".to_string()),
            );
        }
    }

    match generate_token(&user.username, user.id, &user.role, &state.config) {
        Ok((token, expires_at)) => (
            StatusCode::OK,
            success_to_api_response(LoginResponse {
                access_token: token,
                token_type: "bearer".to_string(),
                expires_at,
            }),
        ),
        Err(_) => (
            StatusCode::OK,
            error_to_api_response(error_codes::INTERNAL_ERROR, "生成令牌失败".to_string()),
        ),
    }
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match UserEntity::find_by_id(&state.pool, claims.uid).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            success_to_api_response(UserInfo {
                id: user.id,
                username: user.username,
                role: user.role,
            }),
        ),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            error_to_api_response(error_codes::AUTH_FAILED, "用户不存在".to_string()),
        ),
        Err(e) => {
            tracing::error!("Failed to load user: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "数据库错误".to_string()),
            )
        }
    }
}

/// 管理员专用：列出全部用户
#[axum::debug_handler]
pub async fn admin_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    if require_role(&claims, "admin").is_err() {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(error_codes::PERMISSION_DENIED, "权限不足".to_string()),
        );
    }

    match UserEntity::list_all(&state.pool).await {
        Ok(users) => (
            StatusCode::OK,
            success_to_api_response(
                users
                    .into_iter()
                    .map(|user| UserInfo {
                        id: user.id,
                        username: user.username,
                        role: user.role,
                    })
                    .collect::<Vec<_>>(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to list users: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "数据库错误".to_string()),
            )
        }
    }
}
