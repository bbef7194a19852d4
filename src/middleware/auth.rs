use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};

use crate::{AppState, error::AppError, utils};

/// 认证中间件：校验 Bearer Token 并把 Claims 放进请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(AppError::Unauthorized);
    };

    let claims = utils::verify_token(bearer.token(), &state.config)
        .map_err(|_| AppError::Unauthorized)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
