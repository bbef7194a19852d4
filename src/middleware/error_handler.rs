use std::time::Instant;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, header::CONTENT_LENGTH},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

/// 读入日志的错误响应体上限，更大的响应体原样转发只记录状态
const ERROR_BODY_LOG_LIMIT: usize = 64 * 1024;

/// 请求日志与5xx响应体记录
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;
    let elapsed = start.elapsed();

    if response.status().is_server_error() {
        log_server_error(&method, &path, response).await
    } else {
        info!(
            method = %method,
            path = %path,
            status = %response.status(),
            elapsed_ms = elapsed.as_millis() as u64,
            "request"
        );
        response
    }
}

async fn log_server_error(method: &Method, path: &str, response: Response) -> Response {
    let oversized = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len > ERROR_BODY_LOG_LIMIT);

    if oversized {
        error!(
            "Server error occurred - Method: {}, Path: {}, Status: {} (body too large to log)",
            method,
            path,
            response.status()
        );
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, ERROR_BODY_LOG_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read error response body: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };
    let body_str = String::from_utf8_lossy(&bytes);

    error!(
        "Server error occurred - Method: {}, Path: {}, Status: {}, Body: {}",
        method, path, parts.status, body_str
    );

    // 重置body以便重新构建响应
    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
