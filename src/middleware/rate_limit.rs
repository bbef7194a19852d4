use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, State},
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::cache::RedisStore;
use crate::cache::keys::rate_limit_keys;
use crate::cache::store::KeyValueStore;
use crate::metrics::CoreMetrics;
use crate::utils::{error_codes, error_to_api_response};

/// 准入判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// 存储故障时放行，与正常放行区分统计
    AllowedFailOpen,
    Rejected { retry_after_secs: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Admission::Rejected { .. })
    }
}

/// 固定窗口准入控制器
///
/// 窗口边界处同一客户端最多可放行约 2 倍限额，这是固定窗口方案的
/// 已知近似。组件无状态，计数全部在共享存储里
#[derive(Clone)]
pub struct RateLimiter<S: KeyValueStore> {
    store: S,
    limit: u32,
    window_secs: u64,
    metrics: Arc<CoreMetrics>,
}

impl<S: KeyValueStore> RateLimiter<S> {
    pub fn new(store: S, limit: u32, window_secs: u64, metrics: Arc<CoreMetrics>) -> Self {
        Self {
            store,
            limit,
            window_secs,
            metrics,
        }
    }

    /// 单次原子自增后判定：计数超限拒绝，存储故障放行（fail open）
    pub async fn admit(&self, client_id: &str, route_id: &str) -> Admission {
        let key = rate_limit_keys::rate_limit_key(client_id, route_id);

        match self.store.incr_with_expiry(&key, self.window_secs).await {
            Ok(count) if count > i64::from(self.limit) => {
                self.metrics.record_rejected();
                tracing::info!(client_id, route_id, count, "rejected");
                Admission::Rejected {
                    retry_after_secs: self.window_secs,
                }
            }
            Ok(_) => {
                self.metrics.record_admitted();
                Admission::Allowed
            }
            Err(e) => {
                // 服务可用性优先于严格限流
                self.metrics.record_admission_fail_open();
                tracing::warn!(client_id, route_id, error = %e, "限流存储不可用，放行处理");
                Admission::AllowedFailOpen
            }
        }
    }
}

/// 从请求头或连接信息推导客户端标识，取不到时退化为 "unknown"
fn client_id_from(req: &Request<Body>) -> String {
    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string());

    req.headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or_else(|| remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter<RedisStore>>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let client_id = client_id_from(&req);
    // 用路由模板而不是原始路径，同一路由下不同资源共享预算
    let route_id = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    match limiter.admit(&client_id, &route_id).await {
        Admission::Rejected { retry_after_secs } => Ok((
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after_secs.to_string())],
            error_to_api_response::<()>(
                error_codes::RATE_LIMIT,
                format!("请求过于频繁，请在{}秒后重试", retry_after_secs),
            ),
        )
            .into_response()),
        _ => Ok(next.run(req).await),
    }
}
