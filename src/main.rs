use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use notes_backend::{
    AppState,
    cache::{ReadCache, RedisStore},
    config::Config,
    database,
    metrics::CoreMetrics,
    middleware::{RateLimiter, auth_middleware, log_errors, rate_limit},
    routes,
};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置，非法的限流/缓存配置在这里直接拒绝启动
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = database::init_pool(&config)
        .await
        .expect("Failed to connect to Postgres");

    // 设置共享存储句柄，启动时创建一次，注入给限流器和缓存
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let store = RedisStore::new(redis_client, config.store_timeout());

    let metrics = Arc::new(CoreMetrics::default());
    let cache = ReadCache::new(store.clone(), config.cache_ttl_secs, metrics.clone());
    let rate_limiter = Arc::new(RateLimiter::new(
        store,
        config.rate_limit_requests,
        config.rate_limit_window_secs,
        metrics.clone(),
    ));

    // WebSocket 广播通道
    let (broadcaster, _) = broadcast::channel(64);

    // 设置应用状态
    let state = AppState {
        pool,
        config,
        cache,
        metrics,
        broadcaster,
    };

    // 将路由分为公开路由和受保护路由
    let public_routes = Router::new()
        .route("/register", post(routes::user::register))
        .route("/login", post(routes::user::login))
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::health::metrics))
        .route("/ws", get(routes::ws::websocket));

    let protected_routes = Router::new()
        .route("/users/me", get(routes::user::me))
        .route(
            "/notes",
            post(routes::notes::create_note).get(routes::notes::get_notes),
        )
        .route(
            "/notes/{note_id}",
            get(routes::notes::get_note)
                .put(routes::notes::update_note)
                .delete(routes::notes::delete_note),
        )
        .route("/trigger-task", post(routes::tasks::trigger_task))
        .route("/admin/users", get(routes::user::admin_users))
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new().merge(public_routes).merge(protected_routes);

    // 添加日志中间件和限流中间件
    let router = router.layer(axum::middleware::from_fn(log_errors)).layer(
        axum::middleware::from_fn_with_state(rate_limiter, rate_limit),
    );

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        use tower_http::cors::CorsLayer;
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
