use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::broadcast;

use cache::{ReadCache, RedisStore};
use config::Config;
use metrics::CoreMetrics;

pub mod cache;
pub mod common;
pub mod config;
pub mod database;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub cache: ReadCache<RedisStore>,
    pub metrics: Arc<CoreMetrics>,
    pub broadcaster: broadcast::Sender<String>,
}
