// 数据库模块
// 连接池初始化，实体与查询在各路由的 model 中定义

use sqlx::Executor;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;

/// 初始化 Postgres 连接池
pub async fn init_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'notes_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
}
