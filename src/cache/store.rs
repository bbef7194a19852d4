use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use redis::{AsyncCommands, Script};
use thiserror::Error;

/// 存储错误分类
#[derive(Debug, Error)]
pub enum StoreError {
    /// 网络不可达或操作超时
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// 存储返回了无法解析的应答
    #[error("store protocol error: {0}")]
    Protocol(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error()
            || e.is_timeout()
            || e.is_connection_refusal()
            || e.is_connection_dropped()
        {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::Protocol(e.to_string())
        }
    }
}

/// 共享键值存储契约：限流计数与结果缓存共用同一个存储
///
/// 计数与过期必须在存储侧原子完成，调用方不做读改写
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// 原子自增，首次创建时设置过期时间，返回自增后的计数
    fn incr_with_expiry(
        &self,
        key: &str,
        ttl_secs: u64,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// 按通配模式批量删除，返回删除数量；无匹配视为成功
    fn del_by_pattern(
        &self,
        pattern: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

// INCR 与首次 EXPIRE 在脚本内一步完成，避免两条命令之间的竞态
const INCR_WITH_EXPIRY_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// 注入式 Redis 存储句柄，服务启动时创建一次并在各组件间共享
#[derive(Clone)]
pub struct RedisStore {
    client: Arc<redis::Client>,
    timeout: Duration,
}

impl RedisStore {
    pub fn new(client: redis::Client, timeout: Duration) -> Self {
        Self {
            client: Arc::new(client),
            timeout,
        }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        match tokio::time::timeout(self.timeout, self.client.get_multiplexed_async_connection())
            .await
        {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Unavailable("connect timed out".into())),
        }
    }

    /// 所有存储调用都带超时上限，存储变慢不能拖垮准入路径
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Unavailable("operation timed out".into())),
        }
    }
}

impl KeyValueStore for RedisStore {
    async fn incr_with_expiry(&self, key: &str, ttl_secs: u64) -> Result<i64, StoreError> {
        let mut conn = self.connection().await?;
        let script = Script::new(INCR_WITH_EXPIRY_SCRIPT);
        let count: i64 = self
            .bounded(script.key(key).arg(ttl_secs).invoke_async(&mut conn))
            .await?;
        Ok(count)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.get(key)).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.set_ex(key, value, ttl_secs)).await
    }

    async fn del_by_pattern(&self, pattern: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        let pattern = pattern.to_string();
        let op = async move {
            let mut keys: Vec<String> = Vec::new();
            {
                let mut iter = conn.scan_match::<_, String>(&pattern).await?;
                while let Some(key) = iter.next_item().await {
                    keys.push(key);
                }
            }
            if keys.is_empty() {
                return Ok(0u64);
            }
            let deleted: u64 = conn.del(keys).await?;
            Ok(deleted)
        };
        self.bounded(op).await
    }
}

/// 测试用内存存储：手动时钟推进TTL，可开关模拟存储不可用
#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    use super::{KeyValueStore, StoreError};

    struct Entry {
        value: String,
        expires_at: Option<u64>,
    }

    #[derive(Default)]
    struct Inner {
        entries: Mutex<HashMap<String, Entry>>,
        clock: AtomicU64,
        unavailable: AtomicBool,
    }

    #[derive(Clone, Default)]
    pub(crate) struct MemoryStore {
        inner: Arc<Inner>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn advance(&self, secs: u64) {
            self.inner.clock.fetch_add(secs, Ordering::SeqCst);
        }

        pub fn set_unavailable(&self, unavailable: bool) {
            self.inner.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub fn live_entries(&self) -> usize {
            let now = self.now();
            let entries = self.inner.entries.lock().unwrap();
            entries
                .values()
                .filter(|e| e.expires_at.is_none_or(|at| at > now))
                .count()
        }

        fn now(&self) -> u64 {
            self.inner.clock.load(Ordering::SeqCst)
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.inner.unavailable.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("simulated outage".into()))
            } else {
                Ok(())
            }
        }
    }

    fn expired(entry: &Entry, now: u64) -> bool {
        entry.expires_at.is_some_and(|at| at <= now)
    }

    impl KeyValueStore for MemoryStore {
        async fn incr_with_expiry(&self, key: &str, ttl_secs: u64) -> Result<i64, StoreError> {
            self.check()?;
            let now = self.now();
            let mut entries = self.inner.entries.lock().unwrap();
            let incremented = match entries.get_mut(key) {
                Some(entry) if !expired(entry, now) => {
                    let count = entry
                        .value
                        .parse::<i64>()
                        .map_err(|e| StoreError::Protocol(e.to_string()))?
                        + 1;
                    entry.value = count.to_string();
                    Some(count)
                }
                _ => None,
            };
            if let Some(count) = incremented {
                return Ok(count);
            }
            // 过期时间只在计数器首次创建时设置
            entries.insert(
                key.to_string(),
                Entry {
                    value: "1".to_string(),
                    expires_at: Some(now + ttl_secs),
                },
            );
            Ok(1)
        }

        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.check()?;
            let now = self.now();
            let entries = self.inner.entries.lock().unwrap();
            Ok(entries
                .get(key)
                .filter(|entry| !expired(entry, now))
                .map(|entry| entry.value.clone()))
        }

        async fn set_with_ttl(
            &self,
            key: &str,
            value: &str,
            ttl_secs: u64,
        ) -> Result<(), StoreError> {
            self.check()?;
            let now = self.now();
            let mut entries = self.inner.entries.lock().unwrap();
            entries.insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: Some(now + ttl_secs),
                },
            );
            Ok(())
        }

        async fn del_by_pattern(&self, pattern: &str) -> Result<u64, StoreError> {
            self.check()?;
            let prefix = pattern.trim_end_matches('*');
            let now = self.now();
            let mut entries = self.inner.entries.lock().unwrap();
            let matched: Vec<String> = entries
                .iter()
                .filter(|(key, entry)| key.starts_with(prefix) && !expired(entry, now))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &matched {
                entries.remove(key);
            }
            Ok(matched.len() as u64)
        }
    }
}
