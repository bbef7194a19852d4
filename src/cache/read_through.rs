use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::keys::notes_keys;
use crate::cache::store::KeyValueStore;
use crate::metrics::CoreMetrics;

/// 读穿透缓存：按（属主，查询形状）缓存读结果，写操作按属主批量失效
///
/// 组件自身无状态，所有状态都在共享存储里，可多实例并发运行
#[derive(Clone)]
pub struct ReadCache<S: KeyValueStore> {
    store: S,
    ttl_secs: u64,
    metrics: Arc<CoreMetrics>,
}

impl<S: KeyValueStore> ReadCache<S> {
    pub fn new(store: S, ttl_secs: u64, metrics: Arc<CoreMetrics>) -> Self {
        Self {
            store,
            ttl_secs,
            metrics,
        }
    }

    /// 命中则直接返回缓存值；未命中（缺失、过期、载荷损坏或存储故障）
    /// 调用 compute 取数，回填缓存后返回。compute 每次调用至多执行一次，
    /// 存储故障不会让读请求失败，只会退化为直接计算
    pub async fn read_through<T, F, Fut, E>(
        &self,
        owner_id: i64,
        shape: &str,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = notes_keys::notes_key(owner_id, shape);

        match self.store.get(&key).await {
            Ok(Some(payload)) => match serde_json::from_str::<T>(&payload) {
                Ok(value) => {
                    self.metrics.record_cache_hit();
                    tracing::debug!(%key, "cache hit");
                    return Ok(value);
                }
                // 损坏的缓存载荷按未命中处理，不向调用方传播
                Err(e) => {
                    tracing::warn!(%key, error = %e, "缓存载荷损坏，按未命中处理");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(%key, error = %e, "读取缓存失败，回退直接计算");
            }
        }

        self.metrics.record_cache_miss();
        let value = compute().await?;

        match serde_json::to_string(&value) {
            Ok(json) => {
                if let Err(e) = self.store.set_with_ttl(&key, &json, self.ttl_secs).await {
                    tracing::warn!(%key, error = %e, "回填缓存失败");
                }
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "缓存序列化失败");
            }
        }

        Ok(value)
    }

    /// 删除属主的全部缓存条目。写路径在数据库提交之后、响应返回之前调用。
    /// 删除在独立任务中执行，请求被取消也会完成，避免留下过期条目。
    /// 失败只计数和记录，写操作本身仍然成功
    pub async fn invalidate(&self, owner_id: i64) {
        let pattern = notes_keys::notes_pattern(owner_id);
        let store = self.store.clone();
        let handle = tokio::spawn(async move { store.del_by_pattern(&pattern).await });

        match handle.await {
            Ok(Ok(deleted)) => {
                tracing::debug!(owner_id, deleted, "cache invalidated");
            }
            Ok(Err(e)) => {
                self.metrics.record_invalidation_failed();
                tracing::warn!(owner_id, error = %e, "缓存失效失败，数据可能短暂陈旧");
            }
            Err(e) => {
                self.metrics.record_invalidation_failed();
                tracing::warn!(owner_id, error = %e, "缓存失效任务异常退出");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::store::memory::MemoryStore;

    fn cache_over(store: &MemoryStore) -> (ReadCache<MemoryStore>, Arc<CoreMetrics>) {
        let metrics = Arc::new(CoreMetrics::default());
        (
            ReadCache::new(store.clone(), 300, metrics.clone()),
            metrics,
        )
    }

    async fn list_through(
        cache: &ReadCache<MemoryStore>,
        owner_id: i64,
        computed: &AtomicUsize,
        value: Vec<String>,
    ) -> Vec<String> {
        cache
            .read_through(owner_id, "list", || async {
                computed.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(value)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn second_read_is_a_hit() {
        let store = MemoryStore::new();
        let (cache, metrics) = cache_over(&store);
        let computed = AtomicUsize::new(0);

        let first = list_through(&cache, 42, &computed, vec!["a".into()]).await;
        let second = list_through(&cache, 42, &computed, vec!["b".into()]).await;

        assert_eq!(first, vec!["a".to_string()]);
        assert_eq!(second, vec!["a".to_string()]);
        assert_eq!(computed.load(Ordering::SeqCst), 1);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hit, 1);
        assert_eq!(snapshot.cache_miss, 1);
    }

    #[tokio::test]
    async fn write_invalidates_before_next_read() {
        let store = MemoryStore::new();
        let (cache, _) = cache_over(&store);
        let computed = AtomicUsize::new(0);

        let before = list_through(&cache, 42, &computed, vec!["old".into()]).await;
        assert_eq!(before, vec!["old".to_string()]);

        // 模拟一次写提交后的失效
        cache.invalidate(42).await;

        let after = list_through(&cache, 42, &computed, vec!["new".into()]).await;
        assert_eq!(after, vec!["new".to_string()]);
        assert_eq!(computed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_is_scoped_to_owner() {
        let store = MemoryStore::new();
        let (cache, _) = cache_over(&store);
        let computed = AtomicUsize::new(0);

        list_through(&cache, 42, &computed, vec!["a".into()]).await;
        list_through(&cache, 43, &computed, vec!["b".into()]).await;

        cache.invalidate(42).await;

        let other = list_through(&cache, 43, &computed, vec!["c".into()]).await;
        assert_eq!(other, vec!["b".to_string()]);
        assert_eq!(computed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_with_no_entries_is_a_noop() {
        let store = MemoryStore::new();
        let (cache, metrics) = cache_over(&store);

        cache.invalidate(42).await;

        assert_eq!(metrics.snapshot().invalidation_failed, 0);
        assert_eq!(store.live_entries(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_falls_back_to_compute() {
        let store = MemoryStore::new();
        let (cache, metrics) = cache_over(&store);
        let computed = AtomicUsize::new(0);

        store.set_unavailable(true);
        let value = list_through(&cache, 42, &computed, vec!["fresh".into()]).await;

        assert_eq!(value, vec!["fresh".to_string()]);
        assert_eq!(computed.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.snapshot().cache_miss, 1);
    }

    #[tokio::test]
    async fn invalidation_failure_is_counted_not_propagated() {
        let store = MemoryStore::new();
        let (cache, metrics) = cache_over(&store);

        store.set_unavailable(true);
        cache.invalidate(42).await;

        assert_eq!(metrics.snapshot().invalidation_failed, 1);
    }

    #[tokio::test]
    async fn corrupt_payload_is_a_miss() {
        let store = MemoryStore::new();
        let (cache, metrics) = cache_over(&store);
        let computed = AtomicUsize::new(0);

        store
            .set_with_ttl("notes:42:list", "{not json", 300)
            .await
            .unwrap();

        let value = list_through(&cache, 42, &computed, vec!["clean".into()]).await;
        assert_eq!(value, vec!["clean".to_string()]);
        assert_eq!(computed.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.snapshot().cache_miss, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_recomputed() {
        let store = MemoryStore::new();
        let (cache, _) = cache_over(&store);
        let computed = AtomicUsize::new(0);

        list_through(&cache, 42, &computed, vec!["a".into()]).await;
        store.advance(301);

        let value = list_through(&cache, 42, &computed, vec!["b".into()]).await;
        assert_eq!(value, vec!["b".to_string()]);
        assert_eq!(computed.load(Ordering::SeqCst), 2);
    }
}
