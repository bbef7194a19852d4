use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// 核心可观测计数，准入与缓存路径上共享
#[derive(Debug, Default)]
pub struct CoreMetrics {
    admitted: AtomicU64,
    rejected: AtomicU64,
    admission_fail_open: AtomicU64,
    cache_hit: AtomicU64,
    cache_miss: AtomicU64,
    invalidation_failed: AtomicU64,
}

/// 指标快照，/metrics 接口返回
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub admitted: u64,
    pub rejected: u64,
    pub admission_fail_open: u64,
    pub cache_hit: u64,
    pub cache_miss: u64,
    pub invalidation_failed: u64,
}

impl CoreMetrics {
    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admission_fail_open(&self) {
        self.admission_fail_open.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hit.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_miss.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation_failed(&self) {
        self.invalidation_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            admission_fail_open: self.admission_fail_open.load(Ordering::Relaxed),
            cache_hit: self.cache_hit.load(Ordering::Relaxed),
            cache_miss: self.cache_miss.load(Ordering::Relaxed),
            invalidation_failed: self.invalidation_failed.load(Ordering::Relaxed),
        }
    }
}
