//! 容器统计信息

use std::sync::atomic::{AtomicU64, Ordering};

/// 内部统计信息（原子计数器）
#[derive(Default)]
pub(crate) struct InnerStats {
    total_resolutions: AtomicU64,
    singleton_cache_hits: AtomicU64,
    singleton_cache_misses: AtomicU64,
    prototype_creations: AtomicU64,
    scoped_creations: AtomicU64,
}

impl InnerStats {
    pub(crate) fn record_resolution(&self) {
        self.total_resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.singleton_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.singleton_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_prototype(&self) {
        self.prototype_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scoped(&self) {
        self.scoped_creations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.total_resolutions.store(0, Ordering::Relaxed);
        self.singleton_cache_hits.store(0, Ordering::Relaxed);
        self.singleton_cache_misses.store(0, Ordering::Relaxed);
        self.prototype_creations.store(0, Ordering::Relaxed);
        self.scoped_creations.store(0, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        registered_services: usize,
        active_singletons: usize,
        active_scopes: usize,
    ) -> ContainerStats {
        ContainerStats {
            total_resolutions: self.total_resolutions.load(Ordering::Relaxed),
            singleton_cache_hits: self.singleton_cache_hits.load(Ordering::Relaxed),
            singleton_cache_misses: self.singleton_cache_misses.load(Ordering::Relaxed),
            prototype_creations: self.prototype_creations.load(Ordering::Relaxed),
            scoped_creations: self.scoped_creations.load(Ordering::Relaxed),
            registered_services,
            active_singletons,
            active_scopes,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerStats {
    /// 总解析次数（公开解析入口的调用次数）
    pub total_resolutions: u64,
    /// 单例缓存命中次数（含依赖解析）
    pub singleton_cache_hits: u64,
    /// 单例缓存未命中次数，即单例创建次数
    pub singleton_cache_misses: u64,
    /// 原型服务创建次数
    pub prototype_creations: u64,
    /// 作用域服务创建次数
    pub scoped_creations: u64,
    /// 已注册定义数量
    pub registered_services: usize,
    /// 已缓存单例数量
    pub active_singletons: usize,
    /// 活跃作用域数量
    pub active_scopes: usize,
}

impl ContainerStats {
    /// 缓存命中率（百分比）
    pub fn cache_hit_rate(&self) -> f64 {
        self.hit_rate() * 100.0
    }

    /// 缓存命中率（小数）
    pub fn hit_rate(&self) -> f64 {
        let total = self.singleton_cache_hits + self.singleton_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.singleton_cache_hits as f64 / total as f64
        }
    }

    pub fn total(&self) -> u64 {
        self.total_resolutions
    }

    /// 创建分布：(单例, 原型, 作用域)
    pub fn creation_distribution(&self) -> (u64, u64, u64) {
        (
            self.singleton_cache_misses,
            self.prototype_creations,
            self.scoped_creations,
        )
    }

    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} total resolutions, {:.1}% cache hit rate, {} registered services, {} active singletons, {} active scopes",
            self.total_resolutions,
            self.cache_hit_rate(),
            self.registered_services,
            self.active_singletons,
            self.active_scopes
        )
    }
}
