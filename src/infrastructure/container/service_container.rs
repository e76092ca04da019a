//! 服务容器
//!
//! 解析分两步进行：先在注册表读锁下选出定义并构建完整的解析计划，
//! 再按计划自底向上创建实例。缺失、歧义和循环依赖在第一步就会失败，
//! 因此不会有任何实例被部分构造或缓存。
//!
//! 每次解析都持有生命周期读锁，关闭流程持有写锁：关闭会等待进行中的解析完成，
//! 之后的解析一律返回 `ContainerShutDown`。销毁回调中不能再从容器解析服务。

use super::definition::{ErasedInstance, ResolvedDependencies, ServiceDefinition};
use super::error::ContainerError;
use super::registry::{RegisteredDefinition, Registry, ResolutionPlan};
use super::scope::{ScopeCache, ScopeInfo, ScopeKey, ScopeManager, ScopedHandle};
use super::stats::{ContainerStats, InnerStats};
use super::ServiceLifetime;
use parking_lot::{Mutex, RwLock};
use std::any::{type_name, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 依赖注入容器
///
/// 克隆开销很小，所有克隆共享同一份注册表、缓存与作用域。
#[derive(Clone)]
pub struct ServiceContainer {
    registry: Arc<RwLock<Registry>>,
    /// 单例按创建完成的顺序记录，关闭时逆序销毁
    creation_order: Arc<Mutex<Vec<Arc<RegisteredDefinition>>>>,
    scopes: Arc<ScopeManager>,
    stats: Arc<InnerStats>,
    shut_down: Arc<AtomicBool>,
    lifecycle: Arc<RwLock<()>>,
}

impl ServiceContainer {
    /// 创建新的容器实例
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            creation_order: Arc::new(Mutex::new(Vec::new())),
            scopes: Arc::new(ScopeManager::default()),
            stats: Arc::new(InnerStats::default()),
            shut_down: Arc::new(AtomicBool::new(false)),
            lifecycle: Arc::new(RwLock::new(())),
        }
    }

    /// 注册服务定义，不会创建任何实例
    pub fn register(&self, definition: ServiceDefinition) -> Result<(), ContainerError> {
        self.ensure_running()?;

        let registered = self.registry.write().insert(definition)?;
        debug!(
            name = registered.name(),
            type_name = registered.definition.type_name(),
            lifetime = %registered.lifetime(),
            dependencies = registered.definition.dependencies().len(),
            "Registered service definition"
        );
        Ok(())
    }

    /// 注册没有依赖的单例服务 - 便捷方法
    pub fn register_singleton<T, F>(&self, name: &str, factory: F) -> Result<(), ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register(ServiceDefinition::builder::<T>(name).singleton().build(move |_| Ok(factory())))
    }

    /// 注册没有依赖的原型服务 - 便捷方法
    pub fn register_prototype<T, F>(&self, name: &str, factory: F) -> Result<(), ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register(ServiceDefinition::builder::<T>(name).prototype().build(move |_| Ok(factory())))
    }

    /// 注册没有依赖的作用域服务 - 便捷方法
    pub fn register_scoped<T, F>(&self, name: &str, factory: F) -> Result<(), ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register(ServiceDefinition::builder::<T>(name).scoped().build(move |_| Ok(factory())))
    }

    /// 按类型解析服务
    pub fn resolve<T>(&self) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_with::<T>(None)
    }

    /// 按类型解析服务，并用名称或限定符消歧
    pub fn resolve_qualified<T>(&self, qualifier: &str) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_with::<T>(Some(qualifier))
    }

    /// 按名称 + 类型精确查找
    pub fn resolve_named<T>(&self, name: &str) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let _running = self.lifecycle.read_recursive();
        self.ensure_running()?;
        self.stats.record_resolution();

        let plan = {
            let registry = self.registry.read();
            let selected = registry.select_named(TypeId::of::<T>(), type_name::<T>(), name)?;
            registry.plan(selected)?
        };
        let instance = self.instantiate(&plan, None)?;
        downcast_instance::<T>(instance, plan.definition.name())
    }

    fn resolve_with<T>(&self, qualifier: Option<&str>) -> Result<Arc<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let _running = self.lifecycle.read_recursive();
        self.ensure_running()?;
        self.stats.record_resolution();

        let plan = {
            let registry = self.registry.read();
            let selected = registry.select(TypeId::of::<T>(), type_name::<T>(), qualifier)?;
            registry.plan(selected)?
        };
        let instance = self.instantiate(&plan, None)?;
        downcast_instance::<T>(instance, plan.definition.name())
    }

    /// 返回作用域服务的延迟句柄
    ///
    /// 选择与依赖图校验立即进行，实例在第一次 `get()` 时才创建。
    pub fn resolve_scoped<T>(&self, scope: &ScopeKey) -> Result<ScopedHandle<T>, ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.ensure_running()?;
        self.scopes.get(scope)?;

        let selected = {
            let registry = self.registry.read();
            let selected = registry
                .select(TypeId::of::<T>(), type_name::<T>(), None)?
                .clone();
            registry.plan(&selected)?;
            selected
        };
        Ok(ScopedHandle::new(self.clone(), selected, scope.clone()))
    }

    /// 句柄解析入口
    pub(crate) fn resolve_in_scope(
        &self,
        definition: &Arc<RegisteredDefinition>,
        scope: &ScopeKey,
    ) -> Result<ErasedInstance, ContainerError> {
        let _running = self.lifecycle.read_recursive();
        self.ensure_running()?;
        let cache = self.scopes.get(scope)?;
        self.stats.record_resolution();

        let plan = self.registry.read().plan(definition)?;
        self.instantiate(&plan, Some(&cache))
    }

    pub(crate) fn scope_cache(&self, scope: &ScopeKey) -> Option<Arc<ScopeCache>> {
        self.scopes.get(scope).ok()
    }

    /// 按计划创建（或取回缓存的）实例
    fn instantiate(
        &self,
        plan: &ResolutionPlan,
        scope: Option<&Arc<ScopeCache>>,
    ) -> Result<ErasedInstance, ContainerError> {
        let definition = &plan.definition;

        match definition.lifetime() {
            ServiceLifetime::Singleton => {
                let mut slot = definition.singleton.lock();
                if let Some(instance) = slot.as_ref() {
                    self.stats.record_hit();
                    return Ok(instance.clone());
                }
                if plan.pruned {
                    // 规划后缓存被关闭流程清空
                    return Err(ContainerError::ContainerShutDown);
                }

                // 单例的依赖不绑定任何作用域
                let instance = self.create(plan, None)?;
                *slot = Some(instance.clone());
                self.creation_order.lock().push(definition.clone());
                self.stats.record_miss();
                Ok(instance)
            }
            ServiceLifetime::Prototype => {
                let instance = self.create(plan, scope)?;
                self.stats.record_prototype();
                Ok(instance)
            }
            ServiceLifetime::Scoped => match scope {
                Some(cache) => {
                    let cell = cache.slot(definition.id);
                    let mut slot = cell.lock();
                    if let Some(instance) = slot.as_ref() {
                        return Ok(instance.clone());
                    }

                    let instance = self.create(plan, Some(cache))?;
                    if let Err(err) = cache.record(definition, &instance) {
                        // 创建期间作用域已退出，实例不会再被任何人持有
                        if let Err(destroy_err) = definition.destroy(&instance) {
                            warn!(name = definition.name(), error = %destroy_err, "Destroy callback failed for orphaned scoped instance");
                        }
                        return Err(err);
                    }
                    *slot = Some(instance.clone());
                    self.stats.record_scoped();
                    debug!(name = definition.name(), scope = %cache.key(), "Created scoped instance");
                    Ok(instance)
                }
                None => {
                    let instance = self.create(plan, None)?;
                    self.stats.record_scoped();
                    Ok(instance)
                }
            },
        }
    }

    /// 解析依赖、调用工厂并执行 init 回调
    fn create(
        &self,
        plan: &ResolutionPlan,
        scope: Option<&Arc<ScopeCache>>,
    ) -> Result<ErasedInstance, ContainerError> {
        let mut slots = Vec::with_capacity(plan.dependencies.len());
        for (dependency, child) in &plan.dependencies {
            let instance = self.instantiate(child, scope)?;
            slots.push((dependency.clone(), instance));
        }

        let registered = &plan.definition;
        let definition = &registered.definition;
        let instance = (definition.factory)(&ResolvedDependencies::new(slots)).map_err(
            |source| ContainerError::CreationFailed {
                name: registered.name().to_string(),
                source,
            },
        )?;

        if let Some(init) = &definition.init {
            init(&instance).map_err(|source| ContainerError::InitCallback {
                name: registered.name().to_string(),
                source,
            })?;
        }

        debug!(
            name = registered.name(),
            lifetime = %registered.lifetime(),
            "Created service instance"
        );
        Ok(instance)
    }

    /// 进入作用域
    pub fn enter_scope(&self, scope: ScopeKey) -> Result<(), ContainerError> {
        let _running = self.lifecycle.read_recursive();
        self.ensure_running()?;
        let cache = self.scopes.enter(scope)?;
        info!(scope = %cache.key(), "Entered scope");
        Ok(())
    }

    /// 生成随机键并进入作用域
    pub fn begin_scope(&self) -> Result<ScopeKey, ContainerError> {
        let scope = ScopeKey::generate();
        self.enter_scope(scope.clone())?;
        Ok(scope)
    }

    /// 退出作用域，按创建逆序执行作用域实例的销毁回调
    pub fn exit_scope(&self, scope: &ScopeKey) -> Result<(), ContainerError> {
        let cache = self.scopes.exit(scope)?;
        let failures = close_scope(&cache);
        info!(scope = %scope, failures = failures.len(), "Exited scope");

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::DestroyFailures {
                context: format!("scope '{}'", scope),
                failures,
            })
        }
    }

    pub fn is_scope_active(&self, scope: &ScopeKey) -> bool {
        self.scopes.is_active(scope)
    }

    pub fn scope_info(&self, scope: &ScopeKey) -> Option<ScopeInfo> {
        self.scope_cache(scope).map(|cache| cache.info())
    }

    pub fn active_scopes(&self) -> Vec<ScopeInfo> {
        self.scopes.infos()
    }

    /// 关闭容器
    ///
    /// 先退出所有仍然活跃的作用域，再按创建的逆序销毁已缓存的单例。
    /// 某个销毁回调失败不会阻止其余回调执行，所有失败汇总后返回。
    /// 重复调用是空操作。进行中的解析会先完成，其创建的单例同样会被销毁。
    pub fn shutdown(&self) -> Result<(), ContainerError> {
        let _closing = self.lifecycle.write();
        if self.shut_down.swap(true, Ordering::SeqCst) {
            debug!("Container already shut down");
            return Ok(());
        }

        let mut failures = Vec::new();
        for cache in self.scopes.drain() {
            failures.extend(close_scope(&cache));
        }

        let created = std::mem::take(&mut *self.creation_order.lock());
        info!(singletons = created.len(), "Shutting down container");

        for definition in created.iter().rev() {
            let instance = definition.singleton.lock().take();
            if let Some(instance) = instance {
                if let Err(err) = definition.destroy(&instance) {
                    warn!(name = definition.name(), error = %err, "Destroy callback failed");
                    failures.push(err);
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::DestroyFailures {
                context: "container".to_string(),
                failures,
            })
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// 检查声明类型是否有任何定义
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.registry.read().contains_type(TypeId::of::<T>())
    }

    /// 按注册顺序返回所有定义名称
    pub fn definition_names(&self) -> Vec<String> {
        self.registry
            .read()
            .iter()
            .map(|definition| definition.name().to_string())
            .collect()
    }

    pub fn definition_count(&self) -> usize {
        self.registry.read().len()
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        self.stats.snapshot(
            self.definition_count(),
            self.creation_order.lock().len(),
            self.scopes.len(),
        )
    }

    /// 获取缓存命中率（百分比）
    pub fn get_cache_hit_rate(&self) -> f64 {
        self.get_stats().cache_hit_rate()
    }

    pub fn get_performance_summary(&self) -> String {
        self.get_stats().performance_summary()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    fn ensure_running(&self) -> Result<(), ContainerError> {
        if self.is_shut_down() {
            Err(ContainerError::ContainerShutDown)
        } else {
            Ok(())
        }
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// 关闭作用域缓存并逆序执行销毁回调，返回失败列表
fn close_scope(cache: &ScopeCache) -> Vec<ContainerError> {
    let created = cache.close();
    let mut failures = Vec::new();

    for (definition, instance) in created.iter().rev() {
        if let Err(err) = definition.destroy(instance) {
            warn!(name = definition.name(), scope = %cache.key(), error = %err, "Destroy callback failed");
            failures.push(err);
        }
    }

    cache.mark_ended();
    failures
}

/// 安全的类型转换
pub(crate) fn downcast_instance<T>(
    instance: ErasedInstance,
    name: &str,
) -> Result<Arc<T>, ContainerError>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| ContainerError::TypeCastFailed {
            expected: type_name::<T>(),
            context: format!("service '{}'", name),
        })
}
