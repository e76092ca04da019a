//! 作用域管理
//!
//! 作用域由调用方显式进入和退出，容器从不推断。
//! 每个作用域持有自己的实例槽位和创建记录，退出时按创建的逆序执行销毁回调。

use super::definition::ErasedInstance;
use super::error::ContainerError;
use super::registry::RegisteredDefinition;
use super::service_container::{downcast_instance, ServiceContainer};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 作用域键，例如一次请求的标识
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey(String);

impl ScopeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// 生成随机键（v4 UUID）
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ScopeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// 作用域状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// 作用域已激活，可以使用
    Active,
    /// 作用域正在结束，销毁回调执行中
    Ending,
    /// 作用域已结束，不能继续使用
    Ended,
}

/// 作用域信息快照
#[derive(Debug, Clone)]
pub struct ScopeInfo {
    pub key: ScopeKey,
    pub state: ScopeState,
    /// 进入时间
    pub entered_at: Instant,
    /// 退出时间
    pub exited_at: Option<Instant>,
    /// 作用域内已创建的实例数量
    pub instance_count: usize,
}

impl ScopeInfo {
    /// 获取作用域持续时间
    pub fn duration(&self) -> Duration {
        match self.exited_at {
            Some(end) => end - self.entered_at,
            None => self.entered_at.elapsed(),
        }
    }

    /// 检查作用域是否有效
    pub fn is_valid(&self) -> bool {
        matches!(self.state, ScopeState::Active)
    }
}

type ScopeSlot = Arc<Mutex<Option<ErasedInstance>>>;

struct ScopeLog {
    state: ScopeState,
    exited_at: Option<Instant>,
    created: Vec<(Arc<RegisteredDefinition>, ErasedInstance)>,
}

/// 单个作用域的实例缓存
pub(crate) struct ScopeCache {
    key: ScopeKey,
    entered_at: Instant,
    slots: DashMap<usize, ScopeSlot>,
    log: Mutex<ScopeLog>,
}

impl ScopeCache {
    fn new(key: ScopeKey) -> Self {
        Self {
            key,
            entered_at: Instant::now(),
            slots: DashMap::new(),
            log: Mutex::new(ScopeLog {
                state: ScopeState::Active,
                exited_at: None,
                created: Vec::new(),
            }),
        }
    }

    pub(crate) fn key(&self) -> &ScopeKey {
        &self.key
    }

    /// 定义在本作用域内的槽位，锁住它即可串行化同一定义的创建
    pub(crate) fn slot(&self, definition_id: usize) -> ScopeSlot {
        self.slots
            .entry(definition_id)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    pub(crate) fn is_realized(&self, definition_id: usize) -> bool {
        let slot = self.slots.get(&definition_id).map(|entry| entry.value().clone());
        slot.map_or(false, |slot| slot.lock().is_some())
    }

    /// 记录新创建的实例；作用域已关闭时拒绝
    pub(crate) fn record(
        &self,
        definition: &Arc<RegisteredDefinition>,
        instance: &ErasedInstance,
    ) -> Result<(), ContainerError> {
        let mut log = self.log.lock();
        if log.state != ScopeState::Active {
            return Err(ContainerError::NoActiveScope {
                scope: self.key.to_string(),
            });
        }
        log.created.push((definition.clone(), instance.clone()));
        Ok(())
    }

    /// 关闭作用域并取出已创建的实例（按创建顺序）
    pub(crate) fn close(&self) -> Vec<(Arc<RegisteredDefinition>, ErasedInstance)> {
        let created = {
            let mut log = self.log.lock();
            log.state = ScopeState::Ending;
            std::mem::take(&mut log.created)
        };
        self.slots.clear();
        created
    }

    pub(crate) fn mark_ended(&self) {
        let mut log = self.log.lock();
        log.state = ScopeState::Ended;
        log.exited_at = Some(Instant::now());
    }

    pub(crate) fn info(&self) -> ScopeInfo {
        let log = self.log.lock();
        ScopeInfo {
            key: self.key.clone(),
            state: log.state,
            entered_at: self.entered_at,
            exited_at: log.exited_at,
            instance_count: log.created.len(),
        }
    }
}

/// 活跃作用域表
#[derive(Default)]
pub(crate) struct ScopeManager {
    scopes: DashMap<ScopeKey, Arc<ScopeCache>>,
}

impl ScopeManager {
    pub(crate) fn enter(&self, key: ScopeKey) -> Result<Arc<ScopeCache>, ContainerError> {
        match self.scopes.entry(key) {
            Entry::Occupied(entry) => Err(ContainerError::ScopeAlreadyActive {
                scope: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                let cache = Arc::new(ScopeCache::new(entry.key().clone()));
                entry.insert(cache.clone());
                Ok(cache)
            }
        }
    }

    pub(crate) fn get(&self, key: &ScopeKey) -> Result<Arc<ScopeCache>, ContainerError> {
        self.scopes
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ContainerError::NoActiveScope {
                scope: key.to_string(),
            })
    }

    pub(crate) fn exit(&self, key: &ScopeKey) -> Result<Arc<ScopeCache>, ContainerError> {
        self.scopes
            .remove(key)
            .map(|(_, cache)| cache)
            .ok_or_else(|| ContainerError::NoActiveScope {
                scope: key.to_string(),
            })
    }

    pub(crate) fn is_active(&self, key: &ScopeKey) -> bool {
        self.scopes.contains_key(key)
    }

    /// 移除所有活跃作用域
    pub(crate) fn drain(&self) -> Vec<Arc<ScopeCache>> {
        let keys: Vec<ScopeKey> = self.scopes.iter().map(|entry| entry.key().clone()).collect();
        keys.iter()
            .filter_map(|key| self.scopes.remove(key).map(|(_, cache)| cache))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.scopes.len()
    }

    pub(crate) fn infos(&self) -> Vec<ScopeInfo> {
        self.scopes.iter().map(|entry| entry.value().info()).collect()
    }
}

/// 作用域服务的延迟解析句柄
///
/// 句柄只绑定定义和作用域键，第一次 `get()` 时才在作用域缓存中创建实例。
/// 同一作用域内重复 `get()` 返回同一个实例；作用域退出后 `get()` 返回
/// [`ContainerError::NoActiveScope`]。
pub struct ScopedHandle<T: ?Sized> {
    container: ServiceContainer,
    definition: Arc<RegisteredDefinition>,
    scope: ScopeKey,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T> ScopedHandle<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(
        container: ServiceContainer,
        definition: Arc<RegisteredDefinition>,
        scope: ScopeKey,
    ) -> Self {
        Self {
            container,
            definition,
            scope,
            _marker: PhantomData,
        }
    }

    /// 解析（或取回）当前作用域内的实例
    pub fn get(&self) -> Result<Arc<T>, ContainerError> {
        let instance = self.container.resolve_in_scope(&self.definition, &self.scope)?;
        downcast_instance::<T>(instance, self.definition.name())
    }

    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    pub fn definition_name(&self) -> &str {
        self.definition.name()
    }

    /// 实例是否已在作用域内创建
    pub fn is_realized(&self) -> bool {
        self.container
            .scope_cache(&self.scope)
            .map_or(false, |cache| cache.is_realized(self.definition.id))
    }
}

impl<T: ?Sized> Clone for ScopedHandle<T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            definition: self.definition.clone(),
            scope: self.scope.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for ScopedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedHandle")
            .field("definition", &self.definition.name())
            .field("scope", &self.scope)
            .finish()
    }
}
