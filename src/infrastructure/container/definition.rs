//! 服务定义
//!
//! 一个定义由以下部分组成：
//! - 身份：名称 + 声明类型（注册后不可变）
//! - 工厂函数：接收已解析的依赖并产生实例
//! - 有序的依赖槽位（按类型，可选限定符）
//! - 生命周期、primary 标记、限定符
//! - 可选的 init / destroy 回调
//!
//! 声明类型可以是 trait 对象（例如 `dyn DiscountPolicy`），
//! 实例统一以 `Arc<T>` 的形式被类型擦除后保存。

use super::error::{BoxError, ContainerError};
use super::ServiceLifetime;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除后的实例，内部保存的是 `Arc<T>`
pub(crate) type ErasedInstance = Arc<dyn Any + Send + Sync>;

pub(crate) type ErasedFactory =
    Arc<dyn Fn(&ResolvedDependencies) -> Result<ErasedInstance, BoxError> + Send + Sync>;

pub(crate) type ErasedCallback =
    Arc<dyn Fn(&ErasedInstance) -> Result<(), BoxError> + Send + Sync>;

/// 定义身份：名称 + 声明类型
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionKey {
    pub type_id: TypeId,
    pub name: String,
}

/// 依赖槽位
#[derive(Debug, Clone)]
pub struct Dependency {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) qualifier: Option<String>,
}

impl Dependency {
    /// 按类型声明依赖
    pub fn on<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            qualifier: None,
        }
    }

    /// 按类型声明依赖，并用名称或限定符消歧
    pub fn qualified<T: ?Sized + 'static>(qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            ..Self::on::<T>()
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

/// 传给工厂函数的已解析依赖，顺序与声明的依赖槽位一致
pub struct ResolvedDependencies {
    slots: Vec<(Dependency, ErasedInstance)>,
}

impl ResolvedDependencies {
    pub(crate) fn new(slots: Vec<(Dependency, ErasedInstance)>) -> Self {
        Self { slots }
    }

    /// 按槽位下标取出依赖
    pub fn get<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Arc<T>, ContainerError> {
        let (dependency, instance) =
            self.slots
                .get(index)
                .ok_or_else(|| ContainerError::TypeCastFailed {
                    expected: type_name::<T>(),
                    context: format!(
                        "dependency slot {} (only {} declared)",
                        index,
                        self.slots.len()
                    ),
                })?;

        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| ContainerError::TypeCastFailed {
                expected: type_name::<T>(),
                context: format!(
                    "dependency slot {} declared as '{}'",
                    index, dependency.type_name
                ),
            })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// 服务定义（类型擦除后）
pub struct ServiceDefinition {
    pub(crate) key: DefinitionKey,
    pub(crate) type_name: &'static str,
    pub(crate) lifetime: ServiceLifetime,
    pub(crate) primary: bool,
    pub(crate) qualifier: Option<String>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) factory: ErasedFactory,
    pub(crate) init: Option<ErasedCallback>,
    pub(crate) destroy: Option<ErasedCallback>,
}

impl ServiceDefinition {
    /// 为声明类型 `T` 创建定义构建器，默认生命周期为单例
    pub fn builder<T>(name: impl Into<String>) -> DefinitionBuilder<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        DefinitionBuilder {
            name: name.into(),
            lifetime: ServiceLifetime::Singleton,
            primary: false,
            qualifier: None,
            dependencies: Vec::new(),
            init: None,
            destroy: None,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &DefinitionKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn lifetime(&self) -> ServiceLifetime {
        self.lifetime
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn has_destroy_callback(&self) -> bool {
        self.destroy.is_some()
    }

    /// 名称或限定符是否与给定值匹配
    pub(crate) fn matches_name(&self, name: &str) -> bool {
        self.key.name == name
    }

    pub(crate) fn matches_qualifier(&self, qualifier: &str) -> bool {
        self.qualifier.as_deref() == Some(qualifier)
    }
}

impl fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("name", &self.key.name)
            .field("type_name", &self.type_name)
            .field("lifetime", &self.lifetime)
            .field("primary", &self.primary)
            .field("qualifier", &self.qualifier)
            .field("dependencies", &self.dependencies)
            .field("init", &self.init.is_some())
            .field("destroy", &self.destroy.is_some())
            .finish()
    }
}

/// 定义构建器
pub struct DefinitionBuilder<T: ?Sized> {
    name: String,
    lifetime: ServiceLifetime,
    primary: bool,
    qualifier: Option<String>,
    dependencies: Vec<Dependency>,
    init: Option<ErasedCallback>,
    destroy: Option<ErasedCallback>,
    _marker: PhantomData<fn(&T)>,
}

impl<T> DefinitionBuilder<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub fn lifetime(mut self, lifetime: ServiceLifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn singleton(self) -> Self {
        self.lifetime(ServiceLifetime::Singleton)
    }

    pub fn prototype(self) -> Self {
        self.lifetime(ServiceLifetime::Prototype)
    }

    pub fn scoped(self) -> Self {
        self.lifetime(ServiceLifetime::Scoped)
    }

    /// 标记为同类型候选中的默认选择
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// 追加一个依赖槽位，工厂中按追加顺序通过下标取出
    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// 实例创建后、缓存前调用；失败时实例被丢弃
    pub fn init<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.init = Some(erase_callback::<T, F>(callback, "init callback"));
        self
    }

    /// 容器关闭（单例）或作用域退出（作用域实例）时调用
    pub fn destroy<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.destroy = Some(erase_callback::<T, F>(callback, "destroy callback"));
        self
    }

    /// 设置工厂函数并完成构建
    pub fn build<F>(self, factory: F) -> ServiceDefinition
    where
        F: Fn(&ResolvedDependencies) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        let factory: ErasedFactory = Arc::new(
            move |deps: &ResolvedDependencies| -> Result<ErasedInstance, BoxError> {
                let service = factory(deps)?;
                let instance: ErasedInstance = Arc::new(service);
                Ok(instance)
            },
        );

        ServiceDefinition {
            key: DefinitionKey {
                type_id: TypeId::of::<T>(),
                name: self.name,
            },
            type_name: type_name::<T>(),
            lifetime: self.lifetime,
            primary: self.primary,
            qualifier: self.qualifier,
            dependencies: self.dependencies,
            factory,
            init: self.init,
            destroy: self.destroy,
        }
    }
}

fn erase_callback<T, F>(callback: F, context: &'static str) -> ErasedCallback
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(
        move |instance: &ErasedInstance| -> Result<(), BoxError> {
            let service = instance.downcast_ref::<Arc<T>>().ok_or_else(|| {
                ContainerError::TypeCastFailed {
                    expected: type_name::<T>(),
                    context: context.to_string(),
                }
            })?;
            callback(&**service)
        },
    )
}
