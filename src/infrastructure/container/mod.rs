//! 依赖注入容器
//!
//! 显式注册表 + 类型擦除的实例缓存，支持单例、原型与作用域三种生命周期。

pub mod definition;
pub mod error;
mod registry;
pub mod scope;
mod service_container;
pub mod stats;

pub use definition::{DefinitionBuilder, DefinitionKey, Dependency, ResolvedDependencies, ServiceDefinition};
pub use error::{BoxError, ContainerError};
pub use scope::{ScopeInfo, ScopeKey, ScopeState, ScopedHandle};
pub use service_container::ServiceContainer;
pub use stats::ContainerStats;

use std::fmt;

/// 服务生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLifetime {
    /// 容器生命周期内只有一个实例
    Singleton,
    /// 每次解析都创建新实例，容器不负责销毁
    Prototype,
    /// 每个作用域一个实例，作用域退出时销毁
    Scoped,
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceLifetime::Singleton => "singleton",
            ServiceLifetime::Prototype => "prototype",
            ServiceLifetime::Scoped => "scoped",
        };
        f.write_str(name)
    }
}
