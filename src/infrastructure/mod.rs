//! 基础设施层
//!
//! 提供具体的技术实现：
//! - 依赖注入容器
//! - 应用服务的注册表

pub mod container;
pub mod provider;

pub use container::{ContainerError, ServiceContainer, ServiceLifetime};
pub use provider::{build_container, ProviderFactory};
