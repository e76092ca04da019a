//! 容器错误类型
//!
//! 所有解析错误都会同步返回给调用方，不会被静默吞掉。

use thiserror::Error;

/// 工厂与生命周期回调使用的通用错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 依赖注入容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 相同身份（名称 + 声明类型）的定义已注册
    #[error("Service definition '{name}' of type '{type_name}' is already registered")]
    DuplicateDefinition {
        name: String,
        type_name: &'static str,
    },

    /// 没有任何定义满足请求的类型/限定符
    #[error("No service of type '{type_name}'{} is registered{}", describe_qualifier(.qualifier), describe_available(.available))]
    NoSuchBean {
        type_name: &'static str,
        qualifier: Option<String>,
        available: Vec<String>,
    },

    /// 多个候选且无法通过限定符或 primary 消歧
    #[error("Service type '{type_name}' is ambiguous: {}, {primaries} marked primary", describe_candidates(.candidates))]
    AmbiguousBean {
        type_name: &'static str,
        candidates: Vec<String>,
        primaries: usize,
    },

    /// 依赖图中存在环
    #[error("Circular dependency detected: {}", join_chain(.chain))]
    CyclicDependency { chain: Vec<String> },

    /// 作用域未进入或已退出
    #[error("No active scope '{scope}' for scoped service resolution")]
    NoActiveScope { scope: String },

    /// 作用域已处于激活状态
    #[error("Scope '{scope}' is already active")]
    ScopeAlreadyActive { scope: String },

    /// 工厂函数执行失败
    #[error("Failed to create service '{name}'")]
    CreationFailed {
        name: String,
        #[source]
        source: BoxError,
    },

    /// 初始化回调失败，实例不会被缓存
    #[error("Init callback of service '{name}' failed")]
    InitCallback {
        name: String,
        #[source]
        source: BoxError,
    },

    /// 销毁回调失败
    #[error("Destroy callback of service '{name}' failed")]
    DestroyCallback {
        name: String,
        #[source]
        source: BoxError,
    },

    /// 关闭容器或退出作用域时收集到的销毁回调错误
    #[error("{} destroy callback(s) failed while closing {context}", count(.failures))]
    DestroyFailures {
        context: String,
        failures: Vec<ContainerError>,
    },

    /// 类型转换失败
    #[error("Type cast failed: expected '{expected}' in {context}")]
    TypeCastFailed {
        expected: &'static str,
        context: String,
    },

    /// 容器已关闭
    #[error("Container has been shut down")]
    ContainerShutDown,
}

fn describe_qualifier(qualifier: &Option<String>) -> String {
    match qualifier {
        Some(q) => format!(" with qualifier '{}'", q),
        None => String::new(),
    }
}

fn describe_candidates(candidates: &[String]) -> String {
    format!("{} candidates ({})", candidates.len(), candidates.join(", "))
}

fn join_chain(chain: &[String]) -> String {
    chain.join(" -> ")
}

fn count(failures: &[ContainerError]) -> usize {
    failures.len()
}

fn describe_available(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(". Available candidates: {}", available.join(", "))
    }
}

impl ContainerError {
    /// 是否属于解析阶段（构造任何实例之前）的错误
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            ContainerError::NoSuchBean { .. }
                | ContainerError::AmbiguousBean { .. }
                | ContainerError::CyclicDependency { .. }
        )
    }
}
