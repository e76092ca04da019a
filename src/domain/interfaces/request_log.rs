//! 请求日志接口

use crate::domain::errors::DomainError;

/// 每个请求一份的日志记录器
pub trait RequestLog: Send + Sync {
    fn set_request_url(&self, request_url: &str) -> Result<(), DomainError>;

    fn log(&self, message: &str) -> Result<(), DomainError>;
}
