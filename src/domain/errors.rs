//! 领域错误

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Member {0} not found")]
    MemberNotFound(u64),

    #[error("Member {0} already joined")]
    DuplicateMember(u64),

    #[error("Unknown member grade '{0}', expected 'basic' or 'vip'")]
    UnknownGrade(String),

    #[error("Network client for '{url}' is not connected")]
    NotConnected { url: String },

    #[error("Request-scoped dependency unavailable: {0}")]
    ScopeUnavailable(String),
}
