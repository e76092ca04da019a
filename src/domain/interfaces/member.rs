//! 会员接口

use crate::domain::entities::Member;
use crate::domain::errors::DomainError;

/// 会员仓储
pub trait MemberRepository: Send + Sync {
    fn save(&self, member: Member) -> Result<(), DomainError>;

    fn find_by_id(&self, member_id: u64) -> Result<Member, DomainError>;

    fn count(&self) -> usize;
}

/// 会员服务
pub trait MemberService: Send + Sync {
    /// 会员加入
    fn join(&self, member: Member) -> Result<(), DomainError>;

    fn find_member(&self, member_id: u64) -> Result<Member, DomainError>;
}
