//! 会员服务实现

use crate::domain::entities::Member;
use crate::domain::errors::DomainError;
use crate::domain::interfaces::{MemberRepository, MemberService};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// 内存会员仓储
#[derive(Default)]
pub struct MemoryMemberRepository {
    store: DashMap<u64, Member>,
}

impl MemoryMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemberRepository for MemoryMemberRepository {
    fn save(&self, member: Member) -> Result<(), DomainError> {
        match self.store.entry(member.id) {
            Entry::Occupied(_) => Err(DomainError::DuplicateMember(member.id)),
            Entry::Vacant(entry) => {
                entry.insert(member);
                Ok(())
            }
        }
    }

    fn find_by_id(&self, member_id: u64) -> Result<Member, DomainError> {
        self.store
            .get(&member_id)
            .map(|entry| entry.value().clone())
            .ok_or(DomainError::MemberNotFound(member_id))
    }

    fn count(&self) -> usize {
        self.store.len()
    }
}

pub struct MemberServiceImpl {
    member_repository: Arc<dyn MemberRepository>,
}

impl MemberServiceImpl {
    pub fn new(member_repository: Arc<dyn MemberRepository>) -> Self {
        Self { member_repository }
    }

    pub fn member_repository(&self) -> &Arc<dyn MemberRepository> {
        &self.member_repository
    }
}

impl MemberService for MemberServiceImpl {
    fn join(&self, member: Member) -> Result<(), DomainError> {
        tracing::debug!(member_id = member.id, grade = %member.grade, "Member joined");
        self.member_repository.save(member)
    }

    fn find_member(&self, member_id: u64) -> Result<Member, DomainError> {
        self.member_repository.find_by_id(member_id)
    }
}
