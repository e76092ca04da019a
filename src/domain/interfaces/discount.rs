//! 折扣策略接口

use crate::domain::entities::Member;

pub trait DiscountPolicy: Send + Sync {
    /// 返回折扣金额
    fn discount(&self, member: &Member, price: u64) -> u64;

    fn name(&self) -> &'static str;
}
