//! 折扣策略
//!
//! 两种策略都只对 VIP 会员生效。

use crate::domain::entities::Member;
use crate::domain::interfaces::DiscountPolicy;

/// 固定金额折扣
pub struct FixDiscountPolicy {
    discount_amount: u64,
}

impl FixDiscountPolicy {
    pub fn new(discount_amount: u64) -> Self {
        Self { discount_amount }
    }
}

impl Default for FixDiscountPolicy {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl DiscountPolicy for FixDiscountPolicy {
    fn discount(&self, member: &Member, price: u64) -> u64 {
        if member.is_vip() {
            self.discount_amount.min(price)
        } else {
            0
        }
    }

    fn name(&self) -> &'static str {
        "fix"
    }
}

/// 按比例折扣
pub struct RateDiscountPolicy {
    discount_percent: u32,
}

impl RateDiscountPolicy {
    pub fn new(discount_percent: u32) -> Self {
        Self { discount_percent }
    }
}

impl Default for RateDiscountPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}

impl DiscountPolicy for RateDiscountPolicy {
    fn discount(&self, member: &Member, price: u64) -> u64 {
        if member.is_vip() {
            // 先放大到 u128，任何 u64 价格都不会溢出
            let discount = u128::from(price) * u128::from(self.discount_percent) / 100;
            u64::try_from(discount).map_or(price, |discount| discount.min(price))
        } else {
            0
        }
    }

    fn name(&self) -> &'static str {
        "rate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Grade;

    #[test]
    fn test_vip_gets_discount() {
        let vip = Member::new(1, "memberVIP", Grade::Vip);

        assert_eq!(RateDiscountPolicy::default().discount(&vip, 10000), 1000);
        assert_eq!(RateDiscountPolicy::default().discount(&vip, 20000), 2000);
        assert_eq!(FixDiscountPolicy::default().discount(&vip, 10000), 1000);
        assert_eq!(FixDiscountPolicy::default().discount(&vip, 300), 300);
    }

    #[test]
    fn test_rate_discount_near_max_price() {
        let vip = Member::new(1, "memberVIP", Grade::Vip);
        let policy = RateDiscountPolicy::default();

        assert_eq!(policy.discount(&vip, u64::MAX), u64::MAX / 10);
        assert_eq!(policy.discount(&vip, u64::MAX / 2), u64::MAX / 2 / 10);
        assert_eq!(RateDiscountPolicy::new(100).discount(&vip, u64::MAX), u64::MAX);
    }

    #[test]
    fn test_basic_member_pays_full_price() {
        let basic = Member::new(2, "memberBASIC", Grade::Basic);

        assert_eq!(RateDiscountPolicy::default().discount(&basic, 10000), 0);
        assert_eq!(FixDiscountPolicy::default().discount(&basic, 10000), 0);
    }
}
