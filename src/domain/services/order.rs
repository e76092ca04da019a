//! 订单服务实现

use crate::domain::entities::Order;
use crate::domain::errors::DomainError;
use crate::domain::interfaces::{DiscountPolicy, MemberRepository, OrderService};
use std::sync::Arc;

pub struct OrderServiceImpl {
    member_repository: Arc<dyn MemberRepository>,
    discount_policy: Arc<dyn DiscountPolicy>,
}

impl OrderServiceImpl {
    pub fn new(
        member_repository: Arc<dyn MemberRepository>,
        discount_policy: Arc<dyn DiscountPolicy>,
    ) -> Self {
        Self {
            member_repository,
            discount_policy,
        }
    }

    pub fn member_repository(&self) -> &Arc<dyn MemberRepository> {
        &self.member_repository
    }

    pub fn discount_policy(&self) -> &Arc<dyn DiscountPolicy> {
        &self.discount_policy
    }
}

impl OrderService for OrderServiceImpl {
    fn create_order(&self, member_id: u64, item_name: &str, item_price: u64) -> Result<Order, DomainError> {
        let member = self.member_repository.find_by_id(member_id)?;
        let discount_price = self.discount_policy.discount(&member, item_price);

        tracing::debug!(
            member_id,
            item_name,
            item_price,
            discount_price,
            policy = self.discount_policy.name(),
            "Order created"
        );
        Ok(Order::new(member_id, item_name, item_price, discount_price))
    }
}
