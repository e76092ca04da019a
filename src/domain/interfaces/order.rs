//! 订单接口

use crate::domain::entities::Order;
use crate::domain::errors::DomainError;

pub trait OrderService: Send + Sync {
    fn create_order(&self, member_id: u64, item_name: &str, item_price: u64) -> Result<Order, DomainError>;
}
