use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 订单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub member_id: u64,
    pub item_name: String,
    pub item_price: u64,
    pub discount_price: u64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(member_id: u64, item_name: impl Into<String>, item_price: u64, discount_price: u64) -> Self {
        Self {
            member_id,
            item_name: item_name.into(),
            item_price,
            discount_price,
            created_at: Utc::now(),
        }
    }

    /// 折扣后的实付金额
    pub fn calculate_price(&self) -> u64 {
        self.item_price.saturating_sub(self.discount_price)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order{{member_id={}, item_name='{}', item_price={}, discount_price={}}}",
            self.member_id, self.item_name, self.item_price, self.discount_price
        )
    }
}
