//! 有状态单例
//!
//! 单例被所有调用方共享，字段中保存的请求数据会被后来的调用覆盖。

use parking_lot::Mutex;

#[derive(Default)]
pub struct StatefulService {
    price: Mutex<u64>,
}

impl StatefulService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 下单并返回本次价格；同时写入共享字段
    pub fn order(&self, name: &str, price: u64) -> u64 {
        tracing::debug!(name, price, "StatefulService order");
        *self.price.lock() = price;
        price
    }

    /// 最后一次写入的价格
    pub fn last_price(&self) -> u64 {
        *self.price.lock()
    }
}
