//! 领域实体

pub mod member;
pub mod order;

pub use member::{Grade, Member};
pub use order::Order;
