//! 领域服务实现

pub mod discount;
pub mod log_demo;
pub mod member;
pub mod network;
pub mod order;
pub mod stateful;

pub use discount::{FixDiscountPolicy, RateDiscountPolicy};
pub use log_demo::{LogDemoService, MyLogger};
pub use member::{MemberServiceImpl, MemoryMemberRepository};
pub use network::NetworkClient;
pub use order::OrderServiceImpl;
pub use stateful::StatefulService;
