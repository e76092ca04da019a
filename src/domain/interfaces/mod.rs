//! 领域层接口定义
//!
//! 容器按 trait 对象注册和解析这些接口，实现之间只通过接口相互依赖。

pub mod discount;
pub mod member;
pub mod order;
pub mod request_log;

pub use discount::DiscountPolicy;
pub use member::{MemberRepository, MemberService};
pub use order::OrderService;
pub use request_log::RequestLog;
