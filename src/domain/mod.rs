//! 领域层
//!
//! 会员、订单与折扣等示例业务对象，全部通过容器装配：
//! - 领域实体
//! - 服务接口
//! - 服务实现

pub mod entities;
pub mod errors;
pub mod interfaces;
pub mod services;
