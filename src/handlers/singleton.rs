use crate::domain::interfaces::MemberService;
use crate::domain::services::StatefulService;
use crate::errors::AppError;
use crate::infrastructure::container::ServiceContainer;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingletonReport {
    /// 两次解析得到同一个会员服务实例
    pub member_service_shared: bool,
    /// 两次按名称解析得到同一个有状态服务实例
    pub stateful_service_shared: bool,
    pub user_a_price: u64,
    pub user_b_price: u64,
    /// 用户A之后读取共享字段时看到的价格
    pub price_seen_by_user_a: u64,
}

/// 处理单例命令
pub fn handle_singleton(container: &ServiceContainer) -> Result<SingletonReport, AppError> {
    let member_service1 = container.resolve::<dyn MemberService>()?;
    let member_service2 = container.resolve::<dyn MemberService>()?;

    let stateful_service1 = container.resolve_named::<StatefulService>("statefulService")?;
    let stateful_service2 = container.resolve_named::<StatefulService>("statefulService")?;

    // 线程A: 用户A下单 10000
    let user_a_price = stateful_service1.order("userA", 10000);
    // 线程B: 用户B下单 20000
    let user_b_price = stateful_service2.order("userB", 20000);

    Ok(SingletonReport {
        member_service_shared: Arc::ptr_eq(&member_service1, &member_service2),
        stateful_service_shared: Arc::ptr_eq(&stateful_service1, &stateful_service2),
        user_a_price,
        user_b_price,
        price_seen_by_user_a: stateful_service1.last_price(),
    })
}
