use crate::args::OrderArgs;
use crate::domain::entities::{Member, Order};
use crate::domain::interfaces::{DiscountPolicy, MemberRepository, MemberService, OrderService};
use crate::domain::services::OrderServiceImpl;
use crate::errors::AppError;
use crate::infrastructure::container::ServiceContainer;

/// 处理下单命令
///
/// 未指定 `--policy` 时使用容器装配好的订单服务；指定时按限定符单独解析折扣策略。
pub fn handle_order(container: &ServiceContainer, args: &OrderArgs) -> Result<Order, AppError> {
    let member_service = container.resolve::<dyn MemberService>()?;
    member_service.join(Member::new(args.member_id, args.name.clone(), args.grade))?;

    let order = match &args.policy {
        None => {
            let order_service = container.resolve::<dyn OrderService>()?;
            order_service.create_order(args.member_id, &args.item, args.price)?
        }
        Some(qualifier) => {
            let member_repository = container.resolve::<dyn MemberRepository>()?;
            let discount_policy = container.resolve_qualified::<dyn DiscountPolicy>(qualifier)?;
            OrderServiceImpl::new(member_repository, discount_policy)
                .create_order(args.member_id, &args.item, args.price)?
        }
    };

    tracing::info!(
        member_id = order.member_id,
        price = order.calculate_price(),
        "Order handled"
    );
    Ok(order)
}
