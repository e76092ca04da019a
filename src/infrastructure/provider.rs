//! 服务提供者
//!
//! 应用的显式注册表：每个服务的名称、生命周期、依赖和回调都在这里声明。

use super::container::{ContainerError, Dependency, ScopedHandle, ServiceContainer, ServiceDefinition};
use crate::config::AppConfig;
use crate::domain::errors::DomainError;
use crate::domain::interfaces::{DiscountPolicy, MemberRepository, MemberService, OrderService, RequestLog};
use crate::domain::services::{
    FixDiscountPolicy, LogDemoService, MemberServiceImpl, MemoryMemberRepository, MyLogger,
    NetworkClient, OrderServiceImpl, RateDiscountPolicy, StatefulService,
};
use std::sync::Arc;

/// 主折扣策略的限定符
pub const MAIN_DISCOUNT_POLICY: &str = "main";
/// 备用折扣策略的限定符
pub const SECONDARY_DISCOUNT_POLICY: &str = "secondary";

/// 服务提供者工厂
pub struct ProviderFactory {
    config: Arc<AppConfig>,
}

impl ProviderFactory {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    /// 注册所有默认服务
    pub fn register_default_providers(&self, container: &ServiceContainer) -> Result<(), ContainerError> {
        self.register_member_services(container)?;
        self.register_discount_policies(container)?;
        self.register_order_services(container)?;
        self.register_web_services(container)?;
        self.register_infrastructure_services(container)?;
        Ok(())
    }

    fn register_member_services(&self, container: &ServiceContainer) -> Result<(), ContainerError> {
        container.register(
            ServiceDefinition::builder::<dyn MemberRepository>("memberRepository")
                .build(|_| Ok(Arc::new(MemoryMemberRepository::new()) as Arc<dyn MemberRepository>)),
        )?;

        container.register(
            ServiceDefinition::builder::<dyn MemberService>("memberService")
                .depends_on(Dependency::on::<dyn MemberRepository>())
                .build(|deps| {
                    let member_repository = deps.get::<dyn MemberRepository>(0)?;
                    Ok(Arc::new(MemberServiceImpl::new(member_repository)) as Arc<dyn MemberService>)
                }),
        )
    }

    fn register_discount_policies(&self, container: &ServiceContainer) -> Result<(), ContainerError> {
        let fix_amount = self.config.discount.fix_amount;
        container.register(
            ServiceDefinition::builder::<dyn DiscountPolicy>("fixDiscountPolicy")
                .qualifier(SECONDARY_DISCOUNT_POLICY)
                .build(move |_| Ok(Arc::new(FixDiscountPolicy::new(fix_amount)) as Arc<dyn DiscountPolicy>)),
        )?;

        let rate_percent = self.config.discount.rate_percent;
        container.register(
            ServiceDefinition::builder::<dyn DiscountPolicy>("rateDiscountPolicy")
                .qualifier(MAIN_DISCOUNT_POLICY)
                .primary()
                .build(move |_| Ok(Arc::new(RateDiscountPolicy::new(rate_percent)) as Arc<dyn DiscountPolicy>)),
        )
    }

    fn register_order_services(&self, container: &ServiceContainer) -> Result<(), ContainerError> {
        container.register(
            ServiceDefinition::builder::<OrderServiceImpl>("orderServiceImpl")
                .depends_on(Dependency::on::<dyn MemberRepository>())
                .depends_on(Dependency::qualified::<dyn DiscountPolicy>(MAIN_DISCOUNT_POLICY))
                .build(|deps| {
                    let member_repository = deps.get::<dyn MemberRepository>(0)?;
                    let discount_policy = deps.get::<dyn DiscountPolicy>(1)?;
                    Ok(Arc::new(OrderServiceImpl::new(member_repository, discount_policy)))
                }),
        )?;

        // 以接口类型暴露同一个实例
        container.register(
            ServiceDefinition::builder::<dyn OrderService>("orderService")
                .depends_on(Dependency::on::<OrderServiceImpl>())
                .build(|deps| Ok(deps.get::<OrderServiceImpl>(0)? as Arc<dyn OrderService>)),
        )
    }

    fn register_web_services(&self, container: &ServiceContainer) -> Result<(), ContainerError> {
        container.register(
            ServiceDefinition::builder::<MyLogger>("myLogger")
                .scoped()
                .init(|logger| {
                    logger.on_create();
                    Ok(())
                })
                .destroy(|logger| {
                    logger.on_close();
                    Ok(())
                })
                .build(|_| Ok(Arc::new(MyLogger::new()))),
        )?;

        container.register_singleton("logDemoService", || Arc::new(LogDemoService::new()))
    }

    fn register_infrastructure_services(&self, container: &ServiceContainer) -> Result<(), ContainerError> {
        let url = self.config.network.url.clone();
        container.register(
            ServiceDefinition::builder::<NetworkClient>("networkClient")
                .init(|client| Ok(client.init()?))
                .destroy(|client| Ok(client.close()?))
                .build(move |_| Ok(Arc::new(NetworkClient::new(url.clone())))),
        )?;

        container.register_singleton("statefulService", || Arc::new(StatefulService::new()))
    }
}

/// 按默认注册表装配一个新容器
pub fn build_container(config: Arc<AppConfig>) -> Result<ServiceContainer, ContainerError> {
    let container = ServiceContainer::new();
    ProviderFactory::new(config).register_default_providers(&container)?;
    Ok(container)
}

/// 通过句柄使用请求作用域的日志器，第一次写日志时才创建实例
impl RequestLog for ScopedHandle<MyLogger> {
    fn set_request_url(&self, request_url: &str) -> Result<(), DomainError> {
        self.get()
            .map_err(|e| DomainError::ScopeUnavailable(e.to_string()))?
            .set_request_url(request_url)
    }

    fn log(&self, message: &str) -> Result<(), DomainError> {
        self.get()
            .map_err(|e| DomainError::ScopeUnavailable(e.to_string()))?
            .log(message)
    }
}
