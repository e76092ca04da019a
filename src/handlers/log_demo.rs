use crate::args::LogDemoArgs;
use crate::domain::interfaces::RequestLog;
use crate::domain::services::{LogDemoService, MyLogger};
use crate::errors::AppError;
use crate::infrastructure::container::{ScopeKey, ServiceContainer};
use futures_util::future::join_all;

/// 单个请求的处理结果
#[derive(Debug, Clone)]
pub struct RequestReport {
    pub scope: ScopeKey,
    pub logger_uuid: String,
    pub lines: Vec<String>,
}

/// 处理日志演示命令：并发模拟多个请求
pub async fn handle_log_demo(
    container: &ServiceContainer,
    args: &LogDemoArgs,
) -> Result<Vec<RequestReport>, AppError> {
    let tasks = (0..args.requests).map(|index| {
        let container = container.clone();
        let url = format!("{}?request={}", args.url, index);
        tokio::spawn(async move { handle_request(&container, &url) })
    });

    let mut reports = Vec::with_capacity(args.requests);
    for joined in join_all(tasks).await {
        let report = joined.map_err(|e| AppError::Generic(format!("request task failed: {}", e)))??;
        reports.push(report);
    }
    Ok(reports)
}

/// 处理一次请求：进入作用域、通过句柄写日志、退出作用域
pub fn handle_request(container: &ServiceContainer, request_url: &str) -> Result<RequestReport, AppError> {
    let scope = container.begin_scope()?;
    let result = log_request(container, &scope, request_url);
    let exited = container.exit_scope(&scope);

    let report = result?;
    exited?;
    Ok(report)
}

fn log_request(
    container: &ServiceContainer,
    scope: &ScopeKey,
    request_url: &str,
) -> Result<RequestReport, AppError> {
    let log_demo_service = container.resolve::<LogDemoService>()?;
    let my_logger = container.resolve_scoped::<MyLogger>(scope)?;

    my_logger.set_request_url(request_url)?;
    my_logger.log("controller test")?;
    log_demo_service.logic(&my_logger, "testId")?;

    let logger = my_logger.get()?;
    Ok(RequestReport {
        scope: scope.clone(),
        logger_uuid: logger.uuid().to_string(),
        lines: logger.lines(),
    })
}
