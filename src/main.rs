use clap::Parser;
use hello_core::args::{Args, Command};
use hello_core::config::ConfigLoader;
use hello_core::errors::AppError;
use hello_core::handlers::{lifecycle, log_demo, order, singleton};
use hello_core::logging::{init_logging, LoggingConfig};
use hello_core::{build_container, log_error, measure_performance, ServiceContainer};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_config_file(path),
        None => ConfigLoader::new(),
    };
    let config = Arc::new(loader.load_config()?);

    let mut logging = LoggingConfig::from_settings(&config.logging)?;
    if let Some(level) = &args.log_level {
        logging = logging.with_level(level)?;
    }
    init_logging(logging).map_err(|e| AppError::Logging(e.to_string()))?;

    let container = build_container(config.clone())?;
    let result = run(&container, &args).await;

    if args.stats {
        println!("{}", container.get_performance_summary());
    }

    // lifecycle 命令内部已关闭容器，这里再次调用是空操作
    if let Err(e) = container.shutdown() {
        log_error!(e, "shutdown");
        return Err(e.into());
    }

    if let Err(e) = &result {
        log_error!(e, "command");
    }
    result.map_err(Into::into)
}

async fn run(container: &ServiceContainer, args: &Args) -> Result<(), AppError> {
    match &args.command {
        Command::Order(order_args) => {
            let order = measure_performance!("order", { order::handle_order(container, order_args) })?;
            if order_args.json {
                let json = serde_json::to_string_pretty(&order)
                    .map_err(|e| AppError::Generic(format!("failed to serialize order: {}", e)))?;
                println!("{}", json);
            } else {
                println!("order = {}", order);
                println!("order.calculatePrice = {}", order.calculate_price());
            }
        }
        Command::Lifecycle => {
            for event in lifecycle::handle_lifecycle(container)? {
                println!("{}", event);
            }
        }
        Command::LogDemo(demo_args) => {
            let reports = log_demo::handle_log_demo(container, demo_args).await?;
            for report in reports {
                println!("scope {} -> logger {}", report.scope, report.logger_uuid);
                for line in report.lines {
                    println!("  {}", line);
                }
            }
        }
        Command::Singleton => {
            let report = singleton::handle_singleton(container)?;
            println!("memberService shared = {}", report.member_service_shared);
            println!("statefulService shared = {}", report.stateful_service_shared);
            println!("userA price = {}", report.user_a_price);
            println!("userB price = {}", report.user_b_price);
            println!("price seen by userA afterwards = {}", report.price_seen_by_user_a);
        }
    }
    Ok(())
}
