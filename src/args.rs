use crate::domain::entities::Grade;
use clap::{Args as ClapArgs, Parser, Subcommand};

/// hello-core - 显式依赖注入容器演示
#[derive(Parser, Debug)]
#[command(name = "hello-core", version)]
#[command(about = "显式注册的依赖注入容器：单例缓存、限定符与 primary、生命周期回调、请求作用域")]
pub struct Args {
    /// 子命令
    #[command(subcommand)]
    pub command: Command,

    /// 配置文件路径（默认 ~/.config/hello-core/config.toml）
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// 结束时输出容器统计信息
    #[arg(long, global = true)]
    pub stats: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 会员加入并下单
    Order(OrderArgs),
    /// 演示 init / destroy 回调
    Lifecycle,
    /// 模拟并发请求，每个请求使用自己的作用域日志器
    LogDemo(LogDemoArgs),
    /// 演示单例共享与有状态服务的问题
    Singleton,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct OrderArgs {
    /// 会员ID
    #[arg(long, default_value_t = 1)]
    pub member_id: u64,
    /// 会员名称
    #[arg(long, default_value = "memberA")]
    pub name: String,
    /// 会员等级（basic / vip）
    #[arg(long, default_value = "vip")]
    pub grade: Grade,
    /// 商品名称
    #[arg(long, default_value = "itemA")]
    pub item: String,
    /// 商品价格
    #[arg(long, default_value_t = 10000)]
    pub price: u64,
    /// 使用限定符选择折扣策略（main / secondary 或定义名称）
    #[arg(long)]
    pub policy: Option<String>,
    /// 以 JSON 输出订单
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LogDemoArgs {
    /// 并发请求数量
    #[arg(long, default_value_t = 3)]
    pub requests: usize,
    /// 请求 URL
    #[arg(long, default_value = "http://localhost:8080/log-demo")]
    pub url: String,
}
