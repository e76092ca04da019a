use crate::config::LoggingSettings;
use crate::errors::{invalid_value, ConfigError};
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志格式配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读格式
    Pretty,
    /// JSON 格式
    Json,
    /// 紧凑格式
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(invalid_value(
                "logging.format",
                other,
                "expected 'pretty', 'compact' or 'json'",
            )),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: Level,
    /// 输出格式
    pub format: LogFormat,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// 从配置文件中的 `[logging]` 段构建
    pub fn from_settings(settings: &LoggingSettings) -> Result<Self, ConfigError> {
        let level = parse_level(&settings.level)?;
        let format = settings.format.parse()?;

        Ok(Self {
            level,
            format,
            show_target: settings.show_target,
            ..Self::default()
        })
    }

    /// 覆盖日志级别（命令行参数）
    pub fn with_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.level = parse_level(level)?;
        Ok(self)
    }
}

fn parse_level(level: &str) -> Result<Level, ConfigError> {
    level.parse::<Level>().map_err(|_| {
        invalid_value(
            "logging.level",
            level,
            "expected one of trace, debug, info, warn, error",
        )
    })
}

/// 初始化日志系统
///
/// `RUST_LOG` 存在时优先于配置中的级别。重复初始化返回错误而不是 panic。
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string().to_ascii_lowercase()));

    match config.format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_target(config.show_target)
                .with_thread_ids(config.show_thread_ids);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(config.show_target)
                .with_thread_ids(config.show_thread_ids)
                .with_ansi(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()?;
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_target(config.show_target)
                .with_thread_ids(config.show_thread_ids);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()?;
        }
    }

    tracing::debug!(
        level = ?config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

/// 操作性能计时器
pub struct OperationTimer {
    start: Instant,
    operation: String,
    metadata: std::collections::HashMap<String, String>,
}

impl OperationTimer {
    /// 创建新的计时器
    pub fn new(operation: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
            metadata: std::collections::HashMap::new(),
        }
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// 完成计时并记录日志
    pub fn finish(self) {
        let duration = self.start.elapsed();

        tracing::info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            metadata = ?self.metadata,
            "Operation completed"
        );
    }

    /// 获取当前经过时间
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

/// 错误日志宏
#[macro_export]
macro_rules! log_error {
    ($error:expr, $operation:expr $(, $field:ident = $value:expr)* $(,)?) => {
        tracing::error!(
            error = %$error,
            operation = $operation,
            $($field = $value,)*
            "Operation failed"
        );
    };
}

/// 性能监控宏
#[macro_export]
macro_rules! measure_performance {
    ($operation:expr, $block:block) => {{
        let timer = $crate::logging::OperationTimer::new($operation);
        let result = $block;
        timer.finish();
        result
    }};
}
