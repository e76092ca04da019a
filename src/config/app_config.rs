use crate::errors::{invalid_value, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::loader::ConfigLoader;

// Configuration location constants
pub const USER_CONFIG_PATH: &str = "~/.config/hello-core";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Environment variable names
pub const ENV_LOG_LEVEL: &str = "HELLO_CORE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "HELLO_CORE_LOG_FORMAT";
pub const ENV_FIX_AMOUNT: &str = "HELLO_CORE_FIX_AMOUNT";
pub const ENV_RATE_PERCENT: &str = "HELLO_CORE_RATE_PERCENT";
pub const ENV_NETWORK_URL: &str = "HELLO_CORE_NETWORK_URL";

/// Main Application Configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppConfig {
    pub logging: LoggingSettings,
    pub discount: DiscountConfig,
    pub network: NetworkConfig,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    /// pretty / compact / json
    pub format: String,
    pub show_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
            show_target: false,
        }
    }
}

/// 折扣策略参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountConfig {
    /// 固定折扣金额
    pub fix_amount: u64,
    /// 比例折扣（百分比）
    pub rate_percent: u32,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            fix_amount: 1000,
            rate_percent: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            url: "http://hello-spring.dev".to_string(),
        }
    }
}

/// Partial Application Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialAppConfig {
    logging: Option<PartialLoggingSettings>,
    discount: Option<PartialDiscountConfig>,
    network: Option<PartialNetworkConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialLoggingSettings {
    level: Option<String>,
    format: Option<String>,
    show_target: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialDiscountConfig {
    fix_amount: Option<u64>,
    rate_percent: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialNetworkConfig {
    url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default location and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Create AppConfig from partial config and environment
    ///
    /// 环境变量优先于配置文件。
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let defaults = AppConfig::default();

        let logging = partial.logging.unwrap_or_default();
        let discount = partial.discount.unwrap_or_default();
        let network = partial.network.unwrap_or_default();

        let config = AppConfig {
            logging: LoggingSettings {
                level: env_map
                    .get(ENV_LOG_LEVEL)
                    .cloned()
                    .or(logging.level)
                    .unwrap_or(defaults.logging.level),
                format: env_map
                    .get(ENV_LOG_FORMAT)
                    .cloned()
                    .or(logging.format)
                    .unwrap_or(defaults.logging.format),
                show_target: logging.show_target.unwrap_or(defaults.logging.show_target),
            },
            discount: DiscountConfig {
                fix_amount: match env_map.get(ENV_FIX_AMOUNT) {
                    Some(value) => parse_env(ENV_FIX_AMOUNT, value)?,
                    None => discount.fix_amount.unwrap_or(defaults.discount.fix_amount),
                },
                rate_percent: match env_map.get(ENV_RATE_PERCENT) {
                    Some(value) => parse_env(ENV_RATE_PERCENT, value)?,
                    None => discount.rate_percent.unwrap_or(defaults.discount.rate_percent),
                },
            },
            network: NetworkConfig {
                url: env_map
                    .get(ENV_NETWORK_URL)
                    .cloned()
                    .or(network.url)
                    .unwrap_or(defaults.network.url),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discount.rate_percent > 100 {
            return Err(invalid_value(
                "discount.rate_percent",
                self.discount.rate_percent,
                "must be between 0 and 100",
            ));
        }

        if self.network.url.trim().is_empty() {
            return Err(invalid_value("network.url", &self.network.url, "must not be empty"));
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            other => {
                return Err(invalid_value(
                    "logging.format",
                    other,
                    "expected 'pretty', 'compact' or 'json'",
                ))
            }
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(invalid_value(
                "logging.level",
                &self.logging.level,
                "expected one of trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_value(name, value, "not a valid number"))
}
