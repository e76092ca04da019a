pub mod app_config;
pub mod loader;

pub use app_config::{AppConfig, DiscountConfig, LoggingSettings, NetworkConfig};
pub use loader::ConfigLoader;

pub use app_config::{CONFIG_FILE_NAME, USER_CONFIG_PATH};
