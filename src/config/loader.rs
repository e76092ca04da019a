use crate::errors::ConfigError;
use std::{collections::HashMap, env, fs, path::{Path, PathBuf}};

use super::app_config::{AppConfig, PartialAppConfig, CONFIG_FILE_NAME, USER_CONFIG_PATH};

const ENV_PREFIX: &str = "HELLO_CORE_";

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default paths
    pub fn new() -> Self {
        Self {
            base_path: None,
            config_file: None,
        }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
            config_file: None,
        }
    }

    /// 使用显式指定的配置文件；文件不存在时报错
    pub fn with_config_file(path: impl AsRef<str>) -> Self {
        let expanded = shellexpand::tilde(path.as_ref());
        Self {
            base_path: None,
            config_file: Some(PathBuf::from(expanded.as_ref())),
        }
    }

    /// Load complete application configuration
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        self.load_config_with_env(&self.collect_env_vars())
    }

    /// 使用给定的环境变量表加载配置
    pub fn load_config_with_env(
        &self,
        env_map: &HashMap<String, String>,
    ) -> Result<AppConfig, ConfigError> {
        let config_path = self.config_path();
        let partial_config = self.load_partial_config(&config_path)?;
        AppConfig::from_partial_and_env(partial_config, env_map)
    }

    /// 配置文件路径
    pub fn config_path(&self) -> PathBuf {
        if let Some(config_file) = &self.config_file {
            return config_file.clone();
        }

        let base_dir = if let Some(base_path) = &self.base_path {
            // For testing: use custom base path
            base_path.join(USER_CONFIG_PATH.trim_start_matches("~/"))
        } else {
            // Normal operation: expand tilde
            let expanded = shellexpand::tilde(USER_CONFIG_PATH);
            PathBuf::from(expanded.as_ref())
        };

        base_dir.join(CONFIG_FILE_NAME)
    }

    /// Load partial config from file
    fn load_partial_config(&self, config_path: &Path) -> Result<Option<PartialAppConfig>, ConfigError> {
        if !config_path.exists() {
            if self.config_file.is_some() {
                return Err(ConfigError::FileRead(
                    config_path.to_string_lossy().to_string(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                ));
            }
            tracing::info!("配置文件 {:?} 不存在，使用默认配置", config_path);
            return Ok(None);
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::FileRead(config_path.to_string_lossy().to_string(), e)
        })?;

        let partial = toml::from_str(&content).map_err(|e| {
            ConfigError::TomlParse(config_path.to_string_lossy().to_string(), e)
        })?;

        tracing::info!("已加载配置文件: {:?}", config_path);
        Ok(Some(partial))
    }

    /// Collect HELLO_CORE_* environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)).collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
