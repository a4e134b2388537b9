//! 日志配置

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 观测性配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// 设置日志级别
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// 设置是否使用 JSON 格式
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.logging.json_format = json;
        self
    }

    /// 设置日志文件路径
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.logging.file_path = Some(path.into());
        self
    }

    /// 是否输出到终端（stderr）
    pub fn with_console(mut self, console: bool) -> Self {
        self.logging.console = console;
        self
    }

    /// 添加模块特定的日志级别
    pub fn with_module_level(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        self.logging.module_levels.insert(module.into(), level.into());
        self
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（trace, debug, info, warn, error）
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否使用 JSON 格式
    #[serde(default)]
    pub json_format: bool,

    /// 是否输出到 stderr
    #[serde(default = "default_true")]
    pub console: bool,

    /// 日志文件路径，为空时不写文件
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// 模块级别的日志配置
    #[serde(default)]
    pub module_levels: HashMap<String, String>,

    /// 是否启用 ANSI 颜色
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            console: true,
            file_path: None,
            module_levels: HashMap::new(),
            ansi_colors: true,
        }
    }
}

#[cfg(feature = "config-integration")]
impl From<&folio_config::LoggingConfig> for Config {
    fn from(logging: &folio_config::LoggingConfig) -> Self {
        let mut config = Config::default()
            .with_log_level(logging.level.as_str())
            .with_json_format(logging.json);
        if let Some(path) = logging.file.as_deref().and_then(folio_config::expand_tilde) {
            config = config.with_log_file(path);
        }
        config
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.console);
        assert!(config.logging.file_path.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::default()
            .with_log_level("debug")
            .with_json_format(true)
            .with_console(false)
            .with_module_level("folio_router", "trace");

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert!(!config.logging.console);
        assert_eq!(
            config.logging.module_levels.get("folio_router"),
            Some(&"trace".to_string())
        );
    }

    #[cfg(feature = "config-integration")]
    #[test]
    fn test_from_folio_config() {
        let logging = folio_config::LoggingConfig {
            level: folio_config::LogLevel::Debug,
            file: Some("/tmp/folio-test.log".to_string()),
            json: true,
        };

        let config = Config::from(&logging);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.logging.file_path, Some(PathBuf::from("/tmp/folio-test.log")));
    }
}
