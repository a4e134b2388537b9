pub mod config;
pub mod manager;

pub use config::{
    AgentsConfig, AuthSettings, Config, ConfigError, ConfigResult, ConversationConfig, GateConfig, LlmConfig,
    LogLevel, LoggingConfig, ProfileAccess, ProfileConfig, ProviderSettings, RoutingKind,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 覆盖配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "FOLIO_CONFIG";

/// 获取 folio 配置目录路径
pub fn folio_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".folio"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    folio_dir().map(|dir| dir.join("config.json"))
}

/// 获取默认日志文件路径
pub fn default_log_path() -> Option<PathBuf> {
    folio_dir().map(|dir| dir.join("logs").join("folio.log"))
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}
