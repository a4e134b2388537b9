use folio_core::agent::defaults::{
    self, DEFAULT_KEYWORDS, DEFAULT_SUBJECT, ERROR_PREFIX, GREETING_TEMPLATE, REFUSAL_TEMPLATE, ROOT_AGENT,
};
use folio_core::{AgentDefinition, AgentRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub llm: LlmConfig,
    pub profile: ProfileConfig,
    pub gate: GateConfig,
    pub agents: AgentsConfig,
    pub conversation: ConversationConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            llm: LlmConfig::default(),
            profile: ProfileConfig::default(),
            gate: GateConfig::default(),
            agents: AgentsConfig::default(),
            conversation: ConversationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn parse_bool(value: &str) -> ConfigResult<bool> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid boolean: {}", value)))
}

fn parse_number<T: FromStr>(value: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid number: {}", value)))
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["llm", "default_provider"] => Some(self.llm.default_provider.clone()),
            ["llm", "providers", name, field] => {
                let provider = self.llm.providers.get(*name)?;
                match *field {
                    "enabled" => Some(provider.enabled.to_string()),
                    "base_url" => Some(provider.base_url.clone()),
                    "model" => provider.model.clone(),
                    "timeout_seconds" => provider.timeout_seconds.map(|t| t.to_string()),
                    "max_retries" => Some(provider.max_retries.to_string()),
                    "tool_calling" => Some(provider.tool_calling.to_string()),
                    _ => None,
                }
            }
            ["profile", "endpoint"] => Some(self.profile.endpoint.clone()),
            ["profile", "max_attempts"] => Some(self.profile.max_attempts.to_string()),
            ["profile", "retry_delay_ms"] => Some(self.profile.retry_delay_ms.to_string()),
            ["profile", "timeout_seconds"] => Some(self.profile.timeout_seconds.to_string()),
            ["profile", "mode"] => Some(self.profile.mode.to_string()),
            ["gate", "refusal"] => Some(self.gate.refusal.clone()),
            ["gate", "keywords"] => Some(self.gate.keywords.join(",")),
            ["agents", "subject"] => Some(self.agents.subject.clone()),
            ["agents", "root"] => Some(self.agents.root.clone()),
            ["agents", "routing"] => Some(self.agents.routing.to_string()),
            ["conversation", "greeting"] => Some(self.conversation.greeting.clone()),
            ["conversation", "error_prefix"] => Some(self.conversation.error_prefix.clone()),
            ["conversation", "history_cap"] => Some(self.conversation.history_cap.to_string()),
            ["conversation", "max_tool_rounds"] => Some(self.conversation.max_tool_rounds.to_string()),
            ["conversation", "idle_timeout_secs"] => Some(self.conversation.idle_timeout_secs.to_string()),
            ["conversation", "max_sessions"] => Some(self.conversation.max_sessions.to_string()),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            ["logging", "json"] => Some(self.logging.json.to_string()),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["llm", "default_provider"] => {
                self.llm.default_provider = value.to_string();
            }
            ["llm", "providers", name, field] => {
                let provider = self
                    .llm
                    .providers
                    .get_mut(*name)
                    .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
                match *field {
                    "enabled" => provider.enabled = parse_bool(value)?,
                    "base_url" => provider.base_url = value.to_string(),
                    "model" => provider.model = Some(value.to_string()),
                    "timeout_seconds" => provider.timeout_seconds = Some(parse_number(value)?),
                    "max_retries" => provider.max_retries = parse_number(value)?,
                    "tool_calling" => provider.tool_calling = parse_bool(value)?,
                    _ => return Err(ConfigError::KeyNotFound(key.to_string())),
                }
            }
            ["profile", "endpoint"] => {
                self.profile.endpoint = value.to_string();
            }
            ["profile", "max_attempts"] => {
                self.profile.max_attempts = parse_number(value)?;
            }
            ["profile", "retry_delay_ms"] => {
                self.profile.retry_delay_ms = parse_number(value)?;
            }
            ["profile", "timeout_seconds"] => {
                self.profile.timeout_seconds = parse_number(value)?;
            }
            ["profile", "mode"] => {
                self.profile.mode = value.parse()?;
            }
            ["gate", "refusal"] => {
                self.gate.refusal = value.to_string();
            }
            ["gate", "keywords"] => {
                self.gate.keywords = value
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(String::from)
                    .collect();
            }
            ["agents", "subject"] => {
                self.agents.subject = value.to_string();
            }
            ["agents", "root"] => {
                self.agents.root = value.to_string();
            }
            ["agents", "routing"] => {
                self.agents.routing = value.parse()?;
            }
            ["conversation", "greeting"] => {
                self.conversation.greeting = value.to_string();
            }
            ["conversation", "error_prefix"] => {
                self.conversation.error_prefix = value.to_string();
            }
            ["conversation", "history_cap"] => {
                self.conversation.history_cap = parse_number(value)?;
            }
            ["conversation", "max_tool_rounds"] => {
                self.conversation.max_tool_rounds = parse_number(value)?;
            }
            ["conversation", "idle_timeout_secs"] => {
                self.conversation.idle_timeout_secs = parse_number(value)?;
            }
            ["conversation", "max_sessions"] => {
                self.conversation.max_sessions = parse_number(value)?;
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            ["logging", "json"] => {
                self.logging.json = parse_bool(value)?;
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }

    /// 当前选中的 provider
    pub fn default_provider(&self) -> Option<&ProviderSettings> {
        self.llm.providers.get(&self.llm.default_provider)
    }
}

/// LLM 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    pub default_provider: String,
    pub providers: HashMap<String, ProviderSettings>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();

        // Gemini 的 OpenAI 兼容接口
        providers.insert(
            "gemini".to_string(),
            ProviderSettings {
                enabled: true,
                base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
                model: Some("gemini-1.5-flash".to_string()),
                auth: AuthSettings::ApiKey {
                    env: "GEMINI_API_KEY".to_string(),
                },
                headers: None,
                timeout_seconds: Some(60),
                max_retries: 0,
                tool_calling: true,
            },
        );

        providers.insert(
            "openai".to_string(),
            ProviderSettings {
                enabled: false,
                base_url: "https://api.openai.com/v1".to_string(),
                model: Some("gpt-4o-mini".to_string()),
                auth: AuthSettings::Bearer {
                    env: "OPENAI_API_KEY".to_string(),
                },
                headers: None,
                timeout_seconds: Some(60),
                max_retries: 0,
                tool_calling: true,
            },
        );

        Self {
            default_provider: "gemini".to_string(),
            providers,
        }
    }
}

/// Provider 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSettings {
    pub enabled: bool,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(flatten)]
    pub auth: AuthSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    /// 传输层重试次数，默认 0（补全请求不重试）
    #[serde(default)]
    pub max_retries: u32,
    /// provider 是否支持工具调用
    #[serde(default = "default_true")]
    pub tool_calling: bool,
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "auth_type", rename_all = "snake_case")]
pub enum AuthSettings {
    /// API key read from an environment variable
    ApiKey { env: String },
    /// Bearer token read from an environment variable
    Bearer { env: String },
    #[default]
    None,
}

impl AuthSettings {
    /// Get API key from environment if applicable
    pub fn get_api_key(&self) -> Option<String> {
        match self {
            Self::ApiKey { env } => std::env::var(env).ok(),
            _ => None,
        }
    }

    /// Get bearer token from environment if applicable
    pub fn get_bearer_token(&self) -> Option<String> {
        match self {
            Self::Bearer { env } => std::env::var(env).ok(),
            _ => None,
        }
    }

    /// Name of the environment variable holding the credential
    pub fn env_var(&self) -> Option<&str> {
        match self {
            Self::ApiKey { env } | Self::Bearer { env } => Some(env),
            Self::None => None,
        }
    }
}

/// 资料的提供方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProfileAccess {
    /// 模型通过 fetch_profile 工具自行获取
    #[default]
    Tool,
    /// 每轮预先获取并作为上下文传入
    Prefetch,
}

impl fmt::Display for ProfileAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool => f.write_str("tool"),
            Self::Prefetch => f.write_str("prefetch"),
        }
    }
}

impl FromStr for ProfileAccess {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "tool" => Ok(Self::Tool),
            "prefetch" => Ok(Self::Prefetch),
            _ => Err(ConfigError::Validation(format!("Invalid profile mode: {}", s))),
        }
    }
}

/// Profile 服务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileConfig {
    /// 资料服务地址
    pub endpoint: String,
    /// 最大尝试次数（含第一次）
    pub max_attempts: u32,
    /// 两次尝试之间的等待时间（毫秒）
    pub retry_delay_ms: u64,
    /// 单次请求超时（秒）
    pub timeout_seconds: u64,
    pub mode: ProfileAccess,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/api/profile".to_string(),
            max_attempts: 3,
            retry_delay_ms: 2000,
            timeout_seconds: 10,
            mode: ProfileAccess::Tool,
        }
    }
}

impl ProfileConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// 相关性判断配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    pub keywords: Vec<String>,
    /// 拒绝回复模板，`{subject}` 会被替换
    pub refusal: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            refusal: REFUSAL_TEMPLATE.to_string(),
        }
    }
}

/// 路由方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoutingKind {
    /// 总是使用根人设，由模型决定
    #[default]
    Model,
    /// 按关键词选择专题人设
    Keyword,
}

impl fmt::Display for RoutingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => f.write_str("model"),
            Self::Keyword => f.write_str("keyword"),
        }
    }
}

impl FromStr for RoutingKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "model" => Ok(Self::Model),
            "keyword" => Ok(Self::Keyword),
            _ => Err(ConfigError::Validation(format!("Invalid routing: {}", s))),
        }
    }
}

/// 人设配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentsConfig {
    /// 助手所代表的人
    pub subject: String,
    /// 根人设名称
    pub root: String,
    pub routing: RoutingKind,
    pub definitions: Vec<AgentDefinition>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            root: ROOT_AGENT.to_string(),
            routing: RoutingKind::Model,
            definitions: defaults::default_agents(),
        }
    }
}

impl AgentsConfig {
    /// 替换 `{subject}` 后构建人设注册表
    pub fn registry(&self) -> Result<AgentRegistry, RegistryError> {
        let definitions = self
            .definitions
            .iter()
            .cloned()
            .map(|agent| agent.for_subject(&self.subject))
            .collect();
        AgentRegistry::new(self.root.clone(), definitions)
    }
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversationConfig {
    /// 问候语模板，`{subject}` 会被替换
    pub greeting: String,
    pub error_prefix: String,
    pub history_cap: usize,
    pub max_tool_rounds: usize,
    pub idle_timeout_secs: u64,
    pub max_sessions: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            greeting: GREETING_TEMPLATE.to_string(),
            error_prefix: ERROR_PREFIX.to_string(),
            history_cap: 10,
            max_tool_rounds: 4,
            idle_timeout_secs: 1800,
            max_sessions: 1000,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    /// 以 JSON 格式输出
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.folio/logs/folio.log".to_string()),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
