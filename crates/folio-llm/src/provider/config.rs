use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Authentication configuration enum
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// API Key authentication (OpenAI style)
    ApiKey {
        /// The API key
        key: String,
    },
    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },
    /// No authentication
    #[default]
    None,
}

impl AuthConfig {
    /// Create API key auth from environment variable
    pub fn from_env(env_var: &str) -> Option<Self> {
        std::env::var(env_var)
            .ok()
            .filter(|key| !key.is_empty())
            .map(|key| Self::ApiKey { key })
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider ID
    pub provider_id: String,
    /// Base URL for the API
    pub base_url: String,
    /// Authentication configuration
    #[serde(flatten)]
    pub auth: AuthConfig,
    /// Default model to use
    pub model: String,
    /// Request timeout in seconds
    #[serde(with = "serde_duration", default = "default_timeout")]
    pub timeout: Duration,
    /// Transport-level retries for transient failures
    #[serde(default)]
    pub max_retries: u32,
    /// Whether the endpoint accepts tool definitions
    #[serde(default = "default_true")]
    pub tool_calling: bool,
    /// Additional headers to include
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ProviderConfig {
    /// Create a new provider config
    pub fn new(provider_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Gemini through its OpenAI-compatible endpoint
    pub fn gemini() -> Self {
        let mut config = Self::new("gemini", GEMINI_BASE_URL).with_model(GEMINI_MODEL);
        if let Some(auth) = AuthConfig::from_env(GEMINI_API_KEY_ENV) {
            config.auth = auth;
        }
        config
    }

    /// Set API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.auth = AuthConfig::ApiKey { key: key.into() };
        self
    }

    /// Set bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthConfig::Bearer { token: token.into() };
        self
    }

    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set transport retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Declare whether tool definitions may be sent
    pub fn with_tool_calling(mut self, enabled: bool) -> Self {
        self.tool_calling = enabled;
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// URL of the chat completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_id: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            auth: AuthConfig::None,
            model: "gpt-4o-mini".to_string(),
            timeout: default_timeout(),
            max_retries: 0,
            tool_calling: true,
            headers: HashMap::new(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_true() -> bool {
    true
}

// Custom serialization for Duration
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
