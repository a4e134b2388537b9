use async_trait::async_trait;
use folio_core::chat::{ChatRequest, ChatResponse};

use crate::error::Result;
use crate::provider::{
    BaseProvider, LLMProvider, ProviderCapabilities, ProviderConfig, ProviderMetadata,
};
use crate::transformer::OpenAiTransformer;

/// OpenAI-compatible chat completions provider
/// The default configuration targets Gemini's OpenAI endpoint
pub struct OpenAiProvider {
    base: BaseProvider<OpenAiTransformer>,
}

impl OpenAiProvider {
    /// Create with custom configuration
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        let provider_id = config.provider_id.clone();
        let metadata = ProviderMetadata {
            id: provider_id.clone(),
            name: match provider_id.as_str() {
                "gemini" => "Google Gemini".to_string(),
                "openai" => "OpenAI".to_string(),
                other => other.to_string(),
            },
            capabilities: ProviderCapabilities {
                tool_calling: config.tool_calling,
                json_mode: false,
            },
        };

        let base = BaseProvider::new(config, OpenAiTransformer::new(), metadata)?;
        Ok(Self { base })
    }

    /// Create a new OpenAI provider with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ProviderConfig::new("openai", "https://api.openai.com/v1").with_api_key(api_key))
    }

    /// Create with custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(ProviderConfig::new("openai", base_url).with_api_key(api_key))
    }

    /// Gemini provider keyed from `GEMINI_API_KEY`
    pub fn gemini() -> Result<Self> {
        Self::with_config(ProviderConfig::gemini())
    }

    pub fn config(&self) -> &ProviderConfig {
        self.base.config()
    }
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    fn provider_id(&self) -> &str {
        self.base.provider_id()
    }

    fn metadata(&self) -> &ProviderMetadata {
        self.base.metadata()
    }

    fn default_model(&self) -> &str {
        &self.base.config().model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.base.send_request(request).await
    }

    async fn validate(&self) -> Result<()> {
        LLMProvider::validate(&self.base).await
    }
}
