use async_trait::async_trait;
use folio_core::chat::{ChatRequest, ChatResponse};
use crate::error::Result;

/// LLM Provider trait
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Get the provider ID
    fn provider_id(&self) -> &str;

    /// Get provider metadata
    fn metadata(&self) -> &ProviderMetadata;

    /// Default model used when a request leaves it empty
    fn default_model(&self) -> &str;

    /// Send a chat request and get a complete response
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Validate the provider configuration
    async fn validate(&self) -> Result<()>;
}

/// Provider metadata
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    /// Provider ID
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Provider capabilities
    pub capabilities: ProviderCapabilities,
}

/// Provider capabilities
#[derive(Debug, Clone)]
pub struct ProviderCapabilities {
    /// Supports function/tool calling
    pub tool_calling: bool,
    /// Supports JSON mode
    pub json_mode: bool,
}

impl ProviderCapabilities {
    /// Create default capabilities
    pub fn default_capabilities() -> Self {
        Self {
            tool_calling: true,
            json_mode: false,
        }
    }

    /// Plain text completion only
    pub fn text_only() -> Self {
        Self {
            tool_calling: false,
            json_mode: false,
        }
    }
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self::default_capabilities()
    }
}
