use async_trait::async_trait;
use folio_core::chat::{ChatRequest, ChatResponse};
use reqwest::{header, Client};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{ApiKeyAuth, Authenticator, BearerAuth, NoAuth};
use crate::error::{LLMError, Result};
use crate::provider::{AuthConfig, LLMProvider, ProviderConfig, ProviderMetadata};
use crate::transformer::SchemaTransformer;

/// Base provider implementation
/// Handles common HTTP functionality and delegates schema transformation
pub struct BaseProvider<T: SchemaTransformer> {
    config: ProviderConfig,
    http_client: reqwest_middleware::ClientWithMiddleware,
    transformer: Arc<T>,
    pub metadata: ProviderMetadata,
    authenticator: Arc<dyn Authenticator>,
}

fn build_client(
    timeout: Duration,
    max_retries: u32,
) -> Result<reqwest_middleware::ClientWithMiddleware> {
    let retry_policy = ExponentialBackoff::builder()
        .base(2)
        .build_with_max_retries(max_retries);

    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LLMError::Config(e.to_string()))?;

    Ok(reqwest_middleware::ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

impl<T: SchemaTransformer + 'static> BaseProvider<T> {
    /// Create a new base provider
    pub fn new(config: ProviderConfig, transformer: T, metadata: ProviderMetadata) -> Result<Self> {
        let authenticator: Arc<dyn Authenticator> = match &config.auth {
            AuthConfig::ApiKey { key } => Arc::new(ApiKeyAuth::new(key.clone())),
            AuthConfig::Bearer { token } => Arc::new(BearerAuth::new(token.clone())),
            AuthConfig::None => Arc::new(NoAuth),
        };

        Self::with_authenticator(config, transformer, metadata, authenticator)
    }

    /// Create with a custom authenticator
    pub fn with_authenticator(
        config: ProviderConfig,
        transformer: T,
        metadata: ProviderMetadata,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let http_client = build_client(config.timeout, config.max_retries)?;

        Ok(Self {
            config,
            http_client,
            transformer: Arc::new(transformer),
            metadata,
            authenticator,
        })
    }

    /// Get the provider ID
    pub fn provider_id(&self) -> &str {
        &self.config.provider_id
    }

    /// Get the config
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Get the metadata
    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    /// Build request headers
    async fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));

        if let Some((header_name, header_value)) = self.authenticator.get_auth_header().await? {
            let name = header::HeaderName::from_bytes(header_name.as_bytes())
                .map_err(|e| LLMError::Config(format!("Invalid auth header name: {}", e)))?;
            let value = header::HeaderValue::from_str(&header_value)
                .map_err(|e| LLMError::Config(format!("Invalid auth header value: {}", e)))?;
            headers.insert(name, value);
        }

        for (key, value) in &self.config.headers {
            let header_name = header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| LLMError::Config(format!("Invalid header name: {}", e)))?;
            let header_value = header::HeaderValue::from_str(value)
                .map_err(|e| LLMError::Config(format!("Invalid header value: {}", e)))?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    /// Send a non-streaming request
    pub async fn send_request(&self, mut request: ChatRequest) -> Result<ChatResponse> {
        if request.model.is_empty() {
            request.model = self.config.model.clone();
        }
        if !self.config.tool_calling && !request.tools.is_empty() {
            log::warn!(
                "provider {} does not accept tools; dropping {} definitions",
                self.provider_id(),
                request.tools.len()
            );
            request.tools.clear();
        }

        let body = self.transformer.transform_request(&request)?;
        let headers = self.build_headers().await?;
        let url = self.config.completions_url();

        log::debug!(
            "POST {} model={} messages={} tools={}",
            url,
            request.model,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            let error_text = response.text().await.unwrap_or_default();
            log::warn!("provider {} returned {}: {}", self.provider_id(), status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => LLMError::Auth(error_text),
                429 => LLMError::RateLimited { retry_after },
                _ => LLMError::Api {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let response_data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        Ok(self.transformer.parse_response(&response_data)?)
    }
}

#[async_trait]
impl<T: SchemaTransformer + 'static> LLMProvider for BaseProvider<T> {
    fn provider_id(&self) -> &str {
        self.provider_id()
    }

    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.send_request(request).await
    }

    async fn validate(&self) -> Result<()> {
        if self.config.base_url.is_empty() {
            return Err(LLMError::Config("base_url is empty".to_string()));
        }
        if self.config.model.is_empty() {
            return Err(LLMError::Config("model is empty".to_string()));
        }
        let _ = self.build_headers().await?;
        Ok(())
    }
}
