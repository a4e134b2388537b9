use async_trait::async_trait;
use crate::error::Result;

/// Authenticator trait for different authentication methods
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Get the authentication header (header_name, header_value)
    /// Returns None if no authentication is needed
    async fn get_auth_header(&self) -> Result<Option<(String, String)>>;
}

/// API Key authenticator
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    api_key: String,
}

impl ApiKeyAuth {
    /// Create a new API key authenticator
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        if self.api_key.is_empty() {
            return Err(crate::LLMError::Auth("API key is empty".to_string()));
        }
        Ok(Some((
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )))
    }
}

/// Bearer token authenticator
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    /// Create a new bearer authenticator
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authenticator for BearerAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(Some((
            "Authorization".to_string(),
            format!("Bearer {}", self.token),
        )))
    }
}

/// No authentication
#[derive(Debug, Clone)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn get_auth_header(&self) -> Result<Option<(String, String)>> {
        Ok(None)
    }
}
