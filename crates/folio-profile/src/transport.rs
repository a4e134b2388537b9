use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AttemptError;

/// One GET against the profile endpoint
#[async_trait]
pub trait ProfileTransport: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn get_json(&self) -> Result<Value, AttemptError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AttemptError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AttemptError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ProfileTransport for HttpTransport {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn get_json(&self) -> Result<Value, AttemptError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AttemptError::Network(format!("request timed out: {}", e))
                } else {
                    AttemptError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AttemptError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| AttemptError::Decode(e.to_string()))
    }
}
