use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AttemptError, FetchError};
use crate::retry::{Exhausted, RetryPolicy};
use crate::transport::{HttpTransport, ProfileTransport};
use crate::types::Profile;

/// Anything that can produce a fresh profile
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self) -> Result<Profile, FetchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    pub endpoint: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl FetcherConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay)
    }

    /// Longest a full fetch can take: every attempt hits the request timeout
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        self.timeout
            .saturating_mul(attempts)
            .saturating_add(self.retry_delay.saturating_mul(attempts - 1))
    }

    /// Budget for a `fetch_profile` tool call; it must outlast [`Self::worst_case`]
    /// so the caller sees the `FetchError` rather than a tool timeout.
    pub fn tool_timeout(&self) -> Duration {
        self.worst_case().saturating_add(TOOL_TIMEOUT_SLACK)
    }
}

const TOOL_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Fetches and validates the profile with bounded retries.
///
/// A non-2xx status, an unparseable body and a body missing required fields
/// all count as a failed attempt.
pub struct ProfileFetcher {
    transport: Arc<dyn ProfileTransport>,
    policy: RetryPolicy,
}

impl ProfileFetcher {
    pub fn new(transport: Arc<dyn ProfileTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// HTTP fetcher built from configuration
    pub fn http(config: &FetcherConfig) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(&config.endpoint, config.timeout)
            .map_err(|cause| FetchError::new(0, cause))?;
        Ok(Self::new(Arc::new(transport), config.policy()))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    async fn attempt(&self, attempt: u32) -> Result<Profile, AttemptError> {
        tracing::debug!(attempt, endpoint = %self.transport.endpoint(), "fetching profile");
        let body = self.transport.get_json().await?;
        Profile::from_json(body)
    }
}

#[async_trait]
impl ProfileSource for ProfileFetcher {
    async fn fetch_profile(&self) -> Result<Profile, FetchError> {
        self.policy
            .run(move |attempt| self.attempt(attempt))
            .await
            .map_err(|Exhausted { attempts, last }| {
                tracing::error!(attempts, error = %last, "profile fetch exhausted");
                FetchError::new(attempts, last)
            })
    }
}
