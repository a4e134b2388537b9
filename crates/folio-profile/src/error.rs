use thiserror::Error;

/// Failure of a single request to the profile endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttemptError {
    #[error("network error: {0}")]
    Network(String),

    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed profile body: {0}")]
    Decode(String),

    #[error("invalid profile: {0}")]
    Validation(String),
}

/// All attempts to fetch the profile failed
#[derive(Error, Debug, Clone, PartialEq)]
#[error("profile fetch failed after {attempts} attempt(s): {cause}")]
pub struct FetchError {
    pub attempts: u32,
    pub cause: AttemptError,
}

impl FetchError {
    pub fn new(attempts: u32, cause: AttemptError) -> Self {
        Self { attempts, cause }
    }
}
