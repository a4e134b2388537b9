//! Error types for folio-tool

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },

    #[error("Tool execution timed out after {0}ms")]
    Timeout(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Argument type mismatch for '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    pub fn failed(tool: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            message: message.to_string(),
        }
    }
}
