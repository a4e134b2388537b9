//! # Session Error Types

use thiserror::Error;

/// 会话错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// 会话不存在
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// 会话已存在
    #[error("Session already exists: {id}")]
    SessionAlreadyExists { id: String },

    /// 达到最大会话数
    #[error("Session limit reached: {limit}")]
    LimitReached { limit: usize },
}

/// 会话结果类型
pub type SessionResult<T> = Result<T, SessionError>;
