//! 观测性错误类型

/// 观测性错误类型
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ObservabilityError {
    /// 配置错误
    #[error("Configuration error: {message}")]
    Config {
        /// 错误信息
        message: String,
    },

    /// 日志错误
    #[error("Logging error: {message}")]
    Logging {
        /// 错误信息
        message: String,
    },

    /// IO 错误
    #[error("IO error: {message}")]
    Io {
        /// 错误信息
        message: String,
    },
}

impl ObservabilityError {
    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 创建日志错误
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    /// 创建 IO 错误
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Logging { .. } => "logging",
            Self::Io { .. } => "io",
        }
    }
}

impl From<std::io::Error> for ObservabilityError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

/// 观测性结果类型
pub type Result<T> = std::result::Result<T, ObservabilityError>;
