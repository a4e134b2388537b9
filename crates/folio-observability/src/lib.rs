//! folio Observability
//!
//! 日志初始化与 span 辅助函数。

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, LoggingConfig};
pub use error::{ObservabilityError, Result};
pub use logging::{command_span, session_span, LogManager};
