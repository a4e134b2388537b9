//! # folio Session
//!
//! 每个会话的内存状态。
//!
//! ## 功能特性
//!
//! - **有界历史**：最多保留 N 条消息，超出时从最旧的一端淘汰
//! - **会话存储**：`get_history` / `append` / `truncate_to` / `reset`
//! - **生命周期**：会话 ID 到会话状态的映射，支持创建、关闭与空闲过期
//!
//! 会话状态只存在于内存中，关闭或过期即丢弃。

pub mod error;
pub mod history;
pub mod manager;
pub mod store;

// 重新导出主要类型
pub use error::{SessionError, SessionResult};
pub use history::{History, DEFAULT_HISTORY_CAP};
pub use manager::{SessionHandle, SessionManager, SessionManagerConfig};
pub use store::SessionStore;
