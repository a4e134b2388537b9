//! # Session Store
//!
//! 单个会话的可变状态。

use std::time::Duration;

use chrono::{DateTime, Utc};
use folio_core::Message;

use crate::history::History;

/// 单个会话
///
/// 同一会话内的轮次是串行的，因此这里不做内部加锁；
/// 跨任务共享时由 [`crate::SessionManager`] 套上异步互斥锁。
#[derive(Debug, Clone)]
pub struct SessionStore {
    id: String,
    history: History,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    turns: u64,
}

impl SessionStore {
    /// 创建空会话
    pub fn new(id: impl Into<String>, history_cap: usize) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            history: History::new(history_cap),
            created_at: now,
            last_activity: now,
            turns: 0,
        }
    }

    /// 使用随机 ID 创建会话
    pub fn with_random_id(history_cap: usize) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), history_cap)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 当前历史的副本
    pub fn get_history(&self) -> Vec<Message> {
        self.history.to_vec()
    }

    /// 只读访问历史
    pub fn history(&self) -> &History {
        &self.history
    }

    /// 追加消息，超出容量时淘汰最旧的消息
    pub fn append(&mut self, message: Message) {
        if let Some(evicted) = self.history.push(message) {
            tracing::trace!(session_id = %self.id, evicted = %evicted.id, "history evicted oldest message");
        }
        self.touch();
    }

    /// 只保留最近的 `n` 条消息
    pub fn truncate_to(&mut self, n: usize) {
        let dropped = self.history.truncate_to(n);
        if dropped > 0 {
            tracing::trace!(session_id = %self.id, dropped, "history truncated");
        }
    }

    /// 清空历史，会话本身保留
    pub fn reset(&mut self) {
        self.history.clear();
        self.turns = 0;
        self.touch();
    }

    /// 开始新一轮，返回轮次编号（从 1 开始）
    pub fn begin_turn(&mut self) -> u64 {
        self.turns += 1;
        self.touch();
        self.turns
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn history_cap(&self) -> usize {
        self.history.cap()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// 更新最后活动时间
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// 空闲时间是否已达到 `timeout`
    pub fn is_idle(&self, timeout: Duration) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.last_activity)
            .to_std()
            .unwrap_or(Duration::ZERO);
        elapsed >= timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let store = SessionStore::new("s1", 10);
        assert_eq!(store.id(), "s1");
        assert!(store.get_history().is_empty());
        assert_eq!(store.turns(), 0);
    }

    #[test]
    fn test_get_history_is_idempotent() {
        let mut store = SessionStore::new("s1", 10);
        store.append(Message::user("hi"));
        store.append(Message::assistant("hello", None));

        let first = store.get_history();
        let second = store.get_history();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_append_respects_cap() {
        let mut store = SessionStore::new("s1", 10);
        for i in 0..11 {
            store.append(Message::user(format!("m{}", i)));
        }
        let history = store.get_history();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].content, "m1");
        assert_eq!(history[9].content, "m10");
    }

    #[test]
    fn test_returned_history_is_a_copy() {
        let mut store = SessionStore::new("s1", 10);
        store.append(Message::user("a"));
        let mut copy = store.get_history();
        copy.clear();
        assert_eq!(store.get_history().len(), 1);
    }

    #[test]
    fn test_truncate_and_reset() {
        let mut store = SessionStore::new("s1", 10);
        for i in 0..5 {
            store.append(Message::user(format!("m{}", i)));
        }
        store.truncate_to(2);
        assert_eq!(store.get_history().len(), 2);

        store.begin_turn();
        store.reset();
        assert!(store.get_history().is_empty());
        assert_eq!(store.turns(), 0);
    }

    #[test]
    fn test_is_idle() {
        let store = SessionStore::new("s1", 10);
        assert!(store.is_idle(Duration::ZERO));
        assert!(!store.is_idle(Duration::from_secs(3600)));
    }
}
