//! # History
//!
//! 有界、有序的消息历史。

use std::collections::VecDeque;

use folio_core::Message;
use serde::{Deserialize, Serialize};

/// 默认历史容量
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// 有界消息历史
///
/// 任何修改之后长度都不超过 `cap`；溢出时先淘汰最旧的消息，
/// 保留下来的消息维持原有顺序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    cap: usize,
    messages: VecDeque<Message>,
}

impl History {
    /// 创建空历史，容量至少为 1
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            messages: VecDeque::with_capacity(cap + 1),
        }
    }

    /// 追加一条消息，返回被淘汰的消息（如果有）
    pub fn push(&mut self, message: Message) -> Option<Message> {
        self.messages.push_back(message);
        if self.messages.len() > self.cap {
            self.messages.pop_front()
        } else {
            None
        }
    }

    /// 只保留最近的 `n` 条
    pub fn truncate_to(&mut self, n: usize) -> usize {
        let excess = self.messages.len().saturating_sub(n);
        self.messages.drain(..excess);
        excess
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(history: &History) -> Vec<String> {
        history.iter().map(|m| m.content.clone()).collect()
    }

    #[test]
    fn test_length_is_min_of_previous_plus_one_and_cap() {
        let mut history = History::new(10);
        for i in 0..25 {
            let before = history.len();
            history.push(Message::user(format!("m{}", i)));
            assert_eq!(history.len(), (before + 1).min(10));
        }
    }

    #[test]
    fn test_fifo_eviction_keeps_most_recent_in_order() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.push(Message::user(format!("m{}", i)));
        }
        assert_eq!(contents(&history), vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_push_returns_evicted() {
        let mut history = History::new(1);
        assert!(history.push(Message::user("a")).is_none());
        let evicted = history.push(Message::user("b")).unwrap();
        assert_eq!(evicted.content, "a");
    }

    #[test]
    fn test_truncate_to() {
        let mut history = History::new(10);
        for i in 0..6 {
            history.push(Message::user(format!("m{}", i)));
        }
        assert_eq!(history.truncate_to(4), 2);
        assert_eq!(contents(&history), vec!["m2", "m3", "m4", "m5"]);
        assert_eq!(history.truncate_to(10), 0);
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let mut history = History::new(0);
        history.push(Message::user("a"));
        history.push(Message::user("b"));
        assert_eq!(history.cap(), 1);
        assert_eq!(contents(&history), vec!["b"]);
    }
}
