//! # Session Manager
//!
//! 会话 ID 到会话状态的映射，负责创建、查找、关闭与空闲过期。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::error::{SessionError, SessionResult};
use crate::history::DEFAULT_HISTORY_CAP;
use crate::store::SessionStore;

/// 共享的会话句柄；互斥锁保证同一会话的轮次串行执行
pub type SessionHandle = Arc<Mutex<SessionStore>>;

/// SessionManager 配置
#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// 每个会话的历史容量
    pub history_cap: usize,
    /// 空闲超时，超过后会话被清理
    pub idle_timeout: Duration,
    /// 最大会话数
    pub max_sessions: usize,
    /// 清理间隔
    pub cleanup_interval: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            idle_timeout: Duration::from_secs(1800), // 30分钟空闲超时
            max_sessions: 1000,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl SessionManagerConfig {
    /// 设置历史容量
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    /// 设置空闲超时
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// 设置最大会话数
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// 设置清理间隔
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}

/// SessionManager
///
/// 会话之间没有共享的可变状态，每个会话各自持有一把锁。
#[derive(Debug)]
pub struct SessionManager {
    config: SessionManagerConfig,
    sessions: DashMap<String, SessionHandle>,
    /// 已占用的会话名额，在插入之前预留
    slots: AtomicUsize,
}

impl SessionManager {
    /// 创建新的 SessionManager
    pub fn new(config: SessionManagerConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            slots: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &SessionManagerConfig {
        &self.config
    }

    /// 创建会话（随机 ID）
    pub fn open(&self) -> SessionResult<(String, SessionHandle)> {
        let id = uuid::Uuid::new_v4().to_string();
        let handle = self.open_with_id(&id)?;
        Ok((id, handle))
    }

    /// 使用指定 ID 创建会话
    ///
    /// 名额预留和插入都是原子的，并发创建同一 ID 时只有一个成功。
    pub fn open_with_id(&self, id: &str) -> SessionResult<SessionHandle> {
        let limit = self.config.max_sessions;
        self.slots
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| (used < limit).then_some(used + 1))
            .map_err(|_| SessionError::LimitReached { limit })?;

        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(_) => {
                self.release_slots(1);
                Err(SessionError::SessionAlreadyExists { id: id.to_string() })
            }
            Entry::Vacant(entry) => {
                let handle = Arc::new(Mutex::new(SessionStore::new(id, self.config.history_cap)));
                entry.insert(Arc::clone(&handle));
                info!(session_id = %id, "session opened");
                Ok(handle)
            }
        }
    }

    fn release_slots(&self, count: usize) {
        self.slots.fetch_sub(count, Ordering::SeqCst);
    }

    /// 查找会话
    pub fn get(&self, id: &str) -> SessionResult<SessionHandle> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::SessionNotFound { id: id.to_string() })
    }

    /// 关闭会话，状态直接丢弃
    pub fn close(&self, id: &str) -> SessionResult<()> {
        match self.sessions.remove(id) {
            Some(_) => {
                self.release_slots(1);
                info!(session_id = %id, "session closed");
                Ok(())
            }
            None => Err(SessionError::SessionNotFound { id: id.to_string() }),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// 句柄是否仍是该 ID 当前登记的会话（可能已被关闭或过期清理）
    pub fn is_current(&self, id: &str, handle: &SessionHandle) -> bool {
        self.sessions
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), handle))
    }

    /// 当前会话数
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 清理空闲会话，返回清理数量
    ///
    /// 正在处理轮次的会话（锁被占用）不会被清理。
    pub fn cleanup_idle(&self) -> usize {
        let timeout = self.config.idle_timeout;
        let mut removed = 0;

        self.sessions.retain(|id, handle| match handle.try_lock() {
            Ok(store) if store.is_idle(timeout) => {
                debug!(session_id = %id, "evicting idle session");
                removed += 1;
                false
            }
            _ => true,
        });

        if removed > 0 {
            self.release_slots(removed);
            info!("Cleaned up {} idle sessions", removed);
        }
        removed
    }

    /// 启动后台清理任务；manager 被释放后任务自动退出
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            // 第一次 tick 立即返回
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(manager) => {
                        manager.cleanup_idle();
                    }
                    None => break,
                }
            }
        })
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionManagerConfig::default())
    }
}
