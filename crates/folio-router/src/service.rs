use std::sync::Arc;

use folio_core::Message;
use folio_session::{SessionError, SessionManager};
use tracing::info;

use crate::controller::{ConversationController, TurnOutcome};
use crate::error::Result;

/// 多会话入口：会话 ID → 会话状态，每个会话一次只处理一轮
pub struct ChatService {
    controller: Arc<ConversationController>,
    sessions: Arc<SessionManager>,
}

impl ChatService {
    pub fn new(controller: Arc<ConversationController>, sessions: Arc<SessionManager>) -> Self {
        Self { controller, sessions }
    }

    /// 创建会话，返回 (会话 ID, 问候语)
    pub async fn open_session(&self) -> Result<(String, String)> {
        let (id, handle) = self.sessions.open()?;
        let greeting = {
            let mut store = handle.lock().await;
            self.controller.start_session(&mut store)
        };
        info!(session_id = %id, "session opened");
        Ok((id, greeting))
    }

    /// 在指定会话中处理一条消息
    pub async fn send(&self, session_id: &str, utterance: &str) -> Result<TurnOutcome> {
        let handle = self.sessions.get(session_id)?;
        let mut store = handle.lock().await;
        // 等锁期间会话可能已被关闭或过期清理
        if !self.sessions.is_current(session_id, &handle) {
            return Err(SessionError::SessionNotFound {
                id: session_id.to_string(),
            }
            .into());
        }
        store.touch();
        Ok(self.controller.handle_turn(&mut store, utterance).await)
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>> {
        let handle = self.sessions.get(session_id)?;
        let store = handle.lock().await;
        Ok(store.get_history())
    }

    pub fn close_session(&self, session_id: &str) -> Result<()> {
        self.sessions.close(session_id)?;
        info!(session_id = %session_id, "session closed");
        Ok(())
    }

    pub fn controller(&self) -> &Arc<ConversationController> {
        &self.controller
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }
}
