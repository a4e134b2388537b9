use std::fmt;
use std::sync::Arc;

use folio_core::agent::defaults::{self, DEFAULT_SUBJECT, ERROR_PREFIX, GREETING_TEMPLATE, REFUSAL_TEMPLATE};
use folio_core::{AgentDefinition, AgentRegistry, Message};
use folio_profile::{ProfileSource, Section};
use folio_session::{SessionStore, DEFAULT_HISTORY_CAP};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn, Instrument};

use crate::completion::{CompletionBackend, CompletionRequest};
use crate::error::TurnError;
use crate::gate::{KeywordGate, RelevanceGate};
use crate::routing::{ModelRouting, RoutingStrategy};

/// 单轮状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Gating,
    Rejecting,
    Dispatching,
    Responding,
}

impl TurnState {
    /// Idle → Gating → (Rejecting | Dispatching → Responding) → Idle
    pub fn can_transition_to(self, next: TurnState) -> bool {
        use TurnState::*;
        matches!(
            (self, next),
            (Idle, Gating)
                | (Gating, Rejecting)
                | (Gating, Dispatching)
                | (Rejecting, Idle)
                | (Dispatching, Responding)
                | (Responding, Idle)
        )
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::Idle => "Idle",
            TurnState::Gating => "Gating",
            TurnState::Rejecting => "Rejecting",
            TurnState::Dispatching => "Dispatching",
            TurnState::Responding => "Responding",
        };
        f.write_str(name)
    }
}

struct TurnMachine {
    state: TurnState,
    trail: Vec<TurnState>,
}

impl TurnMachine {
    fn new() -> Self {
        Self {
            state: TurnState::Idle,
            trail: vec![TurnState::Idle],
        }
    }

    fn advance(&mut self, next: TurnState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid turn transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "turn state");
        self.state = next;
        self.trail.push(next);
    }
}

/// 资料的提供方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMode {
    /// 模型可以调用 fetch_profile 工具
    #[default]
    Tool,
    /// 每轮先取一次资料，作为上下文嵌入单次补全
    Prefetch,
}

/// 控制器使用的固定文本与参数
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    pub greeting: String,
    pub refusal: String,
    pub error_prefix: String,
    pub history_cap: usize,
    pub profile_mode: ProfileMode,
}

impl ControllerSettings {
    /// 用内置模板生成针对某个人的文本
    pub fn for_subject(subject: &str) -> Self {
        Self {
            greeting: defaults::render(GREETING_TEMPLATE, subject),
            refusal: defaults::render(REFUSAL_TEMPLATE, subject),
            error_prefix: ERROR_PREFIX.to_string(),
            history_cap: DEFAULT_HISTORY_CAP,
            profile_mode: ProfileMode::Tool,
        }
    }

    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    pub fn with_profile_mode(mut self, mode: ProfileMode) -> Self {
        self.profile_mode = mode;
        self
    }

    pub fn error_text(&self, cause: &dyn fmt::Display) -> String {
        format!("{}: {}", self.error_prefix, cause)
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::for_subject(DEFAULT_SUBJECT)
    }
}

/// 本轮结果的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Answered,
    Refused,
    Failed,
}

/// 每条输入消息恰好对应一个输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub text: String,
    pub kind: OutcomeKind,
    pub agent: Option<String>,
    pub turn: u64,
    #[serde(skip)]
    pub states: Vec<TurnState>,
}

/// 会话控制器
///
/// 串起 相关性判断 → 人设选择 → 补全调用 → 写回历史。
/// 任何失败都转成一条助手消息，不会让会话终止。
pub struct ConversationController {
    registry: Arc<AgentRegistry>,
    completion: Arc<dyn CompletionBackend>,
    gate: Arc<dyn RelevanceGate>,
    routing: Arc<dyn RoutingStrategy>,
    profile: Option<Arc<dyn ProfileSource>>,
    settings: ControllerSettings,
}

impl ConversationController {
    pub fn new(registry: Arc<AgentRegistry>, completion: Arc<dyn CompletionBackend>) -> Self {
        Self {
            registry,
            completion,
            gate: Arc::new(KeywordGate::default()),
            routing: Arc::new(ModelRouting),
            profile: None,
            settings: ControllerSettings::default(),
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn RelevanceGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_routing(mut self, routing: Arc<dyn RoutingStrategy>) -> Self {
        self.routing = routing;
        self
    }

    /// 预取模式下使用的资料来源
    pub fn with_profile_source(mut self, source: Arc<dyn ProfileSource>) -> Self {
        self.profile = Some(source);
        self
    }

    pub fn with_settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// 会话开始：清空历史并返回问候语（问候语不写入历史）
    pub fn start_session(&self, store: &mut SessionStore) -> String {
        store.reset();
        self.settings.greeting.clone()
    }

    /// 处理一条输入消息，总是返回一个输出
    pub async fn handle_turn(&self, store: &mut SessionStore, utterance: &str) -> TurnOutcome {
        let turn = store.begin_turn();
        let span = info_span!("turn", session_id = %store.id(), turn);
        self.run_turn(store, utterance, turn).instrument(span).await
    }

    async fn run_turn(&self, store: &mut SessionStore, utterance: &str, turn: u64) -> TurnOutcome {
        let mut machine = TurnMachine::new();
        machine.advance(TurnState::Gating);

        if !self.gate.is_relevant(utterance) {
            machine.advance(TurnState::Rejecting);
            let text = self.settings.refusal.clone();
            store.append(Message::user(utterance));
            store.append(Message::assistant(text.clone(), None));
            store.truncate_to(self.settings.history_cap);
            machine.advance(TurnState::Idle);

            return TurnOutcome {
                text,
                kind: OutcomeKind::Refused,
                agent: None,
                turn,
                states: machine.trail,
            };
        }

        machine.advance(TurnState::Dispatching);
        store.append(Message::user(utterance));
        store.truncate_to(self.settings.history_cap);

        let agent = self.routing.select(&self.registry, utterance);
        debug!(agent = %agent.name, routing = self.routing.name(), "persona selected");
        let result = self.dispatch(agent, store.get_history()).await;

        machine.advance(TurnState::Responding);
        let (text, kind) = match result {
            Ok(text) => (text, OutcomeKind::Answered),
            Err(e) => {
                warn!(agent = %agent.name, error = %e, "turn failed");
                (self.settings.error_text(&e), OutcomeKind::Failed)
            }
        };
        store.append(Message::assistant(text.clone(), None));
        store.truncate_to(self.settings.history_cap);
        machine.advance(TurnState::Idle);

        TurnOutcome {
            text,
            kind,
            agent: Some(agent.name.clone()),
            turn,
            states: machine.trail,
        }
    }

    async fn dispatch(&self, agent: &AgentDefinition, history: Vec<Message>) -> Result<String, TurnError> {
        let (tools, context) = match (self.settings.profile_mode, &self.profile) {
            (ProfileMode::Prefetch, Some(source)) if agent.uses_tools() => {
                let profile = source.fetch_profile().await?;
                (Vec::new(), Some(profile.section(Section::All).to_string()))
            }
            (ProfileMode::Prefetch, _) => (Vec::new(), None),
            (ProfileMode::Tool, _) => (
                agent.tools.iter().map(|t| t.name().to_string()).collect(),
                None,
            ),
        };

        let request = CompletionRequest {
            agent: agent.name.clone(),
            instructions: agent.instructions.clone(),
            tools,
            history,
            context,
        };

        Ok(self.completion.complete(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use async_trait::async_trait;
    use folio_profile::{AttemptError, FetchError, Profile};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBackend {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionBackend for RecordingBackend {
        async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
            let n = request.history.len();
            self.requests.lock().unwrap().push(request);
            Ok(format!("answer with {} messages", n))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ProfileSource for FailingSource {
        async fn fetch_profile(&self) -> Result<Profile, FetchError> {
            Err(FetchError::new(3, AttemptError::Status { status: 502, body: "bad gateway".to_string() }))
        }
    }

    struct StaticSource;

    #[async_trait]
    impl ProfileSource for StaticSource {
        async fn fetch_profile(&self) -> Result<Profile, FetchError> {
            Profile::from_json(serde_json::json!({
                "name": "Ada",
                "bio": "Engineer",
                "contact": {"email": "ada@example.com"}
            }))
            .map_err(|cause| FetchError::new(1, cause))
        }
    }

    fn registry() -> Arc<AgentRegistry> {
        Arc::new(
            AgentRegistry::new(
                "root",
                vec![AgentDefinition::new("root", "Answer about Ada").with_tool("fetch_profile")],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_transitions() {
        use TurnState::*;
        assert!(Idle.can_transition_to(Gating));
        assert!(Gating.can_transition_to(Rejecting));
        assert!(Rejecting.can_transition_to(Idle));
        assert!(!Rejecting.can_transition_to(Responding));
        assert!(!Idle.can_transition_to(Dispatching));
        assert!(!Responding.can_transition_to(Gating));
    }

    #[tokio::test]
    async fn test_dispatch_path_states_and_tools() {
        let backend = Arc::new(RecordingBackend::default());
        let controller = ConversationController::new(registry(), backend.clone());
        let mut store = SessionStore::new("s", 10);

        let outcome = controller.handle_turn(&mut store, "what projects?").await;
        assert_eq!(outcome.kind, OutcomeKind::Answered);
        assert_eq!(outcome.agent.as_deref(), Some("root"));
        assert_eq!(
            outcome.states,
            vec![TurnState::Idle, TurnState::Gating, TurnState::Dispatching, TurnState::Responding, TurnState::Idle]
        );

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].tools, vec!["fetch_profile".to_string()]);
        assert_eq!(requests[0].history.len(), 1);
        assert!(requests[0].context.is_none());
    }

    #[tokio::test]
    async fn test_reject_path_states() {
        let controller = ConversationController::new(registry(), Arc::new(RecordingBackend::default()));
        let mut store = SessionStore::new("s", 10);

        let outcome = controller.handle_turn(&mut store, "xyz123").await;
        assert_eq!(outcome.kind, OutcomeKind::Refused);
        assert_eq!(
            outcome.states,
            vec![TurnState::Idle, TurnState::Gating, TurnState::Rejecting, TurnState::Idle]
        );
    }

    #[tokio::test]
    async fn test_prefetch_embeds_profile() {
        let backend = Arc::new(RecordingBackend::default());
        let controller = ConversationController::new(registry(), backend.clone())
            .with_profile_source(Arc::new(StaticSource))
            .with_settings(ControllerSettings::default().with_profile_mode(ProfileMode::Prefetch));
        let mut store = SessionStore::new("s", 10);

        controller.handle_turn(&mut store, "who is Ada?").await;

        let requests = backend.requests.lock().unwrap();
        assert!(requests[0].tools.is_empty());
        assert!(requests[0].context.as_deref().unwrap().contains("ada@example.com"));
    }

    #[tokio::test]
    async fn test_prefetch_failure_becomes_error_response() {
        let backend = Arc::new(RecordingBackend::default());
        let controller = ConversationController::new(registry(), backend.clone())
            .with_profile_source(Arc::new(FailingSource))
            .with_settings(ControllerSettings::default().with_profile_mode(ProfileMode::Prefetch));
        let mut store = SessionStore::new("s", 10);

        let outcome = controller.handle_turn(&mut store, "what skills?").await;
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert_eq!(
            outcome.text,
            "an error occurred while processing your request: profile fetch failed after 3 attempt(s): \
endpoint returned status 502: bad gateway"
        );
        assert!(backend.requests.lock().unwrap().is_empty());
        assert_eq!(store.get_history().len(), 2);
    }

    #[tokio::test]
    async fn test_start_session_clears_history() {
        let controller = ConversationController::new(registry(), Arc::new(RecordingBackend::default()));
        let mut store = SessionStore::new("s", 10);
        controller.handle_turn(&mut store, "hi").await;

        let greeting = controller.start_session(&mut store);
        assert_eq!(greeting, "Hello! I'm the Areeba Irfan Agent. How can I assist you?");
        assert!(store.get_history().is_empty());
    }

    #[tokio::test]
    async fn test_controller_cap_smaller_than_store_cap() {
        let backend = Arc::new(RecordingBackend::default());
        let controller = ConversationController::new(registry(), backend.clone())
            .with_settings(ControllerSettings::default().with_history_cap(4));
        let mut store = SessionStore::new("s", 10);

        for _ in 0..5 {
            controller.handle_turn(&mut store, "hi").await;
        }
        assert_eq!(store.get_history().len(), 4);
        assert!(backend.requests.lock().unwrap().iter().all(|r| r.history.len() <= 4));
    }
}
