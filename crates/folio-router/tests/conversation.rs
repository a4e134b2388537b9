//! End-to-end turns through the controller and the chat service with a scripted model.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use folio_core::agent::defaults::{default_agents, DEFAULT_SUBJECT, ROOT_AGENT};
use folio_core::{AgentRegistry, Role};
use folio_llm::LLMError;
use folio_router::{
    ChatService, CompletionBackend, CompletionRequest, ConversationController, KeywordRouting, ModelError,
    OutcomeKind,
};
use folio_session::{SessionManager, SessionManagerConfig, SessionStore};

/// Counts calls and replays scripted results, falling back to an echo of the last user message.
#[derive(Default)]
struct CountingBackend {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Result<String, ModelError>>>,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl CountingBackend {
    fn scripted(script: Vec<Result<String, ModelError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for CountingBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let last = request
            .history
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.seen.lock().unwrap().push(request);

        match self.script.lock().unwrap().pop_front() {
            Some(next) => next,
            None => Ok(format!("reply to {}", last)),
        }
    }
}

fn registry() -> Arc<AgentRegistry> {
    let agents = default_agents()
        .into_iter()
        .map(|a| a.for_subject(DEFAULT_SUBJECT))
        .collect();
    Arc::new(AgentRegistry::new(ROOT_AGENT, agents).unwrap())
}

fn controller(backend: Arc<CountingBackend>) -> ConversationController {
    ConversationController::new(registry(), backend)
}

const REFUSAL: &str = "I'm sorry, I can only answer questions about who Areeba Irfan can contact, \
how to meet them, what they do in their free time, their past experience, skills, \
and projects. Please ask a relevant question.";

#[tokio::test]
async fn greeting_is_answered_by_the_model() {
    let backend = Arc::new(CountingBackend::default());
    let controller = controller(backend.clone());
    let mut store = SessionStore::new("a", 10);

    let outcome = controller.handle_turn(&mut store, "hi").await;

    assert_eq!(outcome.kind, OutcomeKind::Answered);
    assert_eq!(outcome.text, "reply to hi");
    assert_eq!(backend.calls(), 1);

    let history = store.get_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "hi");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "reply to hi");
}

#[tokio::test]
async fn question_word_lets_off_topic_question_through() {
    let backend = Arc::new(CountingBackend::default());
    let controller = controller(backend.clone());
    let mut store = SessionStore::new("b", 10);

    let outcome = controller.handle_turn(&mut store, "what's the weather").await;

    assert_eq!(outcome.kind, OutcomeKind::Answered);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn irrelevant_message_is_refused_without_model_call() {
    let backend = Arc::new(CountingBackend::default());
    let controller = controller(backend.clone());
    let mut store = SessionStore::new("c", 10);

    let outcome = controller.handle_turn(&mut store, "xyz123").await;

    assert_eq!(outcome.kind, OutcomeKind::Refused);
    assert_eq!(outcome.text, REFUSAL);
    assert!(outcome.agent.is_none());
    assert_eq!(backend.calls(), 0);

    let history = store.get_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "xyz123");
    assert_eq!(history[1].content, REFUSAL);
}

#[tokio::test]
async fn empty_message_is_refused() {
    let backend = Arc::new(CountingBackend::default());
    let controller = controller(backend.clone());
    let mut store = SessionStore::new("c2", 10);

    let outcome = controller.handle_turn(&mut store, "   ").await;

    assert_eq!(outcome.kind, OutcomeKind::Refused);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn model_failure_becomes_error_reply_and_session_continues() {
    let backend = Arc::new(CountingBackend::scripted(vec![Err(ModelError::Provider(LLMError::Network(
        "connection reset".to_string(),
    )))]));
    let controller = controller(backend.clone());
    let mut store = SessionStore::new("d", 10);

    let failed = controller.handle_turn(&mut store, "what are her skills?").await;
    assert_eq!(failed.kind, OutcomeKind::Failed);
    assert!(failed
        .text
        .starts_with("an error occurred while processing your request: "));
    assert!(failed.text.contains("connection reset"));

    let history = store.get_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "what are her skills?");
    assert_eq!(history[1].content, failed.text);

    let next = controller.handle_turn(&mut store, "what projects?").await;
    assert_eq!(next.kind, OutcomeKind::Answered);
    assert_eq!(store.get_history().len(), 4);
}

#[tokio::test]
async fn long_session_keeps_only_the_latest_ten_messages() {
    let backend = Arc::new(CountingBackend::default());
    let controller = controller(backend.clone());
    let mut store = SessionStore::new("e", 10);

    for n in 1..=11 {
        let outcome = controller.handle_turn(&mut store, &format!("hi {}", n)).await;
        assert_eq!(outcome.turn, n as u64);
    }

    let history = store.get_history();
    assert_eq!(history.len(), 10);
    assert!(history.iter().all(|m| m.content != "hi 1"));
    assert_eq!(history[0].content, "hi 7");
    assert_eq!(history[9].content, "reply to hi 11");

    let seen = backend.seen.lock().unwrap();
    assert!(seen.iter().all(|r| r.history.len() <= 10));
}

#[tokio::test]
async fn keyword_routing_picks_topical_persona() {
    let backend = Arc::new(CountingBackend::default());
    let controller = controller(backend.clone()).with_routing(Arc::new(KeywordRouting));
    let mut store = SessionStore::new("f", 10);

    let outcome = controller.handle_turn(&mut store, "tell me about your projects").await;

    assert_eq!(outcome.agent.as_deref(), Some("projects_agent"));
    let seen = backend.seen.lock().unwrap();
    assert!(seen[0].instructions.contains("Areeba Irfan"));
    assert_eq!(seen[0].tools, vec!["fetch_profile".to_string()]);
}

#[tokio::test]
async fn service_keeps_sessions_apart() {
    let backend = Arc::new(CountingBackend::default());
    let service = ChatService::new(
        Arc::new(controller(backend.clone())),
        Arc::new(SessionManager::new(SessionManagerConfig::default())),
    );

    let (first, greeting) = service.open_session().await.unwrap();
    let (second, _) = service.open_session().await.unwrap();
    assert_ne!(first, second);
    assert_eq!(greeting, "Hello! I'm the Areeba Irfan Agent. How can I assist you?");

    service.send(&first, "hello").await.unwrap();
    service.send(&first, "xyz123").await.unwrap();
    service.send(&second, "hey").await.unwrap();

    assert_eq!(service.history(&first).await.unwrap().len(), 4);
    assert_eq!(service.history(&second).await.unwrap().len(), 2);

    service.close_session(&first).unwrap();
    assert!(service.send(&first, "hello").await.is_err());
    assert!(service.history(&second).await.is_ok());
}

#[tokio::test]
async fn turn_waiting_on_a_closed_session_is_not_applied() {
    let backend = Arc::new(CountingBackend::default());
    let service = Arc::new(ChatService::new(
        Arc::new(controller(backend.clone())),
        Arc::new(SessionManager::new(SessionManagerConfig::default())),
    ));
    let (id, _) = service.open_session().await.unwrap();

    let handle = service.sessions().get(&id).unwrap();
    let guard = handle.lock().await;

    let pending = tokio::spawn({
        let service = Arc::clone(&service);
        let id = id.clone();
        async move { service.send(&id, "hello").await }
    });
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    service.close_session(&id).unwrap();
    drop(guard);

    let result = pending.await.unwrap();
    assert!(result.is_err());
    assert_eq!(backend.calls(), 0);
    assert!(handle.lock().await.get_history().is_empty());
}
