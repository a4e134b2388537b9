use std::sync::Arc;

use async_trait::async_trait;
use folio_core::{ChatOptions, ChatRequest, ChatUsage, Message};
use folio_llm::LLMProvider;
use folio_tool::ToolRunner;
use tracing::{debug, info};

use crate::error::ModelError;

/// 交给补全协作者的一次请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// 选中的人设名称
    pub agent: String,
    /// 人设指令（系统提示）
    pub instructions: String,
    /// 允许模型调用的工具名
    pub tools: Vec<String>,
    /// 有界历史，最后一条是本轮用户消息
    pub history: Vec<Message>,
    /// 预取的资料（JSON 文本）
    pub context: Option<String>,
}

/// 补全协作者：输入指令与历史，输出最终文本
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError>;
}

/// 基于 `LLMProvider` 的补全实现，内部处理工具调用循环
pub struct LlmCompletion {
    provider: Arc<dyn LLMProvider>,
    tools: Arc<dyn ToolRunner>,
    model: Option<String>,
    options: ChatOptions,
    max_tool_rounds: usize,
}

impl LlmCompletion {
    pub fn new(provider: Arc<dyn LLMProvider>, tools: Arc<dyn ToolRunner>) -> Self {
        Self {
            provider,
            tools,
            model: None,
            options: ChatOptions::default(),
            max_tool_rounds: 4,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    fn system_prompt(request: &CompletionRequest) -> String {
        match &request.context {
            Some(context) => format!(
                "{}\n\nProfile data (JSON), fetched for this question:\n{}",
                request.instructions, context
            ),
            None => request.instructions.clone(),
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let tool_names: Vec<&str> = request.tools.iter().map(String::as_str).collect();
        let definitions = self.tools.definitions(&tool_names)?;
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string());

        let mut messages = Vec::with_capacity(request.history.len() + 1);
        messages.push(Message::system(Self::system_prompt(&request)));
        messages.extend(request.history.iter().cloned());

        let mut round = 0;
        let mut usage = ChatUsage::default();
        loop {
            let chat = ChatRequest::new(model.clone())
                .with_messages(messages.iter().cloned())
                .with_tools(definitions.clone())
                .with_options(self.options.clone());

            let response = self.provider.chat(chat).await?;
            usage.merge(&response.usage);

            if !response.has_tool_calls() {
                let text = response.text().trim();
                if text.is_empty() {
                    return Err(ModelError::EmptyOutput);
                }
                info!(
                    agent = %request.agent,
                    rounds = round,
                    chars = text.len(),
                    tokens = usage.total_tokens,
                    "completion finished"
                );
                return Ok(text.to_string());
            }

            if round >= self.max_tool_rounds {
                return Err(ModelError::ToolRoundsExhausted { rounds: round });
            }
            round += 1;

            debug!(round, calls = response.tool_calls.len(), "model requested tools");
            messages.push(response.message.clone());
            for call in &response.tool_calls {
                let result = self.tools.run(call).await;
                messages.push(Message::tool_result(&call.id, result.to_model_content()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{ChatResponse, Role, ToolCall, ToolDefinition, ToolResult};
    use folio_llm::{LLMError, ProviderCapabilities, ProviderMetadata};
    use std::sync::Mutex;

    struct ScriptedProvider {
        replies: Mutex<Vec<Result<ChatResponse, LLMError>>>,
        seen: Mutex<Vec<ChatRequest>>,
        metadata: ProviderMetadata,
    }

    impl ScriptedProvider {
        fn new(mut replies: Vec<Result<ChatResponse, LLMError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
                metadata: ProviderMetadata {
                    id: "scripted".to_string(),
                    name: "Scripted".to_string(),
                    capabilities: ProviderCapabilities::default(),
                },
            })
        }

        fn seen(&self) -> Vec<ChatRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        fn provider_id(&self) -> &str {
            "scripted"
        }

        fn metadata(&self) -> &ProviderMetadata {
            &self.metadata
        }

        fn default_model(&self) -> &str {
            "scripted-model"
        }

        async fn chat(&self, request: ChatRequest) -> folio_llm::Result<ChatResponse> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(LLMError::Network("script exhausted".to_string())))
        }

        async fn validate(&self) -> folio_llm::Result<()> {
            Ok(())
        }
    }

    struct FakeTools;

    #[async_trait]
    impl ToolRunner for FakeTools {
        fn definitions(&self, names: &[&str]) -> folio_tool::Result<Vec<ToolDefinition>> {
            Ok(names.iter().map(|n| ToolDefinition::new(*n, "fake", serde_json::json!({"type": "object"}))).collect())
        }

        async fn run(&self, call: &ToolCall) -> ToolResult {
            ToolResult::Output(format!("{{\"called\":\"{}\"}}", call.name))
        }
    }

    fn text(content: &str) -> Result<ChatResponse, LLMError> {
        Ok(ChatResponse::new("r", "m", Message::assistant(content, None)))
    }

    fn tool_call() -> Result<ChatResponse, LLMError> {
        Ok(ChatResponse::new("r", "m", Message::assistant("", None))
            .with_tool_calls(vec![ToolCall::new("call_1", "fetch_profile", serde_json::json!({}))]))
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            agent: "root".to_string(),
            instructions: "Be helpful".to_string(),
            tools: vec!["fetch_profile".to_string()],
            history: vec![Message::user("what skills?")],
            context: None,
        }
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let provider = ScriptedProvider::new(vec![text("  Rust and Python  ")]);
        let completion = LlmCompletion::new(provider.clone(), Arc::new(FakeTools));

        let answer = completion.complete(request()).await.unwrap();
        assert_eq!(answer, "Rust and Python");

        let seen = provider.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "scripted-model");
        assert_eq!(seen[0].messages[0].role, Role::System);
        assert_eq!(seen[0].messages[1].content, "what skills?");
        assert_eq!(seen[0].tools[0].name, "fetch_profile");
    }

    #[tokio::test]
    async fn test_tool_loop_feeds_results_back() {
        let provider = ScriptedProvider::new(vec![tool_call(), text("Rust")]);
        let completion = LlmCompletion::new(provider.clone(), Arc::new(FakeTools));

        assert_eq!(completion.complete(request()).await.unwrap(), "Rust");

        let seen = provider.seen();
        assert_eq!(seen.len(), 2);
        let second = &seen[1].messages;
        assert_eq!(second.len(), 4);
        assert!(second[2].has_tool_calls());
        assert_eq!(second[3].role, Role::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(second[3].content, "{\"called\":\"fetch_profile\"}");
    }

    #[tokio::test]
    async fn test_tool_rounds_are_bounded() {
        let provider = ScriptedProvider::new(vec![tool_call(), tool_call(), tool_call()]);
        let completion = LlmCompletion::new(provider.clone(), Arc::new(FakeTools)).with_max_tool_rounds(2);

        let err = completion.complete(request()).await.unwrap_err();
        assert!(matches!(err, ModelError::ToolRoundsExhausted { rounds: 2 }));
        assert_eq!(provider.seen().len(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_is_model_error() {
        let provider = ScriptedProvider::new(vec![Err(LLMError::Api {
            status: 503,
            message: "overloaded".to_string(),
        })]);
        let completion = LlmCompletion::new(provider, Arc::new(FakeTools));

        let err = completion.complete(request()).await.unwrap_err();
        assert_eq!(err.to_string(), "completion provider failed: api error: 503 - overloaded");
    }

    #[tokio::test]
    async fn test_empty_output_is_an_error() {
        let provider = ScriptedProvider::new(vec![text("   ")]);
        let completion = LlmCompletion::new(provider, Arc::new(FakeTools));

        assert!(matches!(completion.complete(request()).await, Err(ModelError::EmptyOutput)));
    }

    #[tokio::test]
    async fn test_context_is_embedded_in_system_prompt() {
        let provider = ScriptedProvider::new(vec![text("ok")]);
        let completion = LlmCompletion::new(provider.clone(), Arc::new(FakeTools)).with_model("custom");

        let mut req = request();
        req.tools.clear();
        req.context = Some("{\"name\":\"Ada\"}".to_string());
        completion.complete(req).await.unwrap();

        let seen = provider.seen();
        assert_eq!(seen[0].model, "custom");
        assert!(seen[0].tools.is_empty());
        assert!(seen[0].messages[0].content.ends_with("{\"name\":\"Ada\"}"));
    }
}
