use crate::types::{Message, ToolCall};

/// Chat completion response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub message: Message,
    pub tool_calls: Vec<ToolCall>,
    pub usage: ChatUsage,
    pub finish_reason: FinishReason,
}

impl ChatResponse {
    /// Create a new response
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        message: Message,
    ) -> Self {
        let tool_calls = message.tool_calls.clone().unwrap_or_default();
        Self {
            id: id.into(),
            model: model.into(),
            message,
            tool_calls,
            usage: ChatUsage::default(),
            finish_reason: FinishReason::Stop,
        }
    }

    /// Add tool calls
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.message.tool_calls = if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls.clone())
        };
        self.tool_calls = tool_calls;
        self.finish_reason = FinishReason::ToolCalls;
        self
    }

    /// Set usage
    pub fn with_usage(mut self, usage: ChatUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Set finish reason
    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = reason;
        self
    }

    /// Get the text content
    pub fn text(&self) -> &str {
        self.message.text()
    }

    /// Check if the response has tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token counts reported by the provider; zero when it reports none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl ChatUsage {
    /// Fold in one more round of a multi-call turn
    pub fn merge(&mut self, other: &ChatUsage) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// Reason for finishing the generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Completed naturally
    Stop,
    /// Hit token limit
    Length,
    /// Tool calls were made
    ToolCalls,
    /// Content was filtered
    ContentFilter,
}

impl FinishReason {
    /// Convert from the provider's string form
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "length" => Self::Length,
            "tool_calls" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            _ => Self::Stop,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
