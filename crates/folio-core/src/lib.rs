pub mod types;
pub mod chat;
pub mod agent;

pub use types::{Message, MessageId, Role, ToolCall, ToolDefinition, ToolResult};

pub use chat::{
    ChatRequest,
    ChatResponse,
    ChatOptions,
    ChatUsage,
    FinishReason,
};

pub use agent::{AgentDefinition, AgentRegistry, RegistryError, ToolRef};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
