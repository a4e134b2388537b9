pub mod message;
pub mod tool;

pub use message::{Message, Role, MessageId};
pub use tool::{ToolCall, ToolDefinition, ToolResult};
