pub mod openai;

pub use openai::OpenAiTransformer;

use folio_core::chat::{ChatRequest, ChatResponse};
use folio_core::types::ToolDefinition;
use serde_json::Value;

use crate::error::ConversionError;

/// Schema transformer trait for converting between internal and provider formats
pub trait SchemaTransformer: Send + Sync {
    /// Transform request to provider-specific format
    fn transform_request(&self, request: &ChatRequest) -> Result<Value, ConversionError>;

    /// Transform tool definitions to provider format
    fn transform_tools(&self, tools: &[ToolDefinition]) -> Result<Value, ConversionError>;

    /// Parse a complete response
    fn parse_response(&self, data: &Value) -> Result<ChatResponse, ConversionError>;
}
