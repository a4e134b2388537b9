use folio_core::chat::{ChatRequest, ChatResponse, ChatUsage, FinishReason};
use folio_core::types::{Message, ToolCall, ToolDefinition};
use serde_json::{json, Value};

use crate::error::ConversionError;
use crate::transformer::SchemaTransformer;

/// OpenAI-compatible schema transformer
/// Works with OpenAI API and compatible endpoints such as Gemini's
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiTransformer;

impl OpenAiTransformer {
    /// Create a new OpenAI transformer
    pub fn new() -> Self {
        Self
    }

    /// Convert internal Message to OpenAI format
    fn convert_message(&self, msg: &Message) -> Value {
        let mut json = json!({
            "role": msg.role.to_string(),
        });

        // Assistant turns that only carry tool calls are sent with null content
        if msg.content.is_empty() && msg.has_tool_calls() {
            json["content"] = Value::Null;
        } else {
            json["content"] = json!(msg.content);
        }

        if let Some(tool_calls) = &msg.tool_calls {
            json["tool_calls"] = json!(tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": tc.arguments.to_string(),
                        }
                    })
                })
                .collect::<Vec<_>>());
        }

        if let Some(tool_call_id) = &msg.tool_call_id {
            json["tool_call_id"] = json!(tool_call_id);
        }

        json
    }

    fn parse_tool_call(&self, tc: &Value) -> Result<ToolCall, ConversionError> {
        let id = tc["id"]
            .as_str()
            .ok_or_else(|| ConversionError::MissingField("tool_calls.id".to_string()))?;
        let name = tc["function"]["name"]
            .as_str()
            .ok_or_else(|| ConversionError::MissingField("tool_calls.function.name".to_string()))?;

        let arguments = match &tc["function"]["arguments"] {
            Value::String(s) if s.trim().is_empty() => json!({}),
            Value::String(s) => serde_json::from_str(s).map_err(|e| {
                ConversionError::InvalidFormat(format!("arguments for {}: {}", name, e))
            })?,
            Value::Null => json!({}),
            other => other.clone(),
        };

        Ok(ToolCall::new(id, name, arguments))
    }
}

impl SchemaTransformer for OpenAiTransformer {
    fn transform_request(&self, request: &ChatRequest) -> Result<Value, ConversionError> {
        if request.model.is_empty() {
            return Err(ConversionError::MissingField("model".to_string()));
        }

        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| self.convert_message(m))
            .collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });

        if !request.tools.is_empty() {
            body["tools"] = self.transform_tools(&request.tools)?;
        }

        if let Some(temp) = request.options.temperature {
            body["temperature"] = json!(temp);
        }

        if let Some(max_tokens) = request.options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(top_p) = request.options.top_p {
            body["top_p"] = json!(top_p);
        }

        Ok(body)
    }

    fn transform_tools(&self, tools: &[ToolDefinition]) -> Result<Value, ConversionError> {
        let tools_json: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();

        Ok(json!(tools_json))
    }

    fn parse_response(&self, data: &Value) -> Result<ChatResponse, ConversionError> {
        if let Some(error) = data.get("error") {
            return Err(ConversionError::InvalidFormat(format!("provider error body: {}", error)));
        }

        let id = data["id"].as_str().unwrap_or_default().to_string();
        let model = data["model"].as_str().unwrap_or_default().to_string();

        let choice = data["choices"]
            .get(0)
            .ok_or_else(|| ConversionError::MissingField("choices".to_string()))?;

        let message_data = &choice["message"];
        if !message_data.is_object() {
            return Err(ConversionError::MissingField("choices[0].message".to_string()));
        }

        let content = message_data["content"].as_str().unwrap_or_default().to_string();

        let tool_calls: Vec<ToolCall> = match message_data["tool_calls"].as_array() {
            Some(arr) => arr
                .iter()
                .map(|tc| self.parse_tool_call(tc))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let usage_data = data.get("usage");
        let usage = ChatUsage {
            input_tokens: usage_data
                .and_then(|u| u["prompt_tokens"].as_u64())
                .unwrap_or(0) as u32,
            output_tokens: usage_data
                .and_then(|u| u["completion_tokens"].as_u64())
                .unwrap_or(0) as u32,
            total_tokens: usage_data
                .and_then(|u| u["total_tokens"].as_u64())
                .unwrap_or(0) as u32,
        };

        let finish_reason = choice["finish_reason"]
            .as_str()
            .map(FinishReason::parse)
            .unwrap_or(FinishReason::Stop);

        let has_calls = !tool_calls.is_empty();
        let message = Message::assistant(content, if has_calls { Some(tool_calls) } else { None });

        // Some compatible endpoints report "stop" even when tool calls are present
        let finish_reason = if has_calls { FinishReason::ToolCalls } else { finish_reason };

        Ok(ChatResponse::new(id, model, message)
            .with_usage(usage)
            .with_finish_reason(finish_reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_request() {
        let transformer = OpenAiTransformer::new();
        let request = ChatRequest::new("gemini-1.5-flash")
            .with_message(Message::system("Be brief"))
            .with_message(Message::user("Hello"))
            .temperature(0.7);

        let body = transformer.transform_request(&request).unwrap();
        assert_eq!(body["model"], "gemini-1.5-flash");
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 0.001, "temperature should be approximately 0.7, got {}", temp);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "Hello");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_transform_request_requires_model() {
        let transformer = OpenAiTransformer::new();
        let request = ChatRequest::new("");
        assert!(matches!(
            transformer.transform_request(&request),
            Err(ConversionError::MissingField(_))
        ));
    }

    #[test]
    fn test_tool_round_trip_messages() {
        let transformer = OpenAiTransformer::new();
        let call = ToolCall::new("call_1", "fetch_profile", json!({"section": "skills"}));
        let request = ChatRequest::new("m")
            .with_message(Message::assistant("", Some(vec![call])))
            .with_message(Message::tool_result("call_1", "{\"skills\":[]}"));

        let body = transformer.transform_request(&request).unwrap();
        let messages = body["messages"].as_array().unwrap();

        assert!(messages[0]["content"].is_null());
        assert_eq!(messages[0]["tool_calls"][0]["function"]["name"], "fetch_profile");
        assert_eq!(
            messages[0]["tool_calls"][0]["function"]["arguments"],
            "{\"section\":\"skills\"}"
        );
        assert_eq!(messages[1]["role"], "tool");
        assert_eq!(messages[1]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_transform_tools() {
        let transformer = OpenAiTransformer::new();
        let tools = vec![ToolDefinition::new(
            "fetch_profile",
            "Fetch the profile",
            json!({
                "type": "object",
                "properties": {}
            }),
        )];

        let result = transformer.transform_tools(&tools).unwrap();
        let arr = result.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["type"], "function");
        assert_eq!(arr[0]["function"]["name"], "fetch_profile");
    }

    #[test]
    fn test_parse_text_response() {
        let transformer = OpenAiTransformer::new();
        let data = json!({
            "id": "resp-1",
            "model": "gemini-1.5-flash",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi there"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
        });

        let response = transformer.parse_response(&data).unwrap();
        assert_eq!(response.text(), "Hi there");
        assert!(!response.has_tool_calls());
        assert_eq!(response.usage.total_tokens, 7);
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn test_parse_tool_call_response() {
        let transformer = OpenAiTransformer::new();
        let data = json!({
            "id": "resp-2",
            "model": "m",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "fetch_profile", "arguments": ""}
                    }]
                },
                "finish_reason": "stop"
            }]
        });

        let response = transformer.parse_response(&data).unwrap();
        assert!(response.has_tool_calls());
        assert_eq!(response.tool_calls[0].name, "fetch_profile");
        assert_eq!(response.tool_calls[0].arguments, json!({}));
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let transformer = OpenAiTransformer::new();
        let err = transformer.parse_response(&json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, ConversionError::MissingField(field) if field == "choices"));
    }

    #[test]
    fn test_parse_bad_tool_arguments() {
        let transformer = OpenAiTransformer::new();
        let data = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "c",
                        "function": {"name": "fetch_profile", "arguments": "{not json"}
                    }]
                }
            }]
        });

        assert!(matches!(
            transformer.parse_response(&data),
            Err(ConversionError::InvalidFormat(_))
        ));
    }
}
