//! Tool execution implementation

use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;
use crate::types::ToolContract;
use async_trait::async_trait;
use folio_core::types::{ToolCall, ToolDefinition, ToolResult};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Trait for executing tool calls requested by the model
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Model-facing definitions for the named tools
    fn definitions(&self, names: &[&str]) -> Result<Vec<ToolDefinition>>;

    /// Execute a call; failures are reported inside the result
    async fn run(&self, call: &ToolCall) -> ToolResult;
}

/// Default tool executor with configurable timeout
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<dyn ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    /// Create a new executor with default settings
    pub fn new(registry: Arc<dyn ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set execution timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn registry(&self) -> &Arc<dyn ToolRegistry> {
        &self.registry
    }

    /// Validate arguments against the contract and fill in defaults
    pub fn validate_args(&self, contract: &ToolContract, arguments: &Value) -> Result<Map<String, Value>> {
        let mut args = match arguments {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::InvalidArgument(format!(
                    "expected an object of arguments, got {}",
                    other
                )))
            }
        };

        for arg_def in &contract.args {
            let provided = args.get(&arg_def.name).filter(|v| !v.is_null()).cloned();
            match provided {
                None => {
                    if let Some(default) = &arg_def.default {
                        args.insert(arg_def.name.clone(), default.clone());
                    } else if arg_def.required {
                        return Err(ToolError::MissingArgument(arg_def.name.clone()));
                    } else {
                        args.remove(&arg_def.name);
                    }
                }
                Some(value) => {
                    if !arg_def.arg_type.matches(&value) {
                        return Err(ToolError::TypeMismatch {
                            name: arg_def.name.clone(),
                            expected: arg_def.arg_type.to_string(),
                            actual: value.to_string(),
                        });
                    }
                    if !arg_def.choices.is_empty() && !arg_def.choices.contains(&value) {
                        return Err(ToolError::InvalidArgument(format!(
                            "{} must be one of {}",
                            arg_def.name,
                            Value::Array(arg_def.choices.clone())
                        )));
                    }
                }
            }
        }

        Ok(args)
    }

    /// Execute a call, surfacing failures as errors
    pub async fn execute(&self, call: &ToolCall) -> Result<Value> {
        let tool = self
            .registry
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let args = self.validate_args(tool.contract(), &call.arguments)?;

        match timeout(self.timeout, tool.call(args)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout(self.timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl ToolRunner for ToolExecutor {
    fn definitions(&self, names: &[&str]) -> Result<Vec<ToolDefinition>> {
        names
            .iter()
            .map(|name| {
                self.registry
                    .get(name)
                    .map(|tool| tool.contract().to_definition())
                    .ok_or_else(|| ToolError::NotFound(name.to_string()))
            })
            .collect()
    }

    async fn run(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();
        let outcome = self.execute(call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(value) => {
                tracing::debug!(tool = %call.name, duration_ms, "tool call succeeded");
                match value {
                    Value::String(text) => ToolResult::Output(text),
                    other => ToolResult::Output(other.to_string()),
                }
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, duration_ms, error = %e, "tool call failed");
                ToolResult::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryToolRegistry;
    use crate::types::{ArgDef, ArgType, Tool};
    use serde_json::json;

    struct SectionTool {
        contract: ToolContract,
        delay: Duration,
    }

    impl SectionTool {
        fn new(delay: Duration) -> Arc<dyn Tool> {
            Arc::new(Self {
                contract: ToolContract::new("section", "Return the requested section").with_arg(
                    ArgDef::optional("section", ArgType::String)
                        .with_choices(["all", "skills"])
                        .with_default(json!("all")),
                ),
                delay,
            })
        }
    }

    #[async_trait]
    impl Tool for SectionTool {
        fn contract(&self) -> &ToolContract {
            &self.contract
        }

        async fn call(&self, args: Map<String, Value>) -> Result<Value> {
            tokio::time::sleep(self.delay).await;
            match args["section"].as_str() {
                Some("skills") => Ok(json!(["rust"])),
                Some(other) => Err(ToolError::failed("section", format!("{} unavailable", other))),
                None => Err(ToolError::MissingArgument("section".to_string())),
            }
        }
    }

    fn executor(delay: Duration) -> ToolExecutor {
        ToolExecutor::new(Arc::new(InMemoryToolRegistry::with_tools(vec![SectionTool::new(delay)])))
    }

    #[tokio::test]
    async fn test_run_success() {
        let executor = executor(Duration::ZERO);
        let call = ToolCall::new("c1", "section", json!({"section": "skills"}));

        let result = executor.run(&call).await;
        assert!(result.is_success());
        assert_eq!(result.text(), "[\"rust\"]");
    }

    #[tokio::test]
    async fn test_default_is_applied() {
        let executor = executor(Duration::ZERO);
        let call = ToolCall::new("c1", "section", Value::Null);

        let err = executor.execute(&call).await.unwrap_err();
        assert!(err.to_string().contains("all unavailable"));
    }

    #[tokio::test]
    async fn test_choice_is_enforced() {
        let executor = executor(Duration::ZERO);
        let call = ToolCall::new("c1", "section", json!({"section": "weather"}));

        assert!(matches!(executor.execute(&call).await, Err(ToolError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let executor = executor(Duration::ZERO);
        let call = ToolCall::new("c1", "section", json!({"section": 3}));

        assert!(matches!(executor.execute(&call).await, Err(ToolError::TypeMismatch { .. })));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_result() {
        let executor = executor(Duration::ZERO);
        let call = ToolCall::new("c1", "weather", json!({}));

        let result = executor.run(&call).await;
        assert_eq!(result, ToolResult::Failed("Tool not found: weather".to_string()));
    }

    #[tokio::test]
    async fn test_timeout() {
        let executor = executor(Duration::from_millis(200)).with_timeout(Duration::from_millis(10));
        let call = ToolCall::new("c1", "section", json!({"section": "skills"}));

        assert!(matches!(executor.execute(&call).await, Err(ToolError::Timeout(10))));
    }

    #[test]
    fn test_definitions() {
        let executor = executor(Duration::ZERO);
        let defs = executor.definitions(&["section"]).unwrap();
        assert_eq!(defs[0].name, "section");
        assert!(executor.definitions(&["missing"]).is_err());
    }
}
