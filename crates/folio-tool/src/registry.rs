//! Tool registry for managing available tools

use crate::error::{Result, ToolError};
use crate::types::{Tool, ToolContract};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Trait for managing tool registry
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Register a new tool, replacing any tool with the same name
    async fn register(&self, tool: Arc<dyn Tool>) -> Result<()>;

    /// Unregister a tool by name
    async fn unregister(&self, name: &str) -> Result<()>;

    /// List the contracts of all registered tools
    fn list(&self) -> Vec<ToolContract>;

    /// Get a tool by name
    fn get(&self, name: &str) -> Option<Arc<dyn Tool>>;

    /// Check if a tool is registered
    fn contains(&self, name: &str) -> bool;

    /// Clear all registered tools
    fn clear(&self);
}

/// In-memory tool registry using DashMap for concurrent access
#[derive(Clone, Default)]
pub struct InMemoryToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn Tool>>>,
}

impl InMemoryToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: Arc::new(DashMap::new()),
        }
    }

    /// Create a registry with initial tools
    pub fn with_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let registry = Self::new();
        for tool in tools {
            registry.tools.insert(tool.name().to_string(), tool);
        }
        registry
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for InMemoryToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.tools.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("InMemoryToolRegistry").field("tools", &names).finish()
    }
}

#[async_trait]
impl ToolRegistry for InMemoryToolRegistry {
    async fn register(&self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::debug!(tool = %name, "replaced registered tool");
        }
        Ok(())
    }

    async fn unregister(&self, name: &str) -> Result<()> {
        if self.tools.remove(name).is_none() {
            return Err(ToolError::NotFound(name.to_string()));
        }
        Ok(())
    }

    fn list(&self) -> Vec<ToolContract> {
        let mut contracts: Vec<ToolContract> = self
            .tools
            .iter()
            .map(|entry| entry.value().contract().clone())
            .collect();
        contracts.sort_by(|a, b| a.name.cmp(&b.name));
        contracts
    }

    fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(entry.value()))
    }

    fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    fn clear(&self) {
        self.tools.clear();
    }
}
