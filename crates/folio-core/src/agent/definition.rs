use serde::{Deserialize, Serialize};

/// Reference to a tool an agent is allowed to call, by registered name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolRef(String);

impl ToolRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToolRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persona the completion provider answers as.
///
/// Definitions are plain data: the instruction text and the tools it may call.
/// `keywords` are only consulted by deterministic routing; the model never
/// sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub instructions: String,
    #[serde(default)]
    pub tools: Vec<ToolRef>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            tools: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tools.push(ToolRef::new(tool));
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Substitute `{subject}` in the instruction text
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.instructions = crate::agent::defaults::render(&self.instructions, subject);
        self
    }

    pub fn uses_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }
}
