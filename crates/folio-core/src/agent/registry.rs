use std::collections::HashMap;

use thiserror::Error;

use crate::agent::definition::AgentDefinition;

/// Startup-time configuration problems with the agent set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("root agent '{0}' is not defined")]
    MissingRoot(String),

    #[error("agent '{0}' is defined more than once")]
    Duplicate(String),

    #[error("agent '{0}' has empty instructions")]
    EmptyInstructions(String),

    #[error("agent '{agent}' references unknown tool '{tool}'")]
    UnknownTool { agent: String, tool: String },
}

/// Immutable set of agent definitions, one of which is the root.
///
/// Built once at startup. Lookups preserve definition order.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    root: String,
    agents: Vec<AgentDefinition>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    pub fn new(
        root: impl Into<String>,
        agents: Vec<AgentDefinition>,
    ) -> Result<Self, RegistryError> {
        let root = root.into();
        let mut index = HashMap::with_capacity(agents.len());

        for (position, agent) in agents.iter().enumerate() {
            if agent.instructions.trim().is_empty() {
                return Err(RegistryError::EmptyInstructions(agent.name.clone()));
            }
            if index.insert(agent.name.clone(), position).is_some() {
                return Err(RegistryError::Duplicate(agent.name.clone()));
            }
        }

        if !index.contains_key(&root) {
            return Err(RegistryError::MissingRoot(root));
        }

        Ok(Self { root, agents, index })
    }

    pub fn get(&self, name: &str) -> Option<&AgentDefinition> {
        self.index.get(name).map(|&i| &self.agents[i])
    }

    pub fn root(&self) -> &AgentDefinition {
        // Presence of the root is checked in `new`.
        &self.agents[self.index[&self.root]]
    }

    /// Topical personas, i.e. everything except the root
    pub fn topical(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.iter().filter(move |a| a.name != self.root)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Fail if any agent binds a tool for which `is_known` returns false
    pub fn check_tools<F>(&self, is_known: F) -> Result<(), RegistryError>
    where
        F: Fn(&str) -> bool,
    {
        for agent in &self.agents {
            for tool in &agent.tools {
                if !is_known(tool.name()) {
                    return Err(RegistryError::UnknownTool {
                        agent: agent.name.clone(),
                        tool: tool.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
