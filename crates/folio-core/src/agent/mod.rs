pub mod defaults;
pub mod definition;
pub mod registry;

pub use definition::{AgentDefinition, ToolRef};
pub use registry::{AgentRegistry, RegistryError};
