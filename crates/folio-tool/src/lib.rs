//! folio-tool - Model-invocable tools for the folio assistant
//!
//! This crate provides:
//! - Argument contracts and their JSON schema form
//! - The `Tool` trait implemented by concrete capabilities
//! - Tool registry for managing available tools
//! - An executor that validates arguments and bounds execution time

pub mod error;
pub mod executor;
pub mod registry;
pub mod types;

pub use error::{ToolError, Result};
pub use executor::{ToolExecutor, ToolRunner};
pub use registry::{InMemoryToolRegistry, ToolRegistry};
pub use types::{ArgDef, ArgType, Tool, ToolContract};

/// Re-export async_trait for implementers
pub use async_trait::async_trait;
