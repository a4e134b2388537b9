use std::sync::Arc;

use async_trait::async_trait;
use folio_tool::{ArgDef, ArgType, Tool, ToolContract, ToolError};
use serde_json::{json, Map, Value};

use crate::fetcher::ProfileSource;
use crate::types::Section;

pub const FETCH_PROFILE_TOOL: &str = "fetch_profile";

/// Exposes the profile source to the completion provider as `fetch_profile`
pub struct ProfileTool {
    source: Arc<dyn ProfileSource>,
    contract: ToolContract,
}

impl ProfileTool {
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        let sections: Vec<&str> = Section::ALL.iter().map(Section::as_str).collect();
        let contract = ToolContract::new(
            FETCH_PROFILE_TOOL,
            "Fetch the latest profile: name, bio, skills, contact details, projects and hobbies.",
        )
        .with_arg(
            ArgDef::optional("section", ArgType::String)
                .describe("Part of the profile to return")
                .with_choices(sections)
                .with_default(json!(Section::All.as_str())),
        );

        Self { source, contract }
    }
}

#[async_trait]
impl Tool for ProfileTool {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn call(&self, args: Map<String, Value>) -> folio_tool::Result<Value> {
        let section = match args.get("section").and_then(Value::as_str) {
            Some(raw) => raw.parse::<Section>().map_err(ToolError::InvalidArgument)?,
            None => Section::All,
        };

        let profile = self
            .source
            .fetch_profile()
            .await
            .map_err(|e| ToolError::failed(FETCH_PROFILE_TOOL, e))?;

        Ok(profile.section(section))
    }
}
