use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AttemptError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(rename = "github_link", default)]
    pub link: String,
}

/// The individual the assistant answers questions about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub bio: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub contact: Contact,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub hobbies: Vec<String>,
}

const REQUIRED_FIELDS: [&str; 3] = ["/name", "/bio", "/contact/email"];

impl Profile {
    /// Parse an endpoint body, rejecting bodies without the required fields.
    ///
    /// `name`, `bio` and `contact.email` must be present and non-blank. A body
    /// that has them but is otherwise the wrong shape is a decode failure.
    pub fn from_json(body: Value) -> Result<Self, AttemptError> {
        if !body.is_object() {
            return Err(AttemptError::Decode(format!("expected a JSON object, got {}", kind(&body))));
        }

        for pointer in REQUIRED_FIELDS {
            let present = body
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            if !present {
                let field = pointer.trim_start_matches('/').replace('/', ".");
                return Err(AttemptError::Validation(format!("missing required field '{}'", field)));
            }
        }

        serde_json::from_value(body).map_err(|e| AttemptError::Decode(e.to_string()))
    }

    /// The requested slice of the profile as JSON
    pub fn section(&self, section: Section) -> Value {
        match section {
            Section::All => json!(self),
            Section::Bio => json!({ "name": self.name, "bio": self.bio }),
            Section::Skills => json!({ "skills": self.skills }),
            Section::Projects => json!({ "projects": self.projects }),
            Section::Contact => json!({ "name": self.name, "contact": self.contact }),
            Section::Hobbies => json!({ "hobbies": self.hobbies }),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Part of the profile a caller is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    All,
    Bio,
    Skills,
    Projects,
    Contact,
    Hobbies,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::All,
        Section::Bio,
        Section::Skills,
        Section::Projects,
        Section::Contact,
        Section::Hobbies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::All => "all",
            Section::Bio => "bio",
            Section::Skills => "skills",
            Section::Projects => "projects",
            Section::Contact => "contact",
            Section::Hobbies => "hobbies",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == wanted)
            .ok_or_else(|| format!("unknown profile section '{}'", s))
    }
}

#[cfg(test)]
pub(crate) fn sample_json() -> Value {
    json!({
        "name": "Areeba Irfan",
        "bio": "Software engineer",
        "skills": ["Rust", "Python"],
        "contact": {"email": "areeba@example.com", "linkedin": "https://linkedin.com/in/areeba"},
        "projects": [{
            "id": 1,
            "name": "Portfolio agent",
            "description": "Answers questions about me",
            "technologies": ["Rust"],
            "github_link": "https://github.com/example/agent"
        }],
        "hobbies": ["reading"]
    })
}
