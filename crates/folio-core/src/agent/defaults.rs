//! Built-in texts and personas used when configuration leaves them out

use crate::agent::definition::AgentDefinition;

pub const DEFAULT_SUBJECT: &str = "Areeba Irfan";
pub const ROOT_AGENT: &str = "root";
pub const PROFILE_TOOL: &str = "fetch_profile";

pub const GREETING_TEMPLATE: &str = "Hello! I'm the {subject} Agent. How can I assist you?";

pub const REFUSAL_TEMPLATE: &str = "I'm sorry, I can only answer questions about who {subject} can contact, \
how to meet them, what they do in their free time, their past experience, skills, \
and projects. Please ask a relevant question.";

pub const ERROR_PREFIX: &str = "an error occurred while processing your request";

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "contact",
    "meet",
    "meeting",
    "free time",
    "hobby",
    "hobbies",
    "past experience",
    "experience",
    "skill",
    "skills",
    "project",
    "projects",
    "career",
    "who",
    "how",
    "what",
    "hi",
    "hello",
    "hey",
];

/// Replace every `{subject}` placeholder
pub fn render(template: &str, subject: &str) -> String {
    template.replace("{subject}", subject)
}

const ROOT_INSTRUCTIONS: &str = "You are the {subject} Agent, a helpful assistant restricted to answering questions about: \
who {subject} can contact for professional networking or collaborations, how to arrange a meeting with {subject}, \
what {subject} does in their free time, {subject}'s career history, technical or professional skills, \
and past or current projects. \
Route each question to the right specialist guidance: use skills_agent for skills, summary_agent for background \
and free time, projects_agent for projects and contact_agent for contact or meeting requests. \
Call the fetch_profile tool to look up current profile data instead of guessing. \
Politely decline any question outside these topics.";

const SKILLS_INSTRUCTIONS: &str = "You are skills_agent. List {subject}'s technical and professional skills \
from the profile data, grouped where it helps. Do not invent skills that are not in the profile.";

const SUMMARY_INSTRUCTIONS: &str = "You are summary_agent. Give a short summary of who {subject} is, \
their background and what they enjoy in their free time, based on the profile bio and hobbies.";

const PROJECTS_INSTRUCTIONS: &str = "You are projects_agent. Describe {subject}'s projects: name, \
what it does, the technologies used and the repository link when there is one.";

const CONTACT_INSTRUCTIONS: &str = "You are contact_agent. Explain how to reach or meet {subject} using \
the contact details in the profile. Never make up an address or handle.";

/// Root persona plus the four topical personas, all bound to the profile tool.
///
/// Instructions still contain `{subject}`; render them before use.
pub fn default_agents() -> Vec<AgentDefinition> {
    vec![
        AgentDefinition::new(ROOT_AGENT, ROOT_INSTRUCTIONS).with_tool(PROFILE_TOOL),
        AgentDefinition::new("skills_agent", SKILLS_INSTRUCTIONS)
            .with_tool(PROFILE_TOOL)
            .with_keywords(["skill", "skills", "expertise", "technolog", "stack"]),
        AgentDefinition::new("summary_agent", SUMMARY_INSTRUCTIONS)
            .with_tool(PROFILE_TOOL)
            .with_keywords(["who is", "about", "bio", "background", "career", "experience", "free time", "hobby", "hobbies"]),
        AgentDefinition::new("projects_agent", PROJECTS_INSTRUCTIONS)
            .with_tool(PROFILE_TOOL)
            .with_keywords(["project", "projects", "portfolio", "built", "github"]),
        AgentDefinition::new("contact_agent", CONTACT_INSTRUCTIONS)
            .with_tool(PROFILE_TOOL)
            .with_keywords(["contact", "meet", "meeting", "email", "linkedin", "reach"]),
    ]
}
