//! Tool layer: the agent-facing `manage_skills` tool over a skill repository, plus the registry
//! that binds native callables to skill scripts.

mod registry;
mod skill_tool;

use serde::{Deserialize, Serialize};

pub use registry::CallableRegistry;
pub use skill_tool::{SkillTool, SKILL_TOOL_ACTIONS, SKILL_TOOL_NAME};

/// Executes tool calls requested by a model. Implementations must be safe to share across threads.
pub trait ToolExecutor: Send + Sync {
    fn execute(&self, name: &str, args: &serde_json::Value) -> Result<String, String>;
}

/// Function-calling tool definition (`{"type": "function", "function": {...}}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub typ: String,
    pub function: ToolFunctionDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            typ: "function".to_string(),
            function: ToolFunctionDefinition {
                name: name.into(),
                description: Some(description.into()),
                parameters,
            },
        }
    }
}
