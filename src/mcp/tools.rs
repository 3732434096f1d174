//! MCP tool listing built from the agent tool declarations.

use super::protocol::Tool;
use crate::tools::ToolSpec;

impl From<&ToolSpec> for Tool {
    fn from(spec: &ToolSpec) -> Self {
        Tool {
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            input_schema: spec.parameters.clone(),
        }
    }
}

/// Describe every tool in `specs` for `tools/list`.
pub fn describe(specs: &[ToolSpec]) -> Vec<Tool> {
    specs.iter().map(Tool::from).collect()
}
