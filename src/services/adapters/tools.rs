//! Neutral tool definitions → DeepSeek function tools
//!
//! Only function tools exist in this API family.

use serde_json::json;

use super::{FunctionDefinition, FunctionTool};
use crate::services::ToolDefinition;

/// Convert one tool definition
#[must_use]
pub fn convert_tool(tool: &ToolDefinition) -> FunctionTool {
    FunctionTool {
        tool_type: "function".to_string(),
        function: FunctionDefinition {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone().unwrap_or_else(|| {
                json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                })
            }),
        },
    }
}

/// Convert a tool list, preserving order
#[must_use]
pub fn convert_tools(tools: &[ToolDefinition]) -> Vec<FunctionTool> {
    tools.iter().map(convert_tool).collect()
}
