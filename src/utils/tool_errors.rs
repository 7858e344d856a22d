use crate::errors::{McpError, ToolError};
use crate::utils::suggest::suggest;

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn unknown_action_error(area: &str, action: &str, known_actions: &[&str]) -> ToolError {
    let known = to_owned_list(known_actions);
    let suggestions = suggest(action, &known, 3);
    let mut hint = format!("Use one of: {}.", known.join(", "));
    if !suggestions.is_empty() {
        hint = format!("Did you mean: {}? {}", suggestions.join(", "), hint);
    }
    ToolError::invalid_params(format!("Unknown {} action: {}", area, action))
        .with_hint(hint)
        .with_details(serde_json::json!({
            "known_actions": known,
            "did_you_mean": suggestions,
        }))
}

pub fn unknown_tool_error(name: &str, known_tools: &[String]) -> McpError {
    let suggestions = suggest(name, known_tools, 3);
    let mut lines = vec![format!("Unknown tool: {}", name)];
    if !suggestions.is_empty() {
        lines.push(format!("Did you mean: {}?", suggestions.join(", ")));
    }
    lines.push(format!("Available tools: {}.", known_tools.join(", ")));
    McpError::invalid_params(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_error_lists_suggestions() {
        let known = vec!["whoami".to_string(), "get_clusters".to_string()];
        let err = unknown_tool_error("who_am_i", &known);
        assert!(err.message.contains("Did you mean: whoami?"));
        assert!(err.message.contains("Available tools: whoami, get_clusters."));
    }

    #[test]
    fn unknown_action_error_suggests_close_actions() {
        let err = unknown_action_error("clusters", "get_clustr", &["get_cluster", "create_cluster"]);
        assert_eq!(err.code, "INVALID_PARAMS");
        assert!(err
            .hint
            .as_deref()
            .unwrap_or("")
            .starts_with("Did you mean: get_cluster?"));
    }
}
