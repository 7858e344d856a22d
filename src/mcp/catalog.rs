use crate::constants::cluster_defaults;
use crate::errors::{ErrorCode, McpError};
use crate::utils::suggest::suggest;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolDef {
    ToolDef {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn cluster_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "cluster_id": {"type": "string", "minLength": 1, "description": "OCM cluster id."}
        },
        "required": ["cluster_id"],
        "additionalProperties": false
    })
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    vec![
        tool(
            "whoami",
            "Username of the account the credentials belong to.",
            json!({"type": "object", "properties": {}, "additionalProperties": false}),
        ),
        tool(
            "get_clusters",
            "List clusters, optionally filtered by state (e.g. ready, installing, error).",
            json!({
                "type": "object",
                "properties": {
                    "state": {"type": "string", "description": "Cluster state to filter on."}
                },
                "additionalProperties": false
            }),
        ),
        tool(
            "get_cluster",
            "Details of a single cluster.",
            cluster_id_schema(),
        ),
        tool(
            "get_cluster_addons",
            "Add-ons installed on a cluster and their state.",
            cluster_id_schema(),
        ),
        tool(
            "get_cluster_machine_pools",
            "Machine pools of a cluster with replicas and instance type.",
            cluster_id_schema(),
        ),
        tool(
            "get_clusters_logs",
            "Service log entries recorded for a cluster.",
            cluster_id_schema(),
        ),
        tool(
            "create_cluster",
            "Create a Classic OSD cluster on AWS. Returns the created cluster.",
            json!({
                "type": "object",
                "properties": {
                    "cluster_name": {"type": "string", "minLength": 1},
                    "region": {"type": "string", "default": cluster_defaults::REGION},
                    "multi_az": {"type": "boolean", "default": false},
                    "nodes": {"type": "integer", "minimum": 1, "default": cluster_defaults::NODES},
                    "instance_type": {"type": "string", "default": cluster_defaults::INSTANCE_TYPE}
                },
                "required": ["cluster_name"],
                "additionalProperties": false
            }),
        ),
    ]
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn tool_names() -> Vec<String> {
    TOOL_CATALOG.iter().map(|tool| tool.name.clone()).collect()
}

pub fn list_tools() -> Value {
    json!({ "tools": tool_catalog() })
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let Some(tool) = tool_by_name(tool_name) else {
        return Ok(());
    };
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let message = format_schema_errors(tool_name, args, errors, &tool.input_schema);
        return Err(McpError::new(ErrorCode::InvalidParams, message));
    }
    Ok(())
}

fn format_schema_errors(
    tool_name: &str,
    args: &Value,
    errors: jsonschema::ErrorIterator,
    schema: &Value,
) -> String {
    let mut rendered = Vec::new();
    let mut did_you_means = Vec::new();

    for err in errors.take(10) {
        let instance_path = if err.instance_path.to_string().is_empty() {
            "(root)".to_string()
        } else {
            err.instance_path.to_string()
        };
        match &err.kind {
            jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
                let props: Vec<String> = schema
                    .get("properties")
                    .and_then(|v| v.as_object())
                    .map(|map| map.keys().cloned().collect())
                    .unwrap_or_default();
                for unknown in unexpected {
                    rendered.push(format!("{}: unknown field '{}'", instance_path, unknown));
                    let suggestions = suggest(unknown, &props, 3);
                    if !suggestions.is_empty() {
                        did_you_means.push(format!(
                            "field '{}': {}",
                            unknown,
                            suggestions.join(", ")
                        ));
                    }
                }
            }
            jsonschema::error::ValidationErrorKind::Required { property } => {
                let prop = property
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| property.to_string());
                rendered.push(format!(
                    "{}: missing required field '{}'",
                    instance_path, prop
                ));
            }
            jsonschema::error::ValidationErrorKind::Type { kind } => {
                rendered.push(format!(
                    "{}: expected {}",
                    instance_path,
                    format_type_kind(kind)
                ));
            }
            _ => {
                rendered.push(format!("{}: {}", instance_path, err));
            }
        }
    }

    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
    lines.extend(rendered.iter().map(|line| format!("- {}", line)));
    if !did_you_means.is_empty() {
        lines.push(format!("Did you mean: {}", did_you_means.join(" | ")));
    }
    if args.is_object() {
        lines.push(format!("Hint: tools/list shows the input schema of '{}'", tool_name));
    }
    lines.join("\n")
}

fn format_type_kind(kind: &jsonschema::error::TypeKind) -> String {
    match kind {
        jsonschema::error::TypeKind::Single(primitive) => primitive.to_string(),
        jsonschema::error::TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            if list.is_empty() {
                "unknown".to_string()
            } else {
                list.join(" | ")
            }
        }
    }
}
