//! Plain-text renderings of OCM API responses.
//!
//! Every function is pure: it takes the JSON the dispatcher returned and
//! produces the text handed back to the agent. Missing fields render as
//! `N/A`; a response without an `items` list renders as a fixed message.

use serde_json::Value;

const NOT_AVAILABLE: &str = "N/A";

fn field(item: &Value, path: &[&str]) -> String {
    let mut current = item;
    for segment in path {
        match current.get(segment) {
            Some(next) => current = next,
            None => return NOT_AVAILABLE.to_string(),
        }
    }
    match current {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn items(data: &Value) -> Option<&Vec<Value>> {
    data.get("items")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
}

fn render_items(data: &Value, empty: &str, entry: impl Fn(&Value) -> String) -> String {
    match items(data) {
        Some(list) => list.iter().map(entry).collect::<Vec<_>>().join("\n"),
        None => empty.to_string(),
    }
}

/// No body, or an empty object: nothing worth rendering.
pub fn is_blank(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub fn render_clusters(data: &Value) -> String {
    render_items(data, "No clusters found or invalid response.", render_cluster)
}

pub fn render_cluster(cluster: &Value) -> String {
    format!(
        "Cluster: {}\n  ID: {}\n  API URL: {}\n  Console URL: {}\n  State: {}\n  Version: {}\n",
        field(cluster, &["name"]),
        field(cluster, &["id"]),
        field(cluster, &["api", "url"]),
        field(cluster, &["console", "url"]),
        field(cluster, &["state"]),
        field(cluster, &["openshift_version"]),
    )
}

pub fn render_service_logs(data: &Value) -> String {
    render_items(data, "No clusters found or invalid response.", |entry| {
        let description = entry
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("");
        format!(
            "  Cluster: {}\n  ID: {}\n  DESCRIPTION: {}\n",
            field(entry, &["service_name"]),
            field(entry, &["id"]),
            description,
        )
    })
}

pub fn render_addons(data: &Value) -> String {
    render_items(data, "No addons found or invalid response.", |addon| {
        format!(
            "Addon: {}\n  State: {}\n",
            field(addon, &["name"]),
            field(addon, &["state"]),
        )
    })
}

pub fn render_machine_pools(data: &Value) -> String {
    render_items(data, "No machine pools found or invalid response.", |pool| {
        format!(
            "Machine Pool: {}\n  Replicas: {}\n  Instance Type: {}\n",
            field(pool, &["id"]),
            field(pool, &["replicas"]),
            field(pool, &["instance_type"]),
        )
    })
}
