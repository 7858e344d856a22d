use crate::constants::{cluster_defaults, paths};
use crate::errors::ToolError;
use crate::mcp::render::{
    is_blank, render_addons, render_cluster, render_clusters, render_machine_pools,
};
use crate::services::context::InvocationContext;
use crate::services::dispatcher::{ApiRequest, Dispatcher};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_action_error;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const CLUSTER_TOOLS: &[&str] = &[
    "get_clusters",
    "get_cluster",
    "get_cluster_addons",
    "get_cluster_machine_pools",
    "create_cluster",
];

/// Parameters of a Classic OSD cluster on AWS.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSpec {
    pub name: String,
    pub region: String,
    pub multi_az: bool,
    pub nodes: u64,
    pub instance_type: String,
}

impl ClusterSpec {
    pub fn to_payload(&self) -> Map<String, Value> {
        let payload = serde_json::json!({
            "byoc": false,
            "name": self.name,
            "region": {"id": self.region},
            "nodes": {
                "compute": self.nodes,
                "compute_machine_type": {"id": self.instance_type},
            },
            "managed": true,
            "cloud_provider": {"id": cluster_defaults::CLOUD_PROVIDER},
            "multi_az": self.multi_az,
            "load_balancer_quota": 0,
            "storage_quota": {"unit": "B", "value": cluster_defaults::STORAGE_QUOTA_BYTES},
        });
        match payload {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Clone)]
pub struct ClustersManager {
    logger: Logger,
    validation: Validation,
    dispatcher: Arc<Dispatcher>,
}

impl ClustersManager {
    pub fn new(logger: Logger, validation: Validation, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            logger: logger.child("clusters"),
            validation,
            dispatcher,
        }
    }

    pub async fn handle_action(
        &self,
        tool: &str,
        args: Value,
        ctx: &InvocationContext,
    ) -> Result<Value, ToolError> {
        match tool {
            "get_clusters" => self.list_clusters(&args, ctx).await,
            "get_cluster" => self.get_cluster(&args, ctx).await,
            "get_cluster_addons" => self.list_addons(&args, ctx).await,
            "get_cluster_machine_pools" => self.list_machine_pools(&args, ctx).await,
            "create_cluster" => self.create_cluster(&args, ctx).await,
            _ => Err(unknown_action_error("clusters", tool, CLUSTER_TOOLS)),
        }
    }

    fn cluster_url(&self, cluster_id: &str, suffix: &str) -> String {
        self.dispatcher
            .config()
            .api_url(&format!("{}/{}{}", paths::CLUSTERS, cluster_id, suffix))
    }

    async fn list_clusters(&self, args: &Value, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let state = self
            .validation
            .ensure_optional_string(args.get("state"), "state")?;
        let mut request = ApiRequest::get(self.dispatcher.config().api_url(paths::CLUSTERS));
        if let Some(state) = state {
            let state = self
                .validation
                .ensure_identifier(Some(&Value::String(state)), "state")?;
            let mut query = Map::new();
            query.insert(
                "search".to_string(),
                Value::String(format!("state is '{}'", state)),
            );
            request = request.with_data(query);
        }
        let data = self.dispatcher.dispatch(ctx, &request).await?;
        Ok(Value::String(render_clusters(&data)))
    }

    async fn get_cluster(&self, args: &Value, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let cluster_id = self
            .validation
            .ensure_identifier(args.get("cluster_id"), "cluster_id")?;
        let url = self.cluster_url(&cluster_id, "");
        let data = self.dispatcher.dispatch(ctx, &ApiRequest::get(url)).await?;
        let has_id = data
            .get("id")
            .and_then(Value::as_str)
            .map(|id| !id.is_empty())
            .unwrap_or(false);
        if !has_id {
            self.logger.warn(
                "cluster response has no id",
                Some(&serde_json::json!({ "cluster_id": cluster_id })),
            );
            return Ok(Value::String("Failed to fetch cluster data.".to_string()));
        }
        Ok(Value::String(render_cluster(&data)))
    }

    async fn list_addons(&self, args: &Value, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let cluster_id = self
            .validation
            .ensure_identifier(args.get("cluster_id"), "cluster_id")?;
        let url = self.cluster_url(&cluster_id, "/addons");
        let data = self.dispatcher.dispatch(ctx, &ApiRequest::get(url)).await?;
        if is_blank(&data) {
            return Ok(Value::String("Failed to fetch addons data.".to_string()));
        }
        Ok(Value::String(render_addons(&data)))
    }

    async fn list_machine_pools(
        &self,
        args: &Value,
        ctx: &InvocationContext,
    ) -> Result<Value, ToolError> {
        let cluster_id = self
            .validation
            .ensure_identifier(args.get("cluster_id"), "cluster_id")?;
        let url = self.cluster_url(&cluster_id, "/machine_pools");
        let data = self.dispatcher.dispatch(ctx, &ApiRequest::get(url)).await?;
        if is_blank(&data) {
            return Ok(Value::String(
                "Failed to fetch machine pools data.".to_string(),
            ));
        }
        Ok(Value::String(render_machine_pools(&data)))
    }

    pub fn cluster_spec(&self, args: &Value) -> Result<ClusterSpec, ToolError> {
        Ok(ClusterSpec {
            name: self
                .validation
                .ensure_string(args.get("cluster_name"), "cluster_name")?,
            region: self
                .validation
                .ensure_optional_string(args.get("region"), "region")?
                .unwrap_or_else(|| cluster_defaults::REGION.to_string()),
            multi_az: self
                .validation
                .ensure_optional_bool(args.get("multi_az"), "multi_az", false)?,
            nodes: self.validation.ensure_positive_int(
                args.get("nodes"),
                "nodes",
                cluster_defaults::NODES,
            )?,
            instance_type: self
                .validation
                .ensure_optional_string(args.get("instance_type"), "instance_type")?
                .unwrap_or_else(|| cluster_defaults::INSTANCE_TYPE.to_string()),
        })
    }

    async fn create_cluster(&self, args: &Value, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let spec = self.cluster_spec(args)?;
        self.logger.info(
            "creating cluster",
            Some(&serde_json::json!({
                "name": spec.name,
                "region": spec.region,
                "nodes": spec.nodes,
                "multi_az": spec.multi_az,
            })),
        );
        let request = ApiRequest::post(self.dispatcher.config().api_url(paths::CLUSTERS))
            .with_data(spec.to_payload());
        Ok(self.dispatcher.dispatch(ctx, &request).await?)
    }
}

#[async_trait]
impl ToolHandler for ClustersManager {
    async fn handle(
        &self,
        tool: &str,
        args: Value,
        ctx: &InvocationContext,
    ) -> Result<Value, ToolError> {
        self.handle_action(tool, args, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OcmConfig, Transport};
    use crate::services::credentials::credential_source_for;
    use serde_json::json;

    fn manager() -> ClustersManager {
        let config = Arc::new(
            OcmConfig::new(
                "https://api.example.com",
                "https://sso.example.com/token",
                Transport::Stdio,
            )
            .unwrap(),
        );
        let logger = Logger::new("test");
        let dispatcher = Arc::new(Dispatcher::new(
            logger.clone(),
            config.clone(),
            credential_source_for(config),
        ));
        ClustersManager::new(logger, Validation::new(), dispatcher)
    }

    #[test]
    fn cluster_spec_applies_defaults() {
        let spec = manager()
            .cluster_spec(&json!({"cluster_name": "demo"}))
            .unwrap();
        assert_eq!(
            spec,
            ClusterSpec {
                name: "demo".to_string(),
                region: "us-east-1".to_string(),
                multi_az: false,
                nodes: 4,
                instance_type: "m5.xlarge".to_string(),
            }
        );
    }

    #[test]
    fn cluster_payload_matches_classic_osd_on_aws() {
        let spec = manager()
            .cluster_spec(&json!({
                "cluster_name": "demo",
                "region": "eu-west-1",
                "multi_az": true,
                "nodes": 9,
                "instance_type": "m5.2xlarge"
            }))
            .unwrap();
        assert_eq!(
            Value::Object(spec.to_payload()),
            json!({
                "byoc": false,
                "name": "demo",
                "region": {"id": "eu-west-1"},
                "nodes": {"compute": 9, "compute_machine_type": {"id": "m5.2xlarge"}},
                "managed": true,
                "cloud_provider": {"id": "aws"},
                "multi_az": true,
                "load_balancer_quota": 0,
                "storage_quota": {"unit": "B", "value": 107374182400u64},
            })
        );
    }

    #[test]
    fn cluster_spec_requires_a_name() {
        assert!(manager().cluster_spec(&json!({})).is_err());
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected_without_dispatch() {
        let err = manager()
            .handle_action("delete_cluster", json!({}), &InvocationContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, "INVALID_PARAMS");
    }
}
