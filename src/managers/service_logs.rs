use crate::constants::paths;
use crate::errors::ToolError;
use crate::mcp::render::{is_blank, render_service_logs};
use crate::services::context::InvocationContext;
use crate::services::dispatcher::{ApiRequest, Dispatcher};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use crate::utils::tool_errors::unknown_action_error;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const SERVICE_LOG_TOOLS: &[&str] = &["get_clusters_logs"];

#[derive(Clone)]
pub struct ServiceLogsManager {
    logger: Logger,
    validation: Validation,
    dispatcher: Arc<Dispatcher>,
}

impl ServiceLogsManager {
    pub fn new(logger: Logger, validation: Validation, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            logger: logger.child("service_logs"),
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
            "get_clusters_logs" => self.cluster_logs(&args, ctx).await,
            _ => Err(unknown_action_error("service_logs", tool, SERVICE_LOG_TOOLS)),
        }
    }

    async fn cluster_logs(&self, args: &Value, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let cluster_id = self
            .validation
            .ensure_identifier(args.get("cluster_id"), "cluster_id")?;
        let mut query = Map::new();
        query.insert("cluster_id".to_string(), Value::String(cluster_id));
        let url = self.dispatcher.config().api_url(paths::CLUSTER_LOGS);
        let data = self
            .dispatcher
            .dispatch(ctx, &ApiRequest::get(url).with_data(query))
            .await?;
        if is_blank(&data) {
            self.logger.debug("service logs response was empty", None);
            return Ok(Value::String("No logs found or invalid response.".to_string()));
        }
        Ok(Value::String(render_service_logs(&data)))
    }
}

#[async_trait]
impl ToolHandler for ServiceLogsManager {
    async fn handle(
        &self,
        tool: &str,
        args: Value,
        ctx: &InvocationContext,
    ) -> Result<Value, ToolError> {
        self.handle_action(tool, args, ctx).await
    }
}
