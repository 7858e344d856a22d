use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::ToolError;
use crate::services::context::InvocationContext;
use crate::services::logger::Logger;
use crate::utils::redact::redact_object;
use crate::utils::suggest::suggest;

use serde_json::Value;

/// One OCM area. `tool` is the catalog name the call arrived under.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(
        &self,
        tool: &str,
        args: Value,
        ctx: &InvocationContext,
    ) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_tool(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn execute(
        &self,
        tool: &str,
        args: Value,
        ctx: &InvocationContext,
    ) -> Result<Value, ToolError> {
        let Some(handler) = self.handlers.get(tool).cloned() else {
            let mut err = ToolError::not_found(format!("Unknown tool: {}", tool));
            let suggestions = suggest(tool, &self.tool_names(), 3);
            if !suggestions.is_empty() {
                err = err.with_hint(format!("Did you mean: {}?", suggestions.join(", ")));
            }
            return Err(err);
        };

        self.logger.debug(
            "tool call",
            Some(&serde_json::json!({
                "tool": tool,
                "args": redact_object(&args, 256),
                "session_id": ctx.session_id(),
            })),
        );
        let started = Instant::now();
        let result = handler.handle(tool, args, ctx).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => self.logger.info(
                "tool completed",
                Some(&serde_json::json!({ "tool": tool, "duration_ms": duration_ms })),
            ),
            Err(err) => self.logger.warn(
                "tool failed",
                Some(&serde_json::json!({
                    "tool": tool,
                    "code": err.code,
                    "stage": err.stage(),
                    "duration_ms": duration_ms,
                })),
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn handle(
            &self,
            tool: &str,
            args: Value,
            _ctx: &InvocationContext,
        ) -> Result<Value, ToolError> {
            Ok(serde_json::json!({ "tool": tool, "args": args }))
        }
    }

    fn executor() -> ToolExecutor {
        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("whoami".to_string(), Arc::new(Echo));
        ToolExecutor::new(Logger::new("test"), handlers)
    }

    #[tokio::test]
    async fn execute_routes_to_registered_handler() {
        let result = executor()
            .execute("whoami", serde_json::json!({}), &InvocationContext::new())
            .await
            .expect("handler result");
        assert_eq!(result["tool"], "whoami");
    }

    #[tokio::test]
    async fn execute_rejects_unknown_tools_with_hint() {
        let err = executor()
            .execute("whoamii", serde_json::json!({}), &InvocationContext::new())
            .await
            .unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.hint.as_deref(), Some("Did you mean: whoami?"));
    }
}
