use crate::constants::paths;
use crate::errors::ToolError;
use crate::services::context::InvocationContext;
use crate::services::dispatcher::{ApiRequest, Dispatcher};
use crate::services::logger::Logger;
use crate::services::tool_executor::ToolHandler;
use crate::utils::tool_errors::unknown_action_error;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const ACCOUNT_TOOLS: &[&str] = &["whoami"];

#[derive(Clone)]
pub struct AccountsManager {
    logger: Logger,
    dispatcher: Arc<Dispatcher>,
}

impl AccountsManager {
    pub fn new(logger: Logger, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            logger: logger.child("accounts"),
            dispatcher,
        }
    }

    pub async fn handle_action(
        &self,
        tool: &str,
        _args: Value,
        ctx: &InvocationContext,
    ) -> Result<Value, ToolError> {
        match tool {
            "whoami" => self.whoami(ctx).await,
            _ => Err(unknown_action_error("accounts", tool, ACCOUNT_TOOLS)),
        }
    }

    async fn whoami(&self, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let url = self.dispatcher.config().api_url(paths::CURRENT_ACCOUNT);
        let data = self.dispatcher.dispatch(ctx, &ApiRequest::get(url)).await?;
        let text = match data.get("username").and_then(Value::as_str) {
            Some(username) => username.to_string(),
            None => {
                self.logger.warn("current_account response has no username", None);
                "Failed to fetch whoami data.".to_string()
            }
        };
        Ok(Value::String(text))
    }
}

#[async_trait]
impl ToolHandler for AccountsManager {
    async fn handle(
        &self,
        tool: &str,
        args: Value,
        ctx: &InvocationContext,
    ) -> Result<Value, ToolError> {
        self.handle_action(tool, args, ctx).await
    }
}
