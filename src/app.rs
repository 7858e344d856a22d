use crate::config::OcmConfig;
use crate::errors::ToolError;
use crate::managers::accounts::{AccountsManager, ACCOUNT_TOOLS};
use crate::managers::clusters::{ClustersManager, CLUSTER_TOOLS};
use crate::managers::service_logs::{ServiceLogsManager, SERVICE_LOG_TOOLS};
use crate::mcp::catalog::tool_catalog;
use crate::services::credentials::credential_source_for;
use crate::services::dispatcher::Dispatcher;
use crate::services::logger::Logger;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub config: Arc<OcmConfig>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every catalog tool needs a registered handler.".to_string())
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    fn register(
        handlers: &mut HashMap<String, Arc<dyn ToolHandler>>,
        tools: &[&str],
        handler: Arc<dyn ToolHandler>,
    ) {
        for tool in tools {
            handlers.insert((*tool).to_string(), handler.clone());
        }
    }

    pub fn initialize(config: Arc<OcmConfig>) -> Result<Self, ToolError> {
        let logger = Logger::with_level("ocm-mcp", config.log_level);
        let validation = Validation::new();

        let credentials = credential_source_for(config.clone());
        logger.info(
            "credential source selected",
            Some(&serde_json::json!({
                "transport": config.transport.to_string(),
                "mode": format!("{:?}", credentials.mode()),
                "api_base": config.api_base(),
            })),
        );
        let dispatcher = Arc::new(Dispatcher::new(logger.clone(), config.clone(), credentials));

        let accounts = Arc::new(AccountsManager::new(logger.clone(), dispatcher.clone()));
        let clusters = Arc::new(ClustersManager::new(
            logger.clone(),
            validation.clone(),
            dispatcher.clone(),
        ));
        let service_logs = Arc::new(ServiceLogsManager::new(
            logger.clone(),
            validation.clone(),
            dispatcher,
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        Self::register(&mut handlers, ACCOUNT_TOOLS, accounts);
        Self::register(&mut handlers, CLUSTER_TOOLS, clusters);
        Self::register(&mut handlers, SERVICE_LOG_TOOLS, service_logs);

        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));

        Ok(Self {
            logger,
            config,
            tool_executor,
        })
    }
}
