pub mod context;
pub mod credentials;
pub mod dispatcher;
pub mod logger;
pub mod token_exchange;
pub mod tool_executor;
pub mod validation;
