mod dispatch_error;
mod mcp_error;
mod tool_error;

pub use dispatch_error::{DispatchError, DispatchStage};
pub use mcp_error::{ErrorCode, McpError};
pub use tool_error::{ToolError, ToolErrorKind};
