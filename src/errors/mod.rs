mod mcp_error;
mod tool_error;

pub use mcp_error::{ErrorCode, McpError};
pub use tool_error::{ToolError, ToolErrorKind};

pub type ToolResult<T> = Result<T, ToolError>;
