use super::{ToolError, ToolErrorKind};
use serde::Serialize;
use std::fmt;

/// JSON-RPC error codes surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct McpError {
    pub code: ErrorCode,
    pub message: String,
}

impl McpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotFound, message)
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let message = match &err.hint {
            Some(hint) => format!("{}\nhint: {}", err.message, hint),
            None => err.message.clone(),
        };
        let code = match err.kind {
            ToolErrorKind::InvalidParams => ErrorCode::InvalidParams,
            ToolErrorKind::NotFound => ErrorCode::MethodNotFound,
            ToolErrorKind::Config | ToolErrorKind::Internal => ErrorCode::InternalError,
        };
        McpError::new(code, message)
    }
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for McpError {}
