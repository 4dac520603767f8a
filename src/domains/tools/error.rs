//! Tool-specific error types.

use rmcp::ErrorData as McpError;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur during tool registration and dispatch.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// A tool with this name is already registered.
    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    /// An input field failed schema validation.
    #[error("Invalid arguments: field '{field}' {reason}")]
    InvalidArguments { field: String, reason: String },

    /// The tool handler hit an unexpected fault.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error for a single field.
    pub fn invalid_arguments(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the call was rejected before reaching a handler.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidArguments { .. })
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let message = err.to_string();
        match err {
            ToolError::NotFound(name) => {
                McpError::invalid_params(message, Some(json!({ "tool": name })))
            }
            ToolError::InvalidArguments { field, reason } => McpError::invalid_params(
                message,
                Some(json!({ "field": field, "reason": reason })),
            ),
            ToolError::AlreadyRegistered(_)
            | ToolError::ExecutionFailed(_)
            | ToolError::Internal(_) => McpError::internal_error(message, None),
        }
    }
}
