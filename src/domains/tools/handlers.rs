//! Tool handler trait and result helpers.

use rmcp::model::{CallToolResult, Content, JsonObject, RawContent};
use tracing::warn;

use super::error::ToolError;
use crate::core::CallContext;

/// Trait implemented by every tool.
///
/// Handlers receive arguments that already passed descriptor validation and
/// the context of the current call. They return a tool result for expected
/// outcomes (including reportable failures) and a [`ToolError`] only for
/// faults.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool.
    async fn call(
        &self,
        arguments: JsonObject,
        context: CallContext,
    ) -> Result<CallToolResult, ToolError>;
}

/// Create a success result with a single text block.
pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Create an error result with a single text block.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Text of the first content block, if it is text.
pub fn first_text(result: &CallToolResult) -> Option<&str> {
    match &result.content.first()?.raw {
        RawContent::Text(text) => Some(text.text.as_str()),
        _ => None,
    }
}
