//! Tool Registry - registration and dispatch for all tools.
//!
//! The registry is filled once at startup and read-only afterwards, so it can
//! be shared across concurrent calls behind an `Arc` without locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::model::{CallToolResult, JsonObject, Tool};
use tracing::{debug, instrument, warn};

use super::descriptor::ToolDescriptor;
use super::error::ToolError;
use super::handlers::ToolHandler;
use crate::core::CallContext;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Tool registry - maps tool names to descriptors and handlers.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor name.
    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ToolError> {
        if self.tools.contains_key(descriptor.name) {
            return Err(ToolError::AlreadyRegistered(descriptor.name.to_string()));
        }
        debug!("Registered tool: {}", descriptor.name);
        self.tools
            .insert(descriptor.name, RegisteredTool { descriptor, handler });
        Ok(())
    }

    /// Get all tool names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// Look up a descriptor by name.
    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|t| &t.descriptor)
    }

    /// Get all tools as Tool models (metadata).
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.values().map(|t| t.descriptor.to_tool()).collect()
    }

    /// Validate the arguments and run the named tool.
    ///
    /// Unknown names and schema violations are returned as errors without
    /// invoking any handler.
    #[instrument(skip(self, arguments, context))]
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        context: CallContext,
    ) -> Result<CallToolResult, ToolError> {
        let Some(tool) = self.tools.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::not_found(name));
        };

        let arguments = tool.descriptor.validate(arguments).inspect_err(|e| {
            warn!("Rejected call to {}: {}", name, e);
        })?;

        tool.handler.call(arguments, context).await
    }
}
