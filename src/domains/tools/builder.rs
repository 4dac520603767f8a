//! Registry builder - registers every tool the server exposes.

use super::definitions::QueryWeatherTool;
use super::error::ToolError;
use super::registry::ToolRegistry;
use crate::domains::amap::AmapClient;

/// Build the tool registry with all tools.
pub fn build_tool_registry(client: AmapClient) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(
        QueryWeatherTool::descriptor(),
        std::sync::Arc::new(QueryWeatherTool::new(client)),
    )?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_registry() {
        let client = AmapClient::with_base_url("http://localhost").unwrap();
        let registry = build_tool_registry(client).unwrap();
        assert_eq!(registry.names(), vec!["query_weather"]);

        let tools = registry.tools();
        assert_eq!(tools[0].input_schema["required"], serde_json::json!(["address"]));
    }
}
