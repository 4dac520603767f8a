//! Weather lookup tool.
//!
//! Resolves an address to an administrative code with the geocode endpoint,
//! then fetches live weather for that code. The credential comes from the
//! call context, so the same handler serves both transports.

use rmcp::model::{CallToolResult, JsonObject};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::core::CallContext;
use crate::domains::amap::{AmapClient, AmapError, WeatherReport};
use crate::domains::tools::descriptor::{FieldSpec, ToolDescriptor};
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::{ToolHandler, error_result, text_result};

/// Text returned when the caller supplied no API key.
pub const MISSING_KEY_MESSAGE: &str = "api key is required";

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the weather query tool.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryWeatherParams {
    /// Address to look up.
    pub address: String,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Weather query tool - two-step geocode and weather lookup.
#[derive(Debug, Clone)]
pub struct QueryWeatherTool {
    client: AmapClient,
}

impl QueryWeatherTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "query_weather";

    /// Human-readable title.
    pub const TITLE: &'static str = "Query Weather Tool";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Query the live weather for a given address. \
         The address is geocoded first, then live weather is fetched for the matching \
         administrative area. Returns the upstream weather payload as JSON text.";

    pub fn new(client: AmapClient) -> Self {
        Self { client }
    }

    /// Descriptor used for registration and input validation.
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: Self::NAME,
            title: Self::TITLE,
            description: Self::DESCRIPTION,
            fields: vec![FieldSpec::required_string(
                "address",
                "Address to query the weather for",
            )],
        }
    }

    /// Execute the lookup for one address.
    ///
    /// Upstream failures that the caller can act on come back as error-shaped
    /// text; network and decoding faults become [`ToolError::ExecutionFailed`].
    #[instrument(skip_all, fields(address = %params.address))]
    pub async fn execute(
        &self,
        params: &QueryWeatherParams,
        context: &CallContext,
    ) -> Result<CallToolResult, ToolError> {
        let Some(key) = context.credential() else {
            return Ok(error_result(MISSING_KEY_MESSAGE));
        };

        info!("Weather query started");

        match self.lookup(key, &params.address).await {
            Ok(report) => {
                info!("Weather query completed");
                Ok(text_result(report.to_text()))
            }
            Err(e) if e.is_fault() => {
                error!("Weather query faulted: {}", e);
                Err(ToolError::execution_failed(format!(
                    "Failed to query weather: {e}"
                )))
            }
            Err(e) => Ok(error_result(&e.to_string())),
        }
    }

    async fn lookup(&self, key: &str, address: &str) -> Result<WeatherReport, AmapError> {
        let geo = self.client.geocode(key, address).await?;
        self.client.weather(key, &geo.adcode).await
    }
}

#[async_trait::async_trait]
impl ToolHandler for QueryWeatherTool {
    async fn call(
        &self,
        arguments: JsonObject,
        context: CallContext,
    ) -> Result<CallToolResult, ToolError> {
        let params: QueryWeatherParams = serde_json::from_value(Value::Object(arguments))
            .map_err(|e| {
                warn!("Validated arguments failed to decode: {}", e);
                ToolError::internal(e.to_string())
            })?;

        self.execute(&params, &context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::handlers::first_text;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GEOCODE: &str = "/v3/geocode/geo";
    const WEATHER: &str = "/v3/weather/weatherInfo";

    fn tool_for(server: &MockServer) -> QueryWeatherTool {
        QueryWeatherTool::new(AmapClient::with_base_url(server.uri()).unwrap())
    }

    fn params(address: &str) -> QueryWeatherParams {
        QueryWeatherParams {
            address: address.to_string(),
        }
    }

    fn keyed(key: &str) -> CallContext {
        CallContext::new(Some(key.to_string()))
    }

    fn weather_payload() -> Value {
        json!({
            "status": "1",
            "count": "1",
            "info": "OK",
            "infocode": "10000",
            "lives": [{
                "province": "Beijing",
                "city": "Dongcheng",
                "adcode": "110101",
                "weather": "Sunny",
                "temperature": "24",
                "winddirection": "North",
                "windpower": "≤3",
                "humidity": "30",
                "reporttime": "2026-10-18 10:00:00"
            }]
        })
    }

    async fn mount_geocode(server: &MockServer, key: &str, adcode: &str) {
        Mock::given(method("GET"))
            .and(path(GEOCODE))
            .and(query_param("key", key))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "info": "OK",
                "geocodes": [{ "adcode": adcode }]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_success_returns_parseable_payload() {
        let server = MockServer::start().await;
        mount_geocode(&server, "k1", "110101").await;
        Mock::given(method("GET"))
            .and(path(WEATHER))
            .and(query_param("key", "k1"))
            .and(query_param("city", "110101"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let result = tool_for(&server)
            .execute(&params("Dongcheng, Beijing"), &keyed("k1"))
            .await
            .unwrap();

        assert_eq!(result.content.len(), 1);
        assert_eq!(result.is_error, Some(false));
        let parsed: Value = serde_json::from_str(first_text(&result).unwrap()).unwrap();
        assert_eq!(parsed, weather_payload());
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_upstream_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = tool_for(&server)
            .execute(&params("Beijing"), &CallContext::new(None))
            .await
            .unwrap();

        assert_eq!(first_text(&result), Some(MISSING_KEY_MESSAGE));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_geocode_500_stops_before_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODE))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(WEATHER))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_payload()))
            .expect(0)
            .mount(&server)
            .await;

        let result = tool_for(&server)
            .execute(&params("Beijing"), &keyed("k1"))
            .await
            .unwrap();

        assert_eq!(first_text(&result), Some("request error: 500 boom"));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_weather_status_failure() {
        let server = MockServer::start().await;
        mount_geocode(&server, "k1", "110101").await;
        Mock::given(method("GET"))
            .and(path(WEATHER))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0",
                "info": "DAILY_QUERY_OVER_LIMIT"
            })))
            .mount(&server)
            .await;

        let result = tool_for(&server)
            .execute(&params("Beijing"), &keyed("k1"))
            .await
            .unwrap();

        assert_eq!(
            first_text(&result),
            Some("request error: 200 DAILY_QUERY_OVER_LIMIT")
        );
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_zero_geocode_matches_is_error_shaped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "info": "OK",
                "count": "0",
                "geocodes": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(WEATHER))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_payload()))
            .expect(0)
            .mount(&server)
            .await;

        let result = tool_for(&server)
            .execute(&params("Atlantis"), &keyed("k1"))
            .await
            .unwrap();

        assert_eq!(
            first_text(&result),
            Some("request error: 200 no geocode match for address: Atlantis")
        );
        server.verify().await;
    }

    #[tokio::test]
    async fn test_malformed_payload_is_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODE))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = tool_for(&server)
            .execute(&params("Beijing"), &keyed("k1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::ExecutionFailed(ref m) if m.starts_with("Failed to query weather")));
    }

    #[tokio::test]
    async fn test_handler_decodes_arguments() {
        let server = MockServer::start().await;
        let tool = tool_for(&server);
        let arguments = json!({ "address": "Beijing" }).as_object().cloned().unwrap();

        let result = tool.call(arguments, CallContext::default()).await.unwrap();
        assert_eq!(first_text(&result), Some(MISSING_KEY_MESSAGE));
    }

    #[test]
    fn test_descriptor() {
        let descriptor = QueryWeatherTool::descriptor();
        assert_eq!(descriptor.name, "query_weather");
        assert_eq!(descriptor.fields.len(), 1);
        assert!(descriptor.fields[0].required);
    }
}
