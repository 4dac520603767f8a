//! Async client for the Amap geocoding and weather endpoints.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::AmapError;
use super::models::{GeoResult, GeocodeResponse, STATUS_OK, WeatherReport, envelope};
use crate::core::config::UpstreamConfig;

const GEOCODE_PATH: &str = "/v3/geocode/geo";
const WEATHER_PATH: &str = "/v3/weather/weatherInfo";

/// Amap REST client.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct AmapClient {
    http: reqwest::Client,
    base_url: String,
}

impl AmapClient {
    /// Create a client from the upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, AmapError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client against the given base URL with no timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AmapError> {
        Self::new(&UpstreamConfig {
            base_url: base_url.into(),
            timeout_secs: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve an address to the administrative code of its first match.
    #[instrument(skip(self, key))]
    pub async fn geocode(&self, key: &str, address: &str) -> Result<GeoResult, AmapError> {
        let body = self
            .get(GEOCODE_PATH, &[("key", key), ("address", address)])
            .await?;

        let response: GeocodeResponse = serde_json::from_value(body)
            .map_err(|e| AmapError::decode(format!("geocode payload: {e}")))?;

        let adcode = response
            .geocodes
            .into_iter()
            .next()
            .map(|g| g.adcode)
            .ok_or_else(|| AmapError::NoMatches {
                address: address.to_string(),
            })?;

        debug!(%adcode, "Geocode resolved");
        Ok(GeoResult { adcode })
    }

    /// Fetch live weather for an administrative code.
    #[instrument(skip(self, key))]
    pub async fn weather(&self, key: &str, adcode: &str) -> Result<WeatherReport, AmapError> {
        let body = self.get(WEATHER_PATH, &[("key", key), ("city", adcode)]).await?;
        Ok(WeatherReport::new(body))
    }

    /// Issue one GET and apply the status checks shared by both endpoints.
    ///
    /// Order: HTTP status, then JSON decoding, then the upstream `status` field.
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, AmapError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.http.get(&url).query(params).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Upstream returned non-200 status");
            return Err(AmapError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| AmapError::decode(format!("{path}: {e}")))?;

        let (api_status, info) = envelope(&body);
        if api_status != Some(STATUS_OK) {
            warn!(?api_status, info, "Upstream reported failure");
            return Err(AmapError::Api {
                status: status.as_u16(),
                info: info.to_string(),
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AmapClient {
        AmapClient::with_base_url(server.uri()).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = AmapClient::with_base_url("http://localhost:1234/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
    }

    #[tokio::test]
    async fn test_geocode_takes_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODE_PATH))
            .and(query_param("key", "k1"))
            .and(query_param("address", "Tiananmen"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "info": "OK",
                "geocodes": [{ "adcode": "110101" }, { "adcode": "999999" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let geo = client_for(&server).geocode("k1", "Tiananmen").await.unwrap();
        assert_eq!(geo.adcode, "110101");
    }

    #[tokio::test]
    async fn test_geocode_no_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "info": "OK",
                "count": "0",
                "geocodes": []
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).geocode("k1", "nowhere").await.unwrap_err();
        assert!(matches!(err, AmapError::NoMatches { ref address } if address == "nowhere"));
        assert!(!err.is_fault());
    }

    #[tokio::test]
    async fn test_non_200_keeps_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GEOCODE_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).geocode("k1", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "request error: 503 maintenance");
    }

    #[tokio::test]
    async fn test_api_status_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0",
                "info": "INVALID_USER_KEY",
                "infocode": "10001"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).weather("bad", "110101").await.unwrap_err();
        assert!(matches!(err, AmapError::Api { status: 200, .. }));
        assert_eq!(err.to_string(), "request error: 200 INVALID_USER_KEY");
    }

    #[tokio::test]
    async fn test_malformed_body_is_fault() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).weather("k1", "110101").await.unwrap_err();
        assert!(err.is_fault());
    }

    #[tokio::test]
    async fn test_weather_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .and(query_param("city", "110101"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1",
                "info": "OK",
                "lives": [{ "city": "Dongcheng", "weather": "Cloudy", "temperature": "18" }]
            })))
            .mount(&server)
            .await;

        let report = client_for(&server).weather("k1", "110101").await.unwrap();
        assert_eq!(report.live().unwrap()["temperature"], "18");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_fault() {
        // Nothing listens on the discard port.
        let client = AmapClient::with_base_url("http://127.0.0.1:9").unwrap();
        let err = client.geocode("k1", "x").await.unwrap_err();
        assert!(matches!(err, AmapError::Transport(_)));
        assert!(err.is_fault());
    }
}
