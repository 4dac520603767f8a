//! Typed views over the upstream geocode and weather payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status value the upstream uses to signal success.
pub const STATUS_OK: &str = "1";

/// First match of a geocode lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeoResult {
    /// Administrative division code, used as the `city` weather parameter.
    pub adcode: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    pub geocodes: Vec<Geocode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geocode {
    pub adcode: String,
}

/// Live weather payload as returned by the upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    payload: Value,
}

impl WeatherReport {
    pub(crate) fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// The full upstream document.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The first live weather record, if any.
    pub fn live(&self) -> Option<&Value> {
        self.payload.get("lives").and_then(|l| l.get(0))
    }

    /// Compact JSON encoding of the payload.
    ///
    /// Object keys are emitted in sorted order, so the text is stable for a
    /// given payload.
    pub fn to_text(&self) -> String {
        self.payload.to_string()
    }
}

/// Read the upstream `status` and `info` fields of a response body.
pub(crate) fn envelope(body: &Value) -> (Option<&str>, &str) {
    let status = body.get("status").and_then(Value::as_str);
    let info = body.get("info").and_then(Value::as_str).unwrap_or("unknown error");
    (status, info)
}
