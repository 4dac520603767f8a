//! Weather tools backed by the Amap upstream.

pub mod query_weather;

pub use query_weather::{QueryWeatherParams, QueryWeatherTool};
