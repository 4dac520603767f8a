//! Amap upstream domain.
//!
//! Client and typed results for the two upstream calls the weather tool
//! chains together: geocode an address, then fetch live weather for the
//! resulting administrative code.

mod client;
mod error;
mod models;

pub use client::AmapClient;
pub use error::AmapError;
pub use models::{GeoResult, WeatherReport};
