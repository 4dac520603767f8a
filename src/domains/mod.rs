//! Domains module containing business logic organized by bounded contexts.
//!
//! - **amap**: client for the upstream geocoding and weather API
//! - **tools**: MCP tools, their descriptors, and the dispatch registry

pub mod amap;
pub mod tools;
