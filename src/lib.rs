//! Weather MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing a single tool,
//! `query_weather`, which resolves an address through the Amap geocoding API
//! and returns the live weather report for it.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the per-call context, the
//!   protocol server and the transports (STDIO and session-based HTTP)
//! - **domains**: business logic organized by bounded contexts
//!   - **amap**: the upstream geocode and weather client
//!   - **tools**: tool descriptors, validation, registry and handlers
//!
//! # Example
//!
//! ```rust,no_run
//! use weather_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{CallContext, Config, Error, McpServer, Result};
