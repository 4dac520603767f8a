//! Transport layer for the MCP server.
//!
//! This module provides two mutually exclusive transport implementations:
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **HTTP**: Session-based JSON-RPC over HTTP - feature: `http`
//!
//! Each transport turns incoming messages into a [`CallContext`] plus a tool
//! call and delegates processing to the MCP server core.
//!
//! [`CallContext`]: crate::core::CallContext

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
