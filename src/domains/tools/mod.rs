//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `descriptor.rs` - Tool metadata and field-level input validation
//! - `registry.rs` - Name-keyed registration and dispatch
//! - `builder.rs` - Builds the registry served by every transport
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` with a descriptor and a
//!    [`ToolHandler`] implementation
//! 2. Export it in `definitions/mod.rs`
//! 3. Register it in `builder.rs`

pub mod builder;
pub mod definitions;
pub mod descriptor;
mod error;
mod handlers;
mod registry;

pub use builder::build_tool_registry;
pub use descriptor::{FieldKind, FieldSpec, ToolDescriptor};
pub use error::ToolError;
pub use handlers::*;
pub use registry::ToolRegistry;
