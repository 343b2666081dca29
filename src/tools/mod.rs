//! Tool Catalog & Selector.

pub mod catalog;
pub mod manifest;

pub use catalog::{SelectorError, ToolCatalog};
pub use manifest::{generate_tool_manifest, generate_tool_summary};
