//! Incremental concept graph explorer rendered as SVG.

mod component;
mod config;
mod error;
mod expansion;
mod host;
mod palette;
mod render;
mod simulation;
mod state;
mod store;
mod theme;
mod tooltip;
mod types;

pub use component::ConceptMap;
pub use config::ConceptMapConfig;
pub use host::{HostBridge, JsHost, McpApp};
