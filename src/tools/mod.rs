//! Tool system: capability trait, registry, schemas and argument checks.

pub mod arguments;
pub mod format;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

#[cfg(feature = "tavily")]
pub mod web_search;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::{ToolDefinition, ToolParameters};

#[cfg(feature = "tavily")]
pub use web_search::{TavilySearchTool, WEB_SEARCH_TOOL_NAME};
