//! The two node kinds of the loop: reasoning and tool execution.

pub mod reasoner;
pub mod tool_executor;

pub use reasoner::Reasoner;
pub use tool_executor::{ToolExecutor, ToolOutcome};
