//! Name-indexed set of tools fixed at startup.

use std::collections::HashMap;
use std::sync::Arc;

use super::tool::Tool;
use super::types::ToolDefinition;
use crate::error::ThreadloopError;

/// Registry of the capabilities the model may call.
///
/// Registration order is kept so definitions and prompt listings are stable.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ThreadloopError> {
        let name = tool.name().to_string();
        if name.trim().is_empty() {
            return Err(ThreadloopError::Configuration("tool name must not be empty".into()));
        }
        if self.index.contains_key(&name) {
            return Err(ThreadloopError::Configuration(format!(
                "tool '{name}' registered twice"
            )));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, ThreadloopError> {
        self.register(tool)?;
        Ok(self)
    }

    /// Resolve a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{AgentTool, ToolParameters};

    fn echo(name: &str) -> Arc<dyn Tool> {
        Arc::new(AgentTool::new(
            name,
            "echo",
            ToolParameters::empty(),
            |args, _ctx| async move { Ok(args.raw().clone()) },
        ))
    }

    #[test]
    fn resolves_registered_tools_by_name() {
        let registry = ToolRegistry::new()
            .with_tool(echo("search"))
            .unwrap()
            .with_tool(echo("calendar"))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("calendar").unwrap().name(), "calendar");
        assert!(registry.get("weather").is_none());
    }

    #[test]
    fn keeps_registration_order() {
        let registry = ToolRegistry::new()
            .with_tool(echo("b"))
            .unwrap()
            .with_tool(echo("a"))
            .unwrap();

        assert_eq!(registry.names(), ["b", "a"]);
        let defs: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(defs, ["b", "a"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("search")).unwrap();

        let err = registry.register(echo("search")).unwrap_err();

        assert!(matches!(err, ThreadloopError::Configuration(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_blank_names() {
        let err = ToolRegistry::new().with_tool(echo("  ")).unwrap_err();

        assert!(matches!(err, ThreadloopError::Configuration(_)));
    }
}
