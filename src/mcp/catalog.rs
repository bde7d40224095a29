//! Tool catalog: the ordered set of callable tools.
//!
//! The catalog is built once at startup and is read-only afterwards, so it is
//! shared between sessions behind an `Arc` without locking. Filtering out
//! disabled tools produces a new catalog and leaves the source untouched.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CatalogError, ToolError};
use crate::mcp::dispatch::ToolOutput;

/// A callable tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool with the raw arguments supplied by the client.
    ///
    /// Implementations validate `arguments` against their own input contract.
    async fn call(&self, arguments: Value) -> Result<ToolOutput, ToolError>;
}

/// A tool definition for tools/list response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

#[derive(Clone)]
struct ToolEntry {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Ordered collection of tools keyed by name.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    tools: IndexMap<String, ToolEntry>,
}

impl ToolCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool at the end of the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateTool`] if the name is already taken.
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), CatalogError> {
        if self.tools.contains_key(&definition.name) {
            return Err(CatalogError::DuplicateTool {
                name: definition.name,
            });
        }
        self.tools.insert(
            definition.name.clone(),
            ToolEntry {
                definition,
                handler,
            },
        );
        Ok(())
    }

    /// Returns the tool definitions in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|e| e.definition.clone()).collect()
    }

    /// Returns the tool names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Looks up the handler bound to `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).map(|e| Arc::clone(&e.handler))
    }

    /// Returns `true` if a tool named `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns the effective catalog with `disabled` names removed.
    ///
    /// Names that do not match any tool are logged and otherwise ignored.
    #[must_use]
    pub fn filtered(&self, disabled: &BTreeSet<String>) -> Self {
        if disabled.is_empty() {
            return self.clone();
        }

        for name in disabled.iter().filter(|n| !self.contains(n)) {
            tracing::warn!(tool = %name, "Disabled tool does not exist, ignoring");
        }

        let tools = self
            .tools
            .iter()
            .filter(|(name, _)| !disabled.contains(name.as_str()))
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();

        Self { tools }
    }
}

impl fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn call(&self, _arguments: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text("ok"))
        }
    }

    fn definition(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: format!("{name} tool"),
            input_schema: json!({ "type": "object" }),
        }
    }

    fn catalog(names: &[&str]) -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        for name in names {
            catalog.register(definition(name), Arc::new(Noop)).unwrap();
        }
        catalog
    }

    #[test]
    fn preserves_registration_order() {
        let catalog = catalog(&["c", "a", "b"]);
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut catalog = catalog(&["a"]);
        let err = catalog.register(definition("a"), Arc::new(Noop)).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateTool {
                name: "a".to_string()
            }
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn filtering_removes_only_present_names() {
        let full = catalog(&["a", "b", "c"]);
        let disabled: BTreeSet<String> = ["b", "zzz"].iter().map(ToString::to_string).collect();

        let effective = full.filtered(&disabled);

        let names: Vec<_> = effective.names().collect();
        assert_eq!(names, ["a", "c"]);
        assert_eq!(effective.len(), full.len() - 1);
        assert!(effective.resolve("b").is_none());
        // source catalog is untouched
        assert_eq!(full.len(), 3);
        assert!(full.resolve("b").is_some());
    }

    #[test]
    fn empty_filter_is_identity() {
        let full = catalog(&["a", "b"]);
        let effective = full.filtered(&BTreeSet::new());
        assert_eq!(effective.list(), full.list());
    }

    #[test]
    fn list_serialises_camel_case() {
        let value = serde_json::to_value(catalog(&["a"]).list()).unwrap();
        assert_eq!(value[0]["name"], "a");
        assert!(value[0]["inputSchema"].is_object());
    }
}
