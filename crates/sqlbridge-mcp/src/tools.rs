use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HandlerError, RegistryError};
use crate::result::ToolResult;

/// Definition of an MCP tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A callable tool. Its metadata and its behavior live on the same type.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON-schema-shaped description of the arguments. Descriptive only.
    fn input_schema(&self) -> Value;

    /// Run the tool.
    ///
    /// Database failures are reported inside the returned [`ToolResult`];
    /// `Err` is reserved for problems with the arguments themselves.
    async fn invoke(&self, arguments: Value) -> Result<ToolResult, HandlerError>;
}

impl ToolDefinition {
    fn of(handler: &dyn ToolHandler) -> Self {
        Self {
            name: handler.name().to_string(),
            description: handler.description().to_string(),
            input_schema: handler.input_schema(),
        }
    }
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Ordered, name-unique set of tools. Built once at startup and read-only
/// afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool at the end of the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateTool`] if the name is taken.
    pub fn register(mut self, handler: impl ToolHandler + 'static) -> Result<Self, RegistryError> {
        if self.get(handler.name()).is_some() {
            return Err(RegistryError::DuplicateTool(handler.name().to_string()));
        }
        self.tools.push(RegisteredTool {
            definition: ToolDefinition::of(&handler),
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Look up a tool handler by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools
            .iter()
            .find(|t| t.definition.name == name)
            .map(|t| &t.handler)
    }

    /// Tool metadata in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter().map(|t| &t.definition)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Deserialize a tool's named arguments.
///
/// # Errors
///
/// Fails when `arguments` is not an object or does not match `T`.
pub fn parse_arguments<T: DeserializeOwned>(
    tool: &'static str,
    arguments: Value,
) -> Result<T, HandlerError> {
    if !arguments.is_object() {
        return Err(HandlerError::ArgumentsNotObject { tool });
    }
    serde_json::from_value(arguments).map_err(|e| HandlerError::InvalidArguments {
        tool,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[async_trait]
    impl ToolHandler for Echo {
        fn name(&self) -> &'static str {
            self.0
        }

        fn description(&self) -> &'static str {
            "Echo the arguments back."
        }

        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object", "properties": {}, "required": []})
        }

        async fn invoke(&self, arguments: Value) -> Result<ToolResult, HandlerError> {
            Ok(ToolResult::success().field("arguments", arguments).finish())
        }
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Args {
        name: String,
        #[serde(default)]
        count: Option<u32>,
    }

    #[test]
    fn registry_keeps_order() {
        let registry = ToolRegistry::new()
            .register(Echo("b"))
            .unwrap()
            .register(Echo("a"))
            .unwrap();

        let names: Vec<&str> = registry.definitions().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("a").is_some());
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = ToolRegistry::new()
            .register(Echo("a"))
            .unwrap()
            .register(Echo("a"));
        assert!(matches!(result, Err(RegistryError::DuplicateTool(name)) if name == "a"));
    }

    #[test]
    fn definitions_serialize_with_input_schema() {
        let registry = ToolRegistry::new().register(Echo("echo")).unwrap();
        let json = serde_json::to_string(&registry.definitions().collect::<Vec<_>>()).unwrap();
        assert!(json.contains("\"inputSchema\""));
        assert!(json.contains("\"echo\""));
    }

    #[test]
    fn parse_arguments_accepts_named_fields() {
        let args: Args =
            parse_arguments("t", serde_json::json!({"name": "x", "count": 2})).unwrap();
        assert_eq!(args.name, "x");
        assert_eq!(args.count, Some(2));
    }

    #[test]
    fn parse_arguments_reports_missing_field() {
        let err = parse_arguments::<Args>("t", serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("missing field `name`"));
    }

    #[test]
    fn parse_arguments_rejects_unknown_field() {
        let err = parse_arguments::<Args>("t", serde_json::json!({"name": "x", "bogus": 1}))
            .unwrap_err();
        assert!(err.to_string().contains("unknown field `bogus`"));
    }

    #[test]
    fn parse_arguments_requires_object() {
        let err = parse_arguments::<Args>("t", serde_json::json!(["x"])).unwrap_err();
        assert!(matches!(err, HandlerError::ArgumentsNotObject { tool: "t" }));
    }
}
