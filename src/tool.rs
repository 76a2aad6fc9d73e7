use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::schema::ToolSpec;

/// A callable the model may request to be invoked on its behalf.
///
/// `spec()` is consulted once at registration; `name()` must match the
/// spec's name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn spec(&self) -> ToolSpec;
    async fn call(&self, input: Value) -> Result<Value>;
}

/// A closed set of tools, built once at run setup. Read-only during a run;
/// cloning shares the underlying tools, so a host may hand the same registry
/// to several agents.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.names()
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a named tool and report the outcome as a serialized string.
    ///
    /// Never fails: an unknown name or a tool error becomes an
    /// `{"error": ...}` payload fed back to the model as an observation.
    /// Every invocation is logged regardless of outcome.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> String {
        tracing::debug!(tool = name, args = %arguments, "invoking tool");

        let Some(tool) = self.tools.get(name) else {
            let message = format!(
                "Tool '{}' not found. Available tools: {:?}",
                name,
                self.names()
            );
            tracing::error!("{message}");
            return error_payload(&message);
        };

        match tool.call(arguments.clone()).await {
            Ok(value) => value.to_string(),
            Err(err) => {
                tracing::error!("Error executing tool '{name}': {err}");
                error_payload(&err.to_string())
            }
        }
    }
}

fn error_payload(message: &str) -> String {
    json!({ "error": message }).to_string()
}
