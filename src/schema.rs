//! Declarative tool schemas.
//!
//! A `ToolSpec` describes a tool's invocation contract: its name, a
//! human-readable description, and a flat map of primitive parameters. Specs
//! are built once at registration time through `ToolSpecBuilder`; parameter
//! descriptions come from a line-oriented `:param name: text` documentation
//! convention, so tool authors never write the JSON schema by hand.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

/// The deliberately small type vocabulary: no arrays, enums, or nested
/// object schemas. Anything richer maps to `Object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Number,
    Integer,
    String,
    Object,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::String => "string",
            ParamType::Object => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub description: String,
    pub required: bool,
}

/// A tool's invocation contract, immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn builder(name: impl Into<String>) -> ToolSpecBuilder {
        ToolSpecBuilder {
            name: name.into(),
            doc: String::new(),
            params: Vec::new(),
        }
    }

    pub fn required_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// JSON-schema-like parameter block in the OpenAI function format.
    pub fn parameters_json(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for param in &self.params {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.ty.as_str(),
                    "description": param.description,
                }),
            );
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_names(),
        })
    }

    /// The full `{"type": "function", ...}` wrapper providers expect.
    pub fn to_function_json(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_json(),
            },
        })
    }
}

pub struct ToolSpecBuilder {
    name: String,
    doc: String,
    params: Vec<(String, ParamType, bool)>,
}

impl ToolSpecBuilder {
    /// Attach the documentation text. Lines matching `:param name: text`
    /// become per-parameter descriptions; the remaining non-empty lines are
    /// concatenated in order into the tool's own description. No doc text
    /// yields empty descriptions, which is valid.
    pub fn doc(mut self, text: impl Into<String>) -> Self {
        self.doc = text.into();
        self
    }

    /// Declare a parameter with no default value.
    pub fn required(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push((name.into(), ty, true));
        self
    }

    /// Declare a parameter the caller may omit.
    pub fn optional(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push((name.into(), ty, false));
        self
    }

    pub fn build(self) -> ToolSpec {
        let (description, param_docs) = parse_doc(&self.doc);
        let params = self
            .params
            .into_iter()
            .map(|(name, ty, required)| {
                let description = param_docs.get(&name).cloned().unwrap_or_default();
                ParamSpec {
                    name,
                    ty,
                    description,
                    required,
                }
            })
            .collect();
        ToolSpec {
            name: self.name,
            description,
            params,
        }
    }
}

fn param_line() -> &'static Regex {
    static PARAM_LINE: OnceLock<Regex> = OnceLock::new();
    PARAM_LINE.get_or_init(|| Regex::new(r"^:param\s+(\w+):\s*(.+)$").expect("param line pattern"))
}

/// Split a doc string into the tool description and per-parameter notes.
fn parse_doc(doc: &str) -> (String, HashMap<String, String>) {
    let mut params = HashMap::new();
    let mut summary: Vec<&str> = Vec::new();
    for line in doc.lines() {
        let line = line.trim();
        if let Some(caps) = param_line().captures(line) {
            params.insert(caps[1].to_string(), caps[2].trim().to_string());
        } else if !line.is_empty() {
            summary.push(line);
        }
    }
    (summary.join(" "), params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_descriptions_from_doc_lines() {
        let spec = ToolSpec::builder("get_price")
            .doc("Get price.\n:param ticker: the symbol\n:param days: lookback")
            .required("ticker", ParamType::String)
            .optional("days", ParamType::Integer)
            .build();

        assert_eq!(spec.description, "Get price.");
        assert_eq!(spec.params[0].description, "the symbol");
        assert_eq!(spec.params[0].ty, ParamType::String);
        assert!(spec.params[0].required);
        assert_eq!(spec.params[1].description, "lookback");
        assert_eq!(spec.params[1].ty, ParamType::Integer);
        assert!(!spec.params[1].required);
        assert_eq!(spec.required_names(), vec!["ticker"]);
    }

    #[test]
    fn renders_openai_function_format() {
        let spec = ToolSpec::builder("get_price")
            .doc("Get price.\n:param ticker: the symbol\n:param days: lookback")
            .required("ticker", ParamType::String)
            .optional("days", ParamType::Integer)
            .build();

        let rendered = spec.to_function_json();
        assert_eq!(rendered["type"], "function");
        assert_eq!(rendered["function"]["name"], "get_price");
        assert_eq!(rendered["function"]["description"], "Get price.");

        let parameters = &rendered["function"]["parameters"];
        assert_eq!(parameters["type"], "object");
        assert_eq!(parameters["properties"]["ticker"]["type"], "string");
        assert_eq!(
            parameters["properties"]["ticker"]["description"],
            "the symbol"
        );
        assert_eq!(parameters["properties"]["days"]["type"], "integer");
        assert_eq!(parameters["required"], json!(["ticker"]));
    }

    #[test]
    fn missing_doc_produces_empty_descriptions() {
        let spec = ToolSpec::builder("noop")
            .required("payload", ParamType::Object)
            .build();

        assert_eq!(spec.description, "");
        assert_eq!(spec.params[0].description, "");
    }

    #[test]
    fn non_param_lines_concatenate_in_order() {
        let spec = ToolSpec::builder("lookup")
            .doc("Look things up.\n:param q: the query\nResults are ranked.")
            .required("q", ParamType::String)
            .build();

        assert_eq!(spec.description, "Look things up. Results are ranked.");
        assert_eq!(spec.params[0].description, "the query");
    }
}
