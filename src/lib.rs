//! Building blocks for tool-calling LLM agent loops.
//!
//! The crate provides a minimal runtime with:
//! - A language model abstraction (`LanguageModel`) with OpenAI-compatible
//!   clients and a deterministic `StubModel` for tests.
//! - Declarative tool schemas (`ToolSpec`), a `Tool` trait, and a registry
//!   whose dispatcher reports failures instead of raising them.
//! - An `Agent` that alternates between the model and tools until a final
//!   answer or the iteration budget is reached, returning the full run
//!   transcript rather than a single answer.

mod agent;
mod config;
mod context;
mod error;
mod llm;
mod message;
mod react;
mod schema;
mod telemetry;
mod tool;
pub mod tools;
mod transcript;

pub use agent::{Agent, BudgetPolicy};
pub use config::{AgentSettings, AppConfig, ModelConfig};
pub use context::{fit_token_budget, transcript_tokens, HeuristicTokenCounter, TokenCounter};
pub use error::{AgentError, Result};
pub use llm::{
    model_from_config, AzureOpenAIClient, LanguageModel, ModelCompletion, OpenAIClient,
    SamplingParams, StubModel,
};
pub use message::{Message, Role, ToolCall};
pub use react::{react_prompt, FINAL_ANSWER_MARKER};
pub use schema::{ParamSpec, ParamType, ToolSpec, ToolSpecBuilder};
pub use telemetry::init_tracing;
pub use tool::{Tool, ToolRegistry};
pub use transcript::{RunEntry, RunLog, RunState};
