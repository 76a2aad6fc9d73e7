//! End-to-end loop behavior observed from the provider side.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use agentry::{
    Agent, AgentError, AgentSettings, BudgetPolicy, LanguageModel, Message, ModelCompletion,
    ParamType, Role, RunState, SamplingParams, StubModel, Tool, ToolCall, ToolRegistry, ToolSpec,
};

/// Scripted model that records every message window it is invoked with.
struct RecordingModel {
    script: Mutex<VecDeque<ModelCompletion>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl RecordingModel {
    fn new(script: Vec<ModelCompletion>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn windows(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    async fn complete_chat(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
        _sampling: &SamplingParams,
    ) -> agentry::Result<ModelCompletion> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::Provider("recording model ran out of script".into()))
    }
}

struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::builder("echo")
            .doc("Echo the payload back.\n:param text: what to echo")
            .required("text", ParamType::String)
            .build()
    }

    async fn call(&self, input: Value) -> agentry::Result<Value> {
        Ok(input)
    }
}

fn echo_registry() -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(EchoTool);
    tools
}

fn call_echo() -> ModelCompletion {
    ModelCompletion {
        content: None,
        tool_calls: vec![ToolCall {
            id: Some("call_0".into()),
            name: "echo".into(),
            arguments: json!({"text": "ping"}),
        }],
    }
}

fn respond(content: &str) -> ModelCompletion {
    ModelCompletion {
        content: Some(content.into()),
        tool_calls: Vec::new(),
    }
}

#[tokio::test]
async fn plain_mode_appends_tool_messages_without_rewriting_history() {
    agentry::init_tracing();
    let model = RecordingModel::new(vec![call_echo(), respond("done")]);
    let agent = Agent::new(Arc::clone(&model)).with_tools(echo_registry());

    let log = agent.run("say ping").await.unwrap();
    assert_eq!(log.state(), RunState::Done);

    let windows = model.windows();
    assert_eq!(windows.len(), 2);

    // second window is exactly the first plus the assistant turn and one
    // tool message per call
    assert_eq!(&windows[1][..windows[0].len()], windows[0].as_slice());
    assert_eq!(windows[1].len(), windows[0].len() + 2);

    let assistant = &windows[1][2];
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.tool_calls.len(), 1);

    let observation = &windows[1][3];
    assert_eq!(observation.role, Role::Tool);
    assert_eq!(observation.name.as_deref(), Some("echo"));
    assert_eq!(observation.tool_call_id.as_deref(), Some("call_0"));
    assert_eq!(observation.content_str(), r#"{"text":"ping"}"#);
}

#[tokio::test]
async fn react_mode_reports_observations_as_assistant_text() {
    let model = RecordingModel::new(vec![call_echo(), respond("Final Answer: pong")]);
    let agent = Agent::new(Arc::clone(&model))
        .with_tools(echo_registry())
        .with_react(true);

    let log = agent.run("say ping").await.unwrap();
    assert_eq!(log.state(), RunState::Done);

    let windows = model.windows();
    let system = &windows[0][0];
    assert_eq!(system.role, Role::System);
    assert!(system.content_str().contains("Begin!"));
    assert!(system.content_str().contains("echo"));

    let observation = &windows[1][3];
    assert_eq!(observation.role, Role::Assistant);
    assert_eq!(observation.content_str(), r#"Observation: {"text":"ping"}"#);
    assert!(observation.tool_calls.is_empty());
}

#[tokio::test]
async fn token_budget_trims_the_provider_window_only() {
    let model = RecordingModel::new(vec![call_echo(), respond("done")]);
    let agent = Agent::new(Arc::clone(&model))
        .with_tools(echo_registry())
        .with_token_budget(20);

    let long_prompt = "p".repeat(400);
    agent.run(long_prompt).await.unwrap();

    let windows = model.windows();
    // the second window dropped the oldest messages to fit the budget, while
    // the run still progressed over the full history
    assert!(windows[1].len() < windows[0].len() + 2);
    assert_eq!(
        windows[1].last().unwrap().content_str(),
        r#"{"text":"ping"}"#
    );
}

#[tokio::test]
async fn transcript_interleaves_outputs_and_tool_records() {
    let model = StubModel::new(vec![
        r#"{"action":"call_tool","name":"echo","arguments":{"text":"ping"}}"#.into(),
        r#"{"action":"respond","content":"Final Answer: pong"}"#.into(),
    ]);
    let agent = Agent::new(model).with_tools(echo_registry());

    let log = agent.run("say ping").await.unwrap();
    let transcript = log.render();

    let call_at = transcript
        .find(r#"### Tool Called: echo with args: {"text":"ping"}"#)
        .unwrap();
    let result_at = transcript.find("### Tool Result: echo").unwrap();
    let answer_at = transcript.find("Final Answer: pong").unwrap();
    assert!(call_at < result_at && result_at < answer_at);
}

#[tokio::test]
async fn settings_drive_the_budget_policy() {
    let call = r#"{"action":"call_tool","name":"echo","arguments":{"text":"ping"}}"#;
    let model = StubModel::new(vec![call.into(), call.into()]);
    let settings = AgentSettings {
        max_iterations: 2,
        budget_policy: BudgetPolicy::Fail,
        ..AgentSettings::default()
    };
    let agent = Agent::new(model)
        .with_tools(echo_registry())
        .with_settings(&settings);

    let err = agent.run("say ping").await.unwrap_err();

    assert!(matches!(
        err,
        AgentError::BudgetExhausted { max_iterations: 2 }
    ));
}
