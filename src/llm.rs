//! Language model implementations and abstractions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ModelConfig;
use crate::error::{AgentError, Result};
use crate::message::{Message, Role, ToolCall};
use crate::schema::ToolSpec;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_AZURE_API_VERSION: &str = "2024-12-01-preview";

/// Decoding knobs for a single completion request. Defaults to temperature 0
/// with a pinned seed, so identical runs produce identical decisions.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub seed: Option<u64>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            seed: Some(0),
        }
    }
}

/// Result of a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Minimal abstraction around a chat completion provider. Provider failures
/// propagate to the run's caller; retry and backoff policy live with the
/// host.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete_chat(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        sampling: &SamplingParams,
    ) -> Result<ModelCompletion>;
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    async fn complete_chat(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        sampling: &SamplingParams,
    ) -> Result<ModelCompletion> {
        (**self).complete_chat(messages, tools, sampling).await
    }
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    async fn complete_chat(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        sampling: &SamplingParams,
    ) -> Result<ModelCompletion> {
        (**self).complete_chat(messages, tools, sampling).await
    }
}

/// Select a client by the config's provider string.
pub fn model_from_config(cfg: &ModelConfig) -> Result<Box<dyn LanguageModel>> {
    match cfg.provider.as_str() {
        "openai" => Ok(Box::new(OpenAIClient::from_config(cfg)?)),
        "azure" => Ok(Box::new(AzureOpenAIClient::from_config(cfg)?)),
        "stub" => Ok(Box::new(StubModel::default())),
        other => Err(AgentError::Protocol(format!(
            "unknown model provider `{other}`"
        ))),
    }
}

fn coalesce_error(status: reqwest::StatusCode, body: &str, provider: &str) -> AgentError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return AgentError::Provider(format!("{provider} rate limit exceeded: {body}"));
    }
    AgentError::Provider(format!("{provider} request failed with {status}: {body}"))
}

fn request_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|err| AgentError::Provider(format!("http client error: {err}")))
}

#[derive(Clone)]
pub struct OpenAIClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    base_url: String,
    organization: Option<String>,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            model: "gpt-4o-mini".to_string(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            organization: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            AgentError::Provider("missing OpenAI API key in model config".into())
        })?;
        Ok(Self {
            http: request_http_client()?,
            model: cfg.model.clone(),
            api_key,
            base_url: cfg
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            organization: cfg.organization.clone(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    async fn complete_chat(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        sampling: &SamplingParams,
    ) -> Result<ModelCompletion> {
        let payload = chat_payload(&self.model, messages, tools, sampling);

        let mut builder = self
            .http
            .post(format!(
                "{}/chat/completions",
                self.base_url.trim_end_matches('/')
            ))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.api_key),
            );
        if let Some(org) = &self.organization {
            builder = builder.header("OpenAI-Organization", org);
        }
        let resp = builder
            .json(&payload)
            .send()
            .await
            .map_err(|err| AgentError::Provider(format!("OpenAI request error: {err}")))?;

        read_completion(resp, "openai").await
    }
}

/// Azure-hosted OpenAI deployments: same wire format, deployment-scoped URL
/// and `api-key` header auth.
#[derive(Clone)]
pub struct AzureOpenAIClient {
    http: reqwest::Client,
    deployment: String,
    api_key: String,
    endpoint: String,
    api_version: String,
}

impl AzureOpenAIClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            deployment: deployment.into(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| AgentError::Provider("missing Azure API key in model config".into()))?;
        let endpoint = cfg.base_url.clone().ok_or_else(|| {
            AgentError::Provider("missing Azure endpoint (base_url) in model config".into())
        })?;
        Ok(Self {
            http: request_http_client()?,
            deployment: cfg.model.clone(),
            api_key,
            endpoint,
            api_version: cfg
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
        })
    }
}

#[async_trait]
impl LanguageModel for AzureOpenAIClient {
    async fn complete_chat(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        sampling: &SamplingParams,
    ) -> Result<ModelCompletion> {
        let payload = chat_payload(&self.deployment, messages, tools, sampling);

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        );
        let resp = self
            .http
            .post(url)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| AgentError::Provider(format!("Azure request error: {err}")))?;

        read_completion(resp, "azure").await
    }
}

/// A deterministic model used for tests and demos. Scripts are JSON
/// directives consumed front to back; anything that does not parse is
/// returned verbatim as content.
#[derive(Default)]
pub struct StubModel {
    responses: Mutex<VecDeque<String>>,
}

impl StubModel {
    pub fn new(responses: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum StubDirective {
    Respond {
        content: String,
    },
    CallTool {
        name: String,
        arguments: Value,
        #[serde(default)]
        content: Option<String>,
    },
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete_chat(
        &self,
        _messages: &[Message],
        _tools: &[ToolSpec],
        _sampling: &SamplingParams,
    ) -> Result<ModelCompletion> {
        let mut locked = self.responses.lock().expect("stub model poisoned");
        let raw = locked.pop_front().ok_or_else(|| {
            AgentError::Provider("StubModel ran out of scripted responses".into())
        })?;

        match serde_json::from_str::<StubDirective>(&raw) {
            Ok(StubDirective::Respond { content }) => Ok(ModelCompletion {
                content: Some(content),
                tool_calls: Vec::new(),
            }),
            Ok(StubDirective::CallTool {
                name,
                arguments,
                content,
            }) => Ok(ModelCompletion {
                content,
                tool_calls: vec![ToolCall {
                    id: None,
                    name,
                    arguments,
                }],
            }),
            Err(_) => Ok(ModelCompletion {
                content: Some(raw),
                tool_calls: Vec::new(),
            }),
        }
    }
}

fn chat_payload(
    model: &str,
    messages: &[Message],
    tools: &[ToolSpec],
    sampling: &SamplingParams,
) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": to_wire_messages(messages),
        "temperature": sampling.temperature,
    });
    if let Some(seed) = sampling.seed {
        payload["seed"] = json!(seed);
    }
    if !tools.is_empty() {
        payload["tools"] = Value::Array(tools.iter().map(ToolSpec::to_function_json).collect());
        payload["tool_choice"] = json!("auto");
    }
    payload
}

fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::Tool => "tool",
            };

            let tool_calls = if message.tool_calls.is_empty() {
                None
            } else {
                Some(
                    message
                        .tool_calls
                        .iter()
                        .map(|call| WireToolCall {
                            id: call.id.clone(),
                            r#type: "function".to_string(),
                            function: WireFunctionCall {
                                name: call.name.clone(),
                                arguments: serialize_tool_arguments(&call.arguments),
                            },
                        })
                        .collect(),
                )
            };

            WireMessage {
                role,
                content: message.content.clone(),
                name: message.name.clone(),
                tool_call_id: message.tool_call_id.clone(),
                tool_calls,
            }
        })
        .collect()
}

fn serialize_tool_arguments(args: &Value) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| args.to_string())
}

async fn read_completion(resp: reqwest::Response, provider: &str) -> Result<ModelCompletion> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(coalesce_error(status, &body, provider));
    }

    let body: ChatResponse = resp
        .json()
        .await
        .map_err(|err| AgentError::Provider(format!("{provider} response parse error: {err}")))?;

    let first = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::Provider(format!("{provider} returned no choices")))?;

    let mut tool_calls = Vec::new();
    if let Some(calls) = first.message.tool_calls {
        for call in calls {
            let arguments = serde_json::from_str(&call.function.arguments)
                .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
            tool_calls.push(ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            });
        }
    }

    Ok(ModelCompletion {
        content: first.message.content,
        tool_calls,
    })
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    r#type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}
