use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AgentSettings;
use crate::context::{fit_token_budget, HeuristicTokenCounter, TokenCounter};
use crate::error::{AgentError, Result};
use crate::llm::{LanguageModel, SamplingParams};
use crate::message::Message;
use crate::react::{react_prompt, FINAL_ANSWER_MARKER};
use crate::tool::ToolRegistry;
use crate::transcript::{RunEntry, RunLog};

/// What to do when a run reaches its iteration cap without a final answer.
/// Both policies exist in the lineage of this loop; the choice is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPolicy {
    /// Soft stop: the transcript gains a max-iterations note and is
    /// returned with state `BudgetExhausted`.
    #[default]
    Report,
    /// Hard failure: the run aborts with `AgentError::BudgetExhausted`.
    Fail,
}

/// An agent that alternates between the language model and registered tools
/// until the model produces a final answer or the iteration budget runs out.
///
/// Each run owns its message sequence and transcript; the registry is only
/// read, so one `Agent` may serve consecutive runs.
pub struct Agent<M: LanguageModel> {
    model: Arc<M>,
    tools: ToolRegistry,
    system_prompt: String,
    max_iterations: usize,
    sampling: SamplingParams,
    react: bool,
    budget_policy: BudgetPolicy,
    final_answer_interrupt: bool,
    token_budget: Option<usize>,
    counter: Arc<dyn TokenCounter>,
}

impl<M: LanguageModel> Agent<M> {
    pub fn new(model: Arc<M>) -> Self {
        Self {
            model,
            tools: ToolRegistry::new(),
            system_prompt: "You are a helpful agent.".to_string(),
            max_iterations: 3,
            sampling: SamplingParams::default(),
            react: false,
            budget_policy: BudgetPolicy::default(),
            final_answer_interrupt: true,
            token_budget: None,
            counter: Arc::new(HeuristicTokenCounter::default()),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Append the ReAct template to the system prompt and report tool
    /// results as assistant-text observations instead of tool messages.
    pub fn with_react(mut self, react: bool) -> Self {
        self.react = react;
        self
    }

    pub fn with_budget_policy(mut self, policy: BudgetPolicy) -> Self {
        self.budget_policy = policy;
        self
    }

    /// Whether a "Final Answer:" marker ends the run even when the same
    /// response carries tool calls (those calls are then discarded).
    pub fn with_final_answer_interrupt(mut self, interrupt: bool) -> Self {
        self.final_answer_interrupt = interrupt;
        self
    }

    /// Cap the token count of the sequence sent to the provider. The owned
    /// history stays append-only; the provider sees a trimmed copy.
    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = Some(budget);
        self
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_settings(mut self, settings: &AgentSettings) -> Self {
        self.max_iterations = settings.max_iterations.max(1);
        self.sampling = SamplingParams {
            temperature: settings.temperature,
            seed: settings.seed,
        };
        self.react = settings.react;
        self.budget_policy = settings.budget_policy;
        self.final_answer_interrupt = settings.final_answer_interrupt;
        self.token_budget = settings.token_budget;
        self
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    /// Run one exchange to completion and return the full transcript.
    pub async fn run(&self, user_prompt: impl Into<String>) -> Result<RunLog> {
        let mut system_prompt = self.system_prompt.clone();
        if self.react {
            system_prompt.push_str(&react_prompt(&self.tools.names()));
        }

        let mut messages = vec![Message::system(system_prompt), Message::user(user_prompt)];
        let specs = self.tools.specs();
        let mut log = RunLog::new();

        for iteration in 0..self.max_iterations {
            tracing::debug!(iteration, "agent iteration");

            let completion = match self.token_budget {
                Some(budget) => {
                    let window = fit_token_budget(&messages, budget, self.counter.as_ref());
                    self.model
                        .complete_chat(&window, &specs, &self.sampling)
                        .await?
                }
                None => {
                    self.model
                        .complete_chat(&messages, &specs, &self.sampling)
                        .await?
                }
            };

            let content = completion.content.clone().unwrap_or_default();
            messages.push(Message::assistant_with_calls(
                completion.content.clone(),
                completion.tool_calls.clone(),
            ));
            log.push(RunEntry::ModelOutput {
                content: content.clone(),
            });

            // Terminal check A: an explicit final answer wins over any tool
            // calls riding in the same response.
            if self.final_answer_interrupt && content.contains(FINAL_ANSWER_MARKER) {
                return Ok(log);
            }

            // Terminal check B: nothing left to dispatch.
            if completion.tool_calls.is_empty() {
                return Ok(log);
            }

            for call in &completion.tool_calls {
                log.push(RunEntry::ToolInvoked {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });
                let payload = self.tools.dispatch(&call.name, &call.arguments).await;
                log.push(RunEntry::ToolResult {
                    name: call.name.clone(),
                    payload: payload.clone(),
                });
                let observation = if self.react {
                    Message::observation(&payload)
                } else {
                    Message::tool(call.name.clone(), call.id.clone(), payload)
                };
                messages.push(observation);
            }
        }

        match self.budget_policy {
            BudgetPolicy::Report => {
                log.mark_budget_exhausted();
                Ok(log)
            }
            BudgetPolicy::Fail => Err(AgentError::BudgetExhausted {
                max_iterations: self.max_iterations,
            }),
        }
    }
}
