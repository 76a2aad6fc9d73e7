use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::BudgetPolicy;
use crate::error::{AgentError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub provider: String,
    /// Model name, or the deployment name for Azure.
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    /// Surfaced for hosts that wrap the client in their own retry policy;
    /// the loop itself never retries.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "stub".into(),
            model: "stub-model".into(),
            api_key: None,
            base_url: None,
            organization: None,
            api_version: None,
            max_retries: default_max_retries(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSettings {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_seed")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub react: bool,
    #[serde(default)]
    pub budget_policy: BudgetPolicy,
    #[serde(default = "default_true")]
    pub final_answer_interrupt: bool,
    #[serde(default)]
    pub token_budget: Option<usize>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            temperature: 0.0,
            seed: default_seed(),
            react: false,
            budget_policy: BudgetPolicy::default(),
            final_answer_interrupt: default_true(),
            token_budget: None,
        }
    }
}

fn default_max_iterations() -> usize {
    3
}

fn default_seed() -> Option<u64> {
    Some(0)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub agent: AgentSettings,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&raw)
            .map_err(|err| AgentError::Protocol(format!("Failed to parse configuration: {err}")))?;
        Ok(cfg)
    }

    /// Load from a file and let `AGENTRY_*` environment variables override.
    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        if let Ok(provider) = env::var("AGENTRY_PROVIDER") {
            cfg.model.provider = provider;
        }
        if let Ok(model) = env::var("AGENTRY_MODEL") {
            cfg.model.model = model;
        }
        if let Ok(key) = env::var("AGENTRY_API_KEY") {
            cfg.model.api_key = Some(key);
        }
        if let Ok(base_url) = env::var("AGENTRY_BASE_URL") {
            cfg.model.base_url = Some(base_url);
        }
        if let Ok(org) = env::var("AGENTRY_ORG") {
            cfg.model.organization = Some(org);
        }
        if let Ok(version) = env::var("AGENTRY_API_VERSION") {
            cfg.model.api_version = Some(version);
        }
        if let Ok(retries) = env::var("AGENTRY_MAX_RETRIES") {
            if let Ok(parsed) = retries.parse::<u32>() {
                cfg.model.max_retries = parsed;
            }
        }
        if let Ok(iterations) = env::var("AGENTRY_MAX_ITERATIONS") {
            if let Ok(parsed) = iterations.parse::<usize>() {
                cfg.agent.max_iterations = parsed;
            }
        }
        if let Ok(temperature) = env::var("AGENTRY_TEMPERATURE") {
            if let Ok(parsed) = temperature.parse::<f32>() {
                cfg.agent.temperature = parsed;
            }
        }
        if let Ok(seed) = env::var("AGENTRY_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                cfg.agent.seed = Some(parsed);
            }
        }
        if let Ok(react) = env::var("AGENTRY_REACT") {
            if let Ok(parsed) = react.parse::<bool>() {
                cfg.agent.react = parsed;
            }
        }
        if let Ok(policy) = env::var("AGENTRY_BUDGET_POLICY") {
            cfg.agent.budget_policy = match policy.to_ascii_lowercase().as_str() {
                "fail" => BudgetPolicy::Fail,
                _ => BudgetPolicy::Report,
            };
        }
        if let Ok(budget) = env::var("AGENTRY_TOKEN_BUDGET") {
            if let Ok(parsed) = budget.parse::<usize>() {
                cfg.agent.token_budget = Some(parsed);
            }
        }
        Ok(cfg)
    }
}
