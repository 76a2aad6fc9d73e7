//! News toolkit.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AgentError, Result};
use crate::schema::{ParamType, ToolSpec};
use crate::tool::{Tool, ToolRegistry};

/// Configuration for the news tool.
#[derive(Clone)]
pub struct NewsConfig {
    /// Falls back to the `NEWS_API_KEY` environment variable.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://newsapi.org/v2".to_string(),
            timeout_secs: 15,
        }
    }
}

impl NewsConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

pub fn news_toolkit(config: NewsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(NewsStoriesTool { config });
    registry
}

struct NewsStoriesTool {
    config: NewsConfig,
}

/// Bias a bare company name towards stock coverage before querying.
fn expand_topic(topic: &str) -> String {
    let mut expanded = topic.to_string();
    for term in ["stock", "news"] {
        if !expanded.contains(term) {
            expanded.push(' ');
            expanded.push_str(term);
        }
    }
    expanded
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
}

#[async_trait]
impl Tool for NewsStoriesTool {
    fn name(&self) -> &str {
        "get_news_stories"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::builder("get_news_stories")
            .doc(
                "Get the (stock) topic headlines from a given topic.\n\
                 :param topic: The (stock) topic you want to retrieve news stories about, e.g. \"Microsoft\".",
            )
            .required("topic", ParamType::String)
            .build()
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let topic = input
            .get("topic")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::ToolFailure("missing `topic` for get_news_stories".into()))?;
        let key = self
            .config
            .api_key
            .clone()
            .or_else(|| env::var("NEWS_API_KEY").ok())
            .ok_or_else(|| AgentError::ToolFailure("NEWS_API_KEY is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|err| AgentError::ToolFailure(format!("http client error: {err}")))?;

        let query = expand_topic(topic);
        let response = client
            .get(format!(
                "{}/everything",
                self.config.base_url.trim_end_matches('/')
            ))
            .query(&[
                ("q", query.as_str()),
                ("sortBy", "popularity"),
                ("apiKey", key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| AgentError::ToolFailure(format!("news request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ToolFailure(format!(
                "news request failed with {status}: {body}"
            )));
        }

        let body: NewsResponse = response
            .json()
            .await
            .map_err(|err| AgentError::ToolFailure(format!("news response parse error: {err}")))?;

        let titles: Vec<String> = body
            .articles
            .into_iter()
            .filter_map(|article| article.title)
            .collect();
        Ok(json!({ "topic": topic, "titles": titles }))
    }
}
