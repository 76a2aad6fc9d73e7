//! Weather toolkit.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::schema::{ParamType, ToolSpec};
use crate::tool::{Tool, ToolRegistry};

/// Configuration for the weather tool.
#[derive(Clone)]
pub struct WeatherConfig {
    /// Falls back to the `WEATHER_API_KEY` environment variable.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.weatherapi.com/v1".to_string(),
            timeout_secs: 15,
        }
    }
}

impl WeatherConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

pub fn weather_toolkit(config: WeatherConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CurrentWeatherTool { config });
    registry
}

struct CurrentWeatherTool {
    config: WeatherConfig,
}

impl CurrentWeatherTool {
    fn api_key(&self) -> Result<String> {
        self.config
            .api_key
            .clone()
            .or_else(|| env::var("WEATHER_API_KEY").ok())
            .ok_or_else(|| AgentError::ToolFailure("WEATHER_API_KEY is not set".into()))
    }
}

#[async_trait]
impl Tool for CurrentWeatherTool {
    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::builder("get_current_weather")
            .doc(
                "Get the current weather conditions in a given location.\n\
                 :param location: The city (and state), e.g. \"San Francisco, CA\"",
            )
            .required("location", ParamType::String)
            .build()
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let location = input
            .get("location")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AgentError::ToolFailure("missing `location` for get_current_weather".into())
            })?;
        let key = self.api_key()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|err| AgentError::ToolFailure(format!("http client error: {err}")))?;

        let response = client
            .get(format!(
                "{}/current.json",
                self.config.base_url.trim_end_matches('/')
            ))
            .query(&[("key", key.as_str()), ("q", location)])
            .send()
            .await
            .map_err(|err| AgentError::ToolFailure(format!("weather request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ToolFailure(format!(
                "weather request failed with {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|err| AgentError::ToolFailure(format!("weather response parse error: {err}")))
    }
}
