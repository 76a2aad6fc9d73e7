//! Stocks toolkit.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AgentError, Result};
use crate::schema::{ParamType, ToolSpec};
use crate::tool::{Tool, ToolRegistry};

/// Configuration for the stock price tool.
#[derive(Clone)]
pub struct StocksConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for StocksConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            timeout_secs: 15,
        }
    }
}

impl StocksConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

pub fn stocks_toolkit(config: StocksConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(StockPricesTool { config });
    registry
}

struct StockPricesTool {
    config: StocksConfig,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Vec<ChartResult>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize, Default)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[async_trait]
impl Tool for StockPricesTool {
    fn name(&self) -> &str {
        "get_stock_prices"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::builder("get_stock_prices")
            .doc(
                "Get recent price information about a given stock.\n\
                 :param ticker: The stock ticker symbol for a given company, e.g. Microsoft is \"MSFT\".\n\
                 :param range: How far to look back, e.g. \"1mo\" or \"5d\".",
            )
            .required("ticker", ParamType::String)
            .optional("range", ParamType::String)
            .build()
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let ticker = input
            .get("ticker")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::ToolFailure("missing `ticker` for get_stock_prices".into()))?;
        let range = input
            .get("range")
            .and_then(Value::as_str)
            .unwrap_or("1mo");

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|err| AgentError::ToolFailure(format!("http client error: {err}")))?;

        let response = client
            .get(format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                ticker
            ))
            .query(&[("range", range), ("interval", "1d")])
            .send()
            .await
            .map_err(|err| AgentError::ToolFailure(format!("stock request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::ToolFailure(format!(
                "stock request failed with {status}: {body}"
            )));
        }

        let body: ChartResponse = response
            .json()
            .await
            .map_err(|err| AgentError::ToolFailure(format!("stock response parse error: {err}")))?;

        let result = body.chart.result.into_iter().next().ok_or_else(|| {
            AgentError::ToolFailure(format!("no chart data returned for `{ticker}`"))
        })?;
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        Ok(json!({
            "ticker": ticker,
            "range": range,
            "timestamps": result.timestamp,
            "close": quote.close,
            "volume": quote.volume,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_marks_range_optional() {
        let registry = stocks_toolkit(StocksConfig::default());
        let spec = registry.get("get_stock_prices").unwrap().spec();

        assert_eq!(spec.required_names(), vec!["ticker"]);
        let range = spec.params.iter().find(|p| p.name == "range").unwrap();
        assert!(!range.required);
        assert_eq!(range.ty, ParamType::String);
    }

    #[test]
    fn parses_chart_payloads() {
        let raw = json!({
            "chart": {
                "result": [{
                    "timestamp": [1700000000i64, 1700086400i64],
                    "indicators": {
                        "quote": [{
                            "close": [370.27, 372.52],
                            "volume": [21_500_000u64, 19_800_000u64]
                        }]
                    }
                }]
            }
        });

        let parsed: ChartResponse = serde_json::from_value(raw).unwrap();

        let result = &parsed.chart.result[0];
        assert_eq!(result.timestamp.len(), 2);
        assert_eq!(result.indicators.quote[0].close[1], Some(372.52));
    }
}
