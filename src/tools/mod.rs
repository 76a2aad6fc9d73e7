//! Tools module - example toolkits for agents.
//!
//! This module contains the lookups the loop is typically exercised with:
//! - Weather: current conditions for a location
//! - News: topic headlines
//! - Stocks: recent price history for a ticker

pub mod news;
pub mod stocks;
pub mod weather;

pub use news::{news_toolkit, NewsConfig};
pub use stocks::{stocks_toolkit, StocksConfig};
pub use weather::{weather_toolkit, WeatherConfig};
