//! Currency and exchange-rate abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl CurrencyRecord {
    pub fn new(id: &str, name: &str, symbol: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.map(str::to_string),
        }
    }

    /// Label shown when listing currencies, e.g. `Euro (€)` or `Euro (EUR)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.symbol.as_deref().unwrap_or(&self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub query: String,
    pub rate: f64,
}

impl RateEntry {
    pub fn new(rate: f64, from: &str, to: &str) -> Self {
        Self {
            query: query_key(from, to),
            rate,
        }
    }
}

/// Composite key identifying a cached rate for an ordered currency pair.
pub fn query_key(from: &str, to: &str) -> String {
    format!("{from}_{to}")
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn list_currencies(&self) -> Result<Vec<CurrencyRecord>>;
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}
