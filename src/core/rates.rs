//! Exchange rate abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rates quoted against a single base currency, as returned by one fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ExchangeRateSnapshot {
    pub fn new(base: &str, rates: BTreeMap<String, f64>) -> Self {
        Self {
            base: base.to_string(),
            rates,
            updated_at: None,
        }
    }

    /// Multiplier for `code`, or 0 when the provider did not quote it.
    pub fn rate_for(&self, code: &str) -> f64 {
        self.rates.get(code).copied().unwrap_or(0.0)
    }
}

#[async_trait]
pub trait RateClient: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<ExchangeRateSnapshot>;
}
