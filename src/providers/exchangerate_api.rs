use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

use crate::core::rates::{ExchangeRateSnapshot, RateClient};

pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate-api.com";

// ExchangeRateApiClient implementation for RateClient
pub struct ExchangeRateApiClient {
    base_url: String,
    api_key: Option<String>,
}

impl ExchangeRateApiClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        ExchangeRateApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: BTreeMap<String, Value>,
    time_last_updated: Option<i64>,
}

/// Keeps only quotes that can act as a multiplier. A dropped quote reads as 0
/// through [`ExchangeRateSnapshot::rate_for`].
fn normalize_rates(base: &str, rates: BTreeMap<String, Value>) -> BTreeMap<String, f64> {
    rates
        .into_iter()
        .filter_map(|(code, value)| match value.as_f64() {
            Some(rate) if rate.is_finite() && rate >= 0.0 => Some((code, rate)),
            _ => {
                warn!(base, code = %code, value = %value, "Dropping invalid rate");
                None
            }
        })
        .collect()
}

#[async_trait]
impl RateClient for ExchangeRateApiClient {
    #[instrument(
        name = "ExchangeRateFetch",
        skip(self),
        fields(base = %base)
    )]
    async fn fetch_rates(&self, base: &str) -> Result<ExchangeRateSnapshot> {
        let url = format!("{}/v4/latest/{}", self.base_url, base);
        debug!("Requesting exchange rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("swiftconvert/1.0")
            .build()?;

        let mut request = client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for base currency: {}", e, base))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            ));
        }

        let text = response.text().await?;

        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", base, e))?;

        let updated_at = data
            .time_last_updated
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

        Ok(ExchangeRateSnapshot {
            base: base.to_string(),
            rates: normalize_rates(base, data.rates),
            updated_at,
        })
    }
}
