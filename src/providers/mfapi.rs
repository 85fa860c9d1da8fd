//! Mutual fund NAV history from the mfapi.in scheme API.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::core::commodity::{PricePoint, PriceProvider};
use crate::providers::util::with_retry;

pub struct MfapiProvider {
    base_url: String,
}

impl MfapiProvider {
    pub fn new(base_url: &str) -> Self {
        MfapiProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MfapiResponse {
    #[serde(default)]
    data: Vec<MfapiNav>,
}

#[derive(Debug, Deserialize)]
struct MfapiNav {
    date: String,
    nav: String,
}

#[async_trait]
impl PriceProvider for MfapiProvider {
    #[instrument(skip(self), fields(provider = "mfapi"))]
    async fn fetch(&self, code: &str, name: &str) -> Result<Vec<PricePoint>> {
        let url = format!("{}/mf/{}", self.base_url, code);
        debug!("Requesting NAV history from {}", url);

        let client = reqwest::Client::builder().user_agent("folio/0.1").build()?;
        let response = with_retry(|| async { client.get(&url).send().await }, 3, 500)
            .await
            .with_context(|| format!("Failed to send request for scheme: {code}"))?;

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for scheme: {code}"))?;

        if response_text.trim().is_empty() {
            return Err(anyhow!("Received empty response for scheme: {code}"));
        }

        let mfapi_response: MfapiResponse =
            serde_json::from_str(&response_text).with_context(|| {
                format!("Failed to parse mfapi response for scheme: {code}. Response: '{response_text}'")
            })?;

        // NAV entries arrive newest first, dated dd-mm-yyyy.
        let mut prices = Vec::with_capacity(mfapi_response.data.len());
        for nav in mfapi_response.data.into_iter().rev() {
            let date = NaiveDate::parse_from_str(&nav.date, "%d-%m-%Y")
                .with_context(|| format!("Invalid NAV date '{}' for scheme: {code}", nav.date))?;
            let value = Decimal::from_str(&nav.nav)
                .with_context(|| format!("Invalid NAV value '{}' for scheme: {code}", nav.nav))?;
            prices.push(PricePoint { date, value });
        }

        debug!(
            "Fetched {} NAV entries for {} ({})",
            prices.len(),
            name,
            code
        );
        Ok(prices)
    }
}
