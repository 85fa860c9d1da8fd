//! Daily close history from the Yahoo Finance chart API.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::commodity::{PricePoint, PriceProvider};
use crate::providers::util::with_retry;

pub struct YahooProvider {
    base_url: String,
}

impl YahooProvider {
    pub fn new(base_url: &str) -> Self {
        YahooProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[async_trait]
impl PriceProvider for YahooProvider {
    #[instrument(skip(self), fields(provider = "yahoo"))]
    async fn fetch(&self, code: &str, name: &str) -> Result<Vec<PricePoint>> {
        let url = format!(
            "{}/v8/finance/chart/{}?range=10y&interval=1d",
            self.base_url, code
        );
        debug!("Requesting chart history from {}", url);

        let client = reqwest::Client::builder().user_agent("folio/0.1").build()?;
        let response = with_retry(|| async { client.get(&url).send().await }, 3, 500)
            .await
            .with_context(|| format!("Failed to send request for symbol: {code}"))?;

        let chart_response: YahooChartResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Yahoo response for symbol: {code}"))?;

        let item = chart_response
            .chart
            .result
            .and_then(|mut items| (!items.is_empty()).then(|| items.remove(0)))
            .ok_or_else(|| anyhow!("No chart data for symbol: {code}"))?;

        let timestamps = item.timestamp.unwrap_or_default();
        let closes = item
            .indicators
            .and_then(|inds| inds.quote.into_iter().next())
            .and_then(|q| q.close)
            .unwrap_or_default();

        // Bars with a null close (holidays, suspended sessions) are skipped.
        let prices: Vec<PricePoint> = timestamps
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
                let value = Decimal::from_f64_retain(close?)?;
                Some(PricePoint { date, value })
            })
            .collect();

        debug!("Fetched {} close prices for {} ({})", prices.len(), name, code);
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_yahoo_mock_server(
        symbol: &str,
        mock_response: &str,
        status_code: u16,
    ) -> MockServer {
        let mock_server = MockServer::start().await;
        let expected_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(&expected_path))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_chart_fetch() {
        let symbol = "^NSEI";
        // 2024-01-01 and 2024-01-02 UTC
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": {"regularMarketPrice": 110.5, "currency": "INR"},
                    "timestamp": [1704067200, 1704153600],
                    "indicators": {"quote": [{"close": [100.5, 110.5]}]}
                }]
            }
        }"#;
        let mock_server = create_yahoo_mock_server(symbol, mock_response, 200).await;

        let provider = YahooProvider::new(&mock_server.uri());
        let prices = provider.fetch(symbol, "NIFTY50").await.unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(prices[0].value, Decimal::from_f64_retain(100.5).unwrap());
        assert_eq!(prices[1].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[tokio::test]
    async fn test_null_closes_are_skipped() {
        let symbol = "^NSEI";
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": {"regularMarketPrice": 110.5, "currency": "INR"},
                    "timestamp": [1704067200, 1704153600, 1704240000],
                    "indicators": {"quote": [{"close": [100.5, null, 120.5]}]}
                }]
            }
        }"#;
        let mock_server = create_yahoo_mock_server(symbol, mock_response, 200).await;

        let provider = YahooProvider::new(&mock_server.uri());
        let prices = provider.fetch(symbol, "NIFTY50").await.unwrap();

        assert_eq!(prices.len(), 2);
        assert_eq!(prices[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    #[tokio::test]
    async fn test_empty_result_is_an_error() {
        let symbol = "MISSING";
        let mock_response = r#"{"chart": {"result": null}}"#;
        let mock_server = create_yahoo_mock_server(symbol, mock_response, 200).await;

        let provider = YahooProvider::new(&mock_server.uri());
        let result = provider.fetch(symbol, "Missing").await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No chart data for symbol"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_an_error() {
        let symbol = "^NSEI";
        let mock_server = create_yahoo_mock_server(symbol, "not json", 200).await;

        let provider = YahooProvider::new(&mock_server.uri());
        let result = provider.fetch(symbol, "NIFTY50").await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse Yahoo response"));
    }
}
