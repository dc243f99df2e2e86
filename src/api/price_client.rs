// Securities-price API client: end-of-day price/volume records keyed by
// short ticker code and trade date.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{parse_amount, EndOfDayPriceProvider};

/// Calendar days walked back from Dec 31 before giving up on a
/// year-end close (year boundaries include holidays and weekends).
const YEAR_END_CANDIDATE_DAYS: i64 = 10;

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    items: Vec<PriceItem>,
}

#[derive(Debug, Deserialize)]
struct PriceItem {
    #[serde(rename = "basDt")]
    trade_date: String,
    /// Close arrives as a comma-grouped string, empty on non-trading days.
    #[serde(rename = "clpr", default)]
    close_price: String,
}

pub struct PriceApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PriceApiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    async fn fetch_day(&self, ticker: &str, date: Option<NaiveDate>) -> Result<Vec<PriceItem>> {
        let mut request = self
            .client
            .get(format!("{}/getStockPriceInfo", self.base_url))
            .query(&[
                ("serviceKey", self.api_key.as_str()),
                ("likeSrtnCd", ticker),
                ("resultType", "json"),
            ]);
        if let Some(date) = date {
            request = request.query(&[("basDt", date.format("%Y%m%d").to_string())]);
        }

        let response: PriceResponse = request.send().await?.error_for_status()?.json().await?;
        debug!(ticker, items = response.items.len(), "price api response");
        Ok(response.items)
    }
}

#[async_trait]
impl EndOfDayPriceProvider for PriceApiClient {
    async fn latest_close(&self, ticker: &str) -> Result<Option<f64>> {
        let items = self.fetch_day(ticker, None).await?;
        Ok(items
            .iter()
            .find(|item| !item.close_price.trim().is_empty())
            .map(|item| parse_amount(&item.close_price)))
    }

    async fn year_end_close(&self, ticker: &str, year: i32) -> Result<Option<f64>> {
        let year_end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| anyhow::anyhow!("invalid valuation year {year}"))?;

        // Try the most recent candidate dates, first non-empty close wins.
        for offset in 0..YEAR_END_CANDIDATE_DAYS {
            let date = year_end - Duration::days(offset);
            let items = self.fetch_day(ticker, Some(date)).await?;
            if let Some(item) = items.iter().find(|i| !i.close_price.trim().is_empty()) {
                debug!(ticker, date = %item.trade_date, "year-end close found");
                return Ok(Some(parse_amount(&item.close_price)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_response_parsing() {
        // Non-trading days come back with an empty close; the first
        // non-empty close in the list wins.
        let raw = r#"{"items":[
            {"basDt":"20251231","clpr":""},
            {"basDt":"20251230","clpr":"71,300"},
            {"basDt":"20251229","clpr":"70,800"}
        ]}"#;
        let response: PriceResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.items.len(), 3);

        let close = response
            .items
            .iter()
            .find(|i| !i.close_price.trim().is_empty())
            .unwrap();
        assert_eq!(close.trade_date, "20251230");
        assert_eq!(parse_amount(&close.close_price), 71_300.0);
    }

    #[test]
    fn test_empty_response_has_no_items() {
        let response: PriceResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
    }
}
