// Corporate-filings API client: itemized financial-statement line items
// keyed by an internal account taxonomy, with three time columns
// (current / prior / prior-prior fiscal period).

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{parse_amount, FilingsProvider};

/// One financial-statement line item across the three reported periods.
#[derive(Debug, Clone)]
pub struct LineItem {
    pub account_id: String,
    pub account_name: String,
    pub current: f64,
    pub prior: f64,
    pub prior_prior: f64,
}

#[derive(Debug, Deserialize)]
struct FilingsResponse {
    #[serde(default)]
    list: Vec<FilingsItem>,
}

#[derive(Debug, Deserialize)]
struct FilingsItem {
    #[serde(default)]
    account_id: String,
    #[serde(rename = "account_nm", default)]
    account_name: String,
    #[serde(rename = "thstrm_amount", default)]
    current_amount: String,
    #[serde(rename = "frmtrm_amount", default)]
    prior_amount: String,
    #[serde(rename = "bfefrmtrm_amount", default)]
    prior_prior_amount: String,
}

impl From<FilingsItem> for LineItem {
    fn from(item: FilingsItem) -> Self {
        Self {
            account_id: item.account_id,
            account_name: item.account_name,
            current: parse_amount(&item.current_amount),
            prior: parse_amount(&item.prior_amount),
            prior_prior: parse_amount(&item.prior_prior_amount),
        }
    }
}

pub struct FilingsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FilingsApiClient {
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
}

#[async_trait]
impl FilingsProvider for FilingsApiClient {
    async fn annual_line_items(&self, corp_code: &str, year: i32) -> Result<Vec<LineItem>> {
        let response: FilingsResponse = self
            .client
            .get(format!("{}/fnlttSinglAcntAll.json", self.base_url))
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("corp_code", corp_code),
                ("bsns_year", &year.to_string()),
                ("reprt_code", "11011"), // annual report
                ("fs_div", "CFS"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(corp_code, year, items = response.list.len(), "filings response");
        Ok(response.list.into_iter().map(LineItem::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_conversion() {
        let raw = FilingsItem {
            account_id: "ifrs-full_Equity".to_string(),
            account_name: "자본총계".to_string(),
            current_amount: "52,002,007".to_string(),
            prior_amount: "48,100,000".to_string(),
            prior_prior_amount: "".to_string(),
        };
        let item = LineItem::from(raw);
        assert_eq!(item.current, 52_002_007.0);
        assert_eq!(item.prior, 48_100_000.0);
        // Missing prior-prior period reads as 0, not NaN.
        assert_eq!(item.prior_prior, 0.0);
    }
}
