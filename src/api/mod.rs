pub mod filings_client;
pub mod price_client;

use anyhow::Result;
use async_trait::async_trait;

use filings_client::LineItem;

/// End-of-day price source (securities-price API).
#[async_trait]
pub trait EndOfDayPriceProvider: Send + Sync {
    /// Most recent close for a ticker, None when the ticker is unknown.
    async fn latest_close(&self, ticker: &str) -> Result<Option<f64>>;

    /// Year-end close for valuation lookups. Markets close over the
    /// year boundary, so implementations walk back from Dec 31 and take
    /// the first date with a non-empty close.
    async fn year_end_close(&self, ticker: &str, year: i32) -> Result<Option<f64>>;
}

/// Corporate-filings source returning itemized financial-statement
/// line items for one fiscal year.
#[async_trait]
pub trait FilingsProvider: Send + Sync {
    async fn annual_line_items(&self, corp_code: &str, year: i32) -> Result<Vec<LineItem>>;
}

/// Filing amounts arrive as comma-grouped strings ("1,234,567"), often
/// empty or dashed for missing periods. Missing and malformed both read
/// as 0.0 to keep downstream arithmetic total.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234,567"), 1_234_567.0);
        assert_eq!(parse_amount("-42,000"), -42_000.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("-"), 0.0);
        assert_eq!(parse_amount(" 300 "), 300.0);
    }
}
