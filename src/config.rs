use std::path::PathBuf;

/// Runtime configuration, read once from the environment (after
/// dotenvy has loaded `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// When set, the JSON snapshot fallback is used instead of the store.
    pub snapshot_dir: Option<PathBuf>,
    pub price_api_base: String,
    pub price_api_key: String,
    pub filings_api_base: String,
    pub filings_api_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:db/stocks.db".to_string()),
            snapshot_dir: std::env::var("SNAPSHOT_DIR").ok().map(PathBuf::from),
            price_api_base: std::env::var("PRICE_API_BASE").unwrap_or_else(|_| {
                "https://apis.data.go.kr/1160100/service/GetStockSecuritiesInfoService".to_string()
            }),
            price_api_key: std::env::var("PRICE_API_KEY").unwrap_or_default(),
            filings_api_base: std::env::var("FILINGS_API_BASE")
                .unwrap_or_else(|_| "https://opendart.fss.or.kr/api".to_string()),
            filings_api_key: std::env::var("FILINGS_API_KEY").unwrap_or_default(),
        }
    }
}
