// Static JSON snapshot fallback, schema-identical to the live store
// projection. Used as a drop-in substitute when the store is unavailable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{SnapshotSource, StoreError};
use crate::models::{FinancialSnapshot, PriceRecord};

const SNAPSHOTS_FILE: &str = "snapshots.json";
const PRICES_FILE: &str = "prices.json";

/// Reads `snapshots.json` and `prices.json` from a directory, each a
/// JSON object keyed by ticker.
pub struct JsonSnapshotStore {
    dir: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn load_map<T: serde::de::DeserializeOwned>(
        &self,
        file: &str,
    ) -> Result<HashMap<String, T>, StoreError> {
        let path: &Path = &self.dir.join(file);
        let raw = tokio::fs::read_to_string(path).await?;
        let map = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "snapshot file loaded");
        Ok(map)
    }
}

#[async_trait]
impl SnapshotSource for JsonSnapshotStore {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<Option<FinancialSnapshot>, StoreError> {
        let mut map: HashMap<String, FinancialSnapshot> = self.load_map(SNAPSHOTS_FILE).await?;
        Ok(map.remove(ticker))
    }

    async fn fetch_latest_price(&self, ticker: &str) -> Result<Option<PriceRecord>, StoreError> {
        let mut map: HashMap<String, PriceRecord> = self.load_map(PRICES_FILE).await?;
        Ok(map.remove(ticker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fallback_reads_snapshot_and_price() {
        let dir = tempfile::tempdir().unwrap();

        let snapshots = serde_json::json!({
            "005930": {
                "ticker": "005930",
                "company_name": "Samsung Electronics",
                "industry": "Electronics",
                "sub_industry": null,
                "bps_value": 12000.0,
                "srim_base": 15000.0,
                "mid_range": 13500.0,
                "as_of": "2025-12-31"
            }
        });
        let prices = serde_json::json!({
            "005930": { "ticker": "005930", "current_price": 11000.0, "as_of": "2026-01-02" }
        });
        std::fs::write(dir.path().join(SNAPSHOTS_FILE), snapshots.to_string()).unwrap();
        std::fs::write(dir.path().join(PRICES_FILE), prices.to_string()).unwrap();

        let store = JsonSnapshotStore::new(dir.path());

        let snapshot = store.fetch_snapshot("005930").await.unwrap().unwrap();
        assert_eq!(snapshot.company_name, "Samsung Electronics");
        // Absent numeric fields default to 0.0, never null/NaN.
        assert_eq!(snapshot.peg_value, 0.0);
        assert_eq!(snapshot.srim_base, 15000.0);

        let price = store.fetch_latest_price("005930").await.unwrap().unwrap();
        assert_eq!(price.current_price, 11000.0);

        let missing = store.fetch_snapshot("000000").await.unwrap();
        assert!(missing.is_none());
    }
}
