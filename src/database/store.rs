// Live-store accessor: single-table queries only, joins happen in-process.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use super::{SnapshotSource, StoreError};
use crate::models::fair_price::{
    MODEL_BPS, MODEL_EPS_PER, MODEL_PEG, MODEL_ROE_EPS, MODEL_SRIM_BASE, MODEL_SRIM_DECLINE_10,
    MODEL_SRIM_DECLINE_20, MODEL_YAMAGUCHI,
};
use crate::models::screening::{FundamentalsRow, UniverseRow};
use crate::models::{FinancialSnapshot, PriceRecord};

/// Universe pagination page size. A short page terminates the loop.
pub const PAGE_SIZE: usize = 1_000;

/// Maximum tickers per IN-list batch; the store rejects larger
/// parameter lists, so this is an operational constraint.
pub const IN_BATCH_SIZE: usize = 1_000;

const PRICE_FETCH_ATTEMPTS: u32 = 3;

/// Canonical model name -> store column. The store keeps model fields
/// in lowercase/flattened form; this table is the only place that
/// spelling lives.
pub const MODEL_COLUMNS: &[(&str, &str)] = &[
    (MODEL_BPS, "bpsbase"),
    (MODEL_SRIM_BASE, "srimbase"),
    (MODEL_SRIM_DECLINE_10, "srimdecline10"),
    (MODEL_SRIM_DECLINE_20, "srimdecline20"),
    (MODEL_EPS_PER, "epsper"),
    (MODEL_PEG, "pegbase"),
    (MODEL_ROE_EPS, "roeeps"),
    (MODEL_YAMAGUCHI, "yamaguchi"),
];

fn model_column(name: &str) -> &'static str {
    MODEL_COLUMNS
        .iter()
        .find(|(canonical, _)| *canonical == name)
        .map(|(_, column)| *column)
        .unwrap_or("")
}

/// NULL, absent, or non-numeric columns read as 0.0 so downstream
/// arithmetic stays total. NaN never leaves this boundary.
fn num(row: &SqliteRow, column: &str) -> f64 {
    row.try_get::<Option<f64>, _>(column)
        .ok()
        .flatten()
        .unwrap_or(0.0)
}

#[derive(Clone)]
pub struct StockStore {
    pool: SqlitePool,
}

impl StockStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn snapshot_from_row(row: &SqliteRow) -> FinancialSnapshot {
        FinancialSnapshot {
            ticker: row.get("ticker"),
            company_name: row.get("company_name"),
            industry: row.try_get("industry").ok(),
            sub_industry: row.try_get("sub_industry").ok(),
            shares_outstanding: num(row, "shares_outstanding"),
            bps_value: num(row, model_column(MODEL_BPS)),
            srim_base: num(row, model_column(MODEL_SRIM_BASE)),
            srim_decline_10: num(row, model_column(MODEL_SRIM_DECLINE_10)),
            srim_decline_20: num(row, model_column(MODEL_SRIM_DECLINE_20)),
            eps_per_value: num(row, model_column(MODEL_EPS_PER)),
            peg_value: num(row, model_column(MODEL_PEG)),
            roe_eps_value: num(row, model_column(MODEL_ROE_EPS)),
            yamaguchi_value: num(row, model_column(MODEL_YAMAGUCHI)),
            low_range: num(row, "lowrange"),
            mid_range: num(row, "midrange"),
            high_range: num(row, "highrange"),
            avg_eps: num(row, "avgeps"),
            trust_score: num(row, "trustscore"),
            risk_score: num(row, "riskscore"),
            as_of: row
                .try_get::<NaiveDate, _>("as_of")
                .unwrap_or(NaiveDate::MIN),
        }
    }

    /// Full company universe, paginated page-by-page. Each page's row
    /// count detects the final page; pages are fetched sequentially to
    /// bound memory and respect store-side row limits.
    pub async fn fetch_universe(&self) -> Result<Vec<UniverseRow>, StoreError> {
        let mut rows = Vec::new();
        let mut page: i64 = 0;
        loop {
            let batch = sqlx::query(
                "SELECT ticker, company_name, industry, debt_ratio
                 FROM stock_universe ORDER BY ticker LIMIT ?1 OFFSET ?2",
            )
            .bind(PAGE_SIZE as i64)
            .bind(page * PAGE_SIZE as i64)
            .fetch_all(&self.pool)
            .await?;

            let fetched = batch.len();
            for row in &batch {
                rows.push(UniverseRow {
                    ticker: row.get("ticker"),
                    company_name: row.get("company_name"),
                    industry: row.try_get("industry").ok(),
                    debt_ratio: num(row, "debt_ratio"),
                });
            }
            debug!(page, fetched, "universe page loaded");
            if fetched < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(rows)
    }

    /// Dependent numeric fields for the surviving candidate set, fetched
    /// in sequential IN-list batches. Rows missing required fields
    /// (shares outstanding) are skipped, never zero-filled.
    pub async fn fetch_fundamentals(
        &self,
        tickers: &[String],
    ) -> Result<Vec<FundamentalsRow>, StoreError> {
        let mut rows = Vec::new();
        for chunk in tickers.chunks(IN_BATCH_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let query = format!(
                "SELECT * FROM stock_fundamentals WHERE ticker IN ({placeholders}) ORDER BY ticker"
            );
            let mut q = sqlx::query(&query);
            for ticker in chunk {
                q = q.bind(ticker);
            }
            let batch = q.fetch_all(&self.pool).await?;
            for row in &batch {
                match fundamentals_from_row(row) {
                    Some(fundamentals) => rows.push(fundamentals),
                    None => {
                        let ticker: String = row.get("ticker");
                        warn!(ticker = %ticker, "skipping candidate with missing required fields");
                    }
                }
            }
        }
        Ok(rows)
    }

    /// Latest price per ticker for the candidate set, batched the same
    /// way as the fundamentals fetch and joined in-process by ticker.
    pub async fn fetch_prices_for(
        &self,
        tickers: &[String],
    ) -> Result<HashMap<String, f64>, StoreError> {
        let mut prices = HashMap::new();
        for chunk in tickers.chunks(IN_BATCH_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let query = format!(
                "SELECT p.ticker, p.current_price FROM stock_prices p
                 WHERE p.ticker IN ({placeholders})
                   AND p.as_of = (SELECT MAX(as_of) FROM stock_prices WHERE ticker = p.ticker)"
            );
            let mut q = sqlx::query(&query);
            for ticker in chunk {
                q = q.bind(ticker);
            }
            let batch = q.fetch_all(&self.pool).await?;
            for row in &batch {
                prices.insert(row.get::<String, _>("ticker"), num(row, "current_price"));
            }
        }
        Ok(prices)
    }

    /// Latest valuation snapshot per ticker for the candidate set
    /// (used by the S-RIM screen), batched IN-list lookups.
    pub async fn fetch_snapshots_for(
        &self,
        tickers: &[String],
    ) -> Result<Vec<FinancialSnapshot>, StoreError> {
        let mut snapshots = Vec::new();
        for chunk in tickers.chunks(IN_BATCH_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let query = format!(
                "SELECT * FROM stock_snapshots s
                 WHERE s.ticker IN ({placeholders})
                   AND s.as_of = (SELECT MAX(as_of) FROM stock_snapshots WHERE ticker = s.ticker)"
            );
            let mut q = sqlx::query(&query);
            for ticker in chunk {
                q = q.bind(ticker);
            }
            let batch = q.fetch_all(&self.pool).await?;
            for row in &batch {
                snapshots.push(Self::snapshot_from_row(row));
            }
        }
        Ok(snapshots)
    }
}

fn fundamentals_from_row(row: &SqliteRow) -> Option<FundamentalsRow> {
    let shares_outstanding = row
        .try_get::<Option<f64>, _>("shares_outstanding")
        .ok()
        .flatten()?;
    if shares_outstanding <= 0.0 {
        return None;
    }

    Some(FundamentalsRow {
        ticker: row.get("ticker"),
        shares_outstanding,
        per: num(row, "per"),
        pbr: num(row, "pbr"),
        eps_by_year: [num(row, "eps_y1"), num(row, "eps_y2"), num(row, "eps_y3")],
        roe_by_year: [num(row, "roe_y1"), num(row, "roe_y2"), num(row, "roe_y3")],
        operating_income_by_year: [
            num(row, "op_income_y1"),
            num(row, "op_income_y2"),
            num(row, "op_income_y3"),
        ],
        dividend_by_year: [
            num(row, "dividend_y1"),
            num(row, "dividend_y2"),
            num(row, "dividend_y3"),
        ],
        fcf_per_share_by_year: [
            num(row, "fcf_ps_y1"),
            num(row, "fcf_ps_y2"),
            num(row, "fcf_ps_y3"),
        ],
        ncav_per_share: num(row, "ncav_per_share"),
        bps: num(row, "bps"),
    })
}

#[async_trait]
impl SnapshotSource for StockStore {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<Option<FinancialSnapshot>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM stock_snapshots WHERE ticker = ?1 ORDER BY as_of DESC LIMIT 1",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::snapshot_from_row))
    }

    /// Single-stock price lookup is the one accessor with retry:
    /// 3 attempts with linear backoff (1s x attempt number).
    async fn fetch_latest_price(&self, ticker: &str) -> Result<Option<PriceRecord>, StoreError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = sqlx::query(
                "SELECT ticker, current_price, as_of FROM stock_prices
                 WHERE ticker = ?1 ORDER BY as_of DESC LIMIT 1",
            )
            .bind(ticker)
            .fetch_optional(&self.pool)
            .await;

            match result {
                Ok(row) => {
                    return Ok(row.map(|r| PriceRecord {
                        ticker: r.get("ticker"),
                        current_price: num(&r, "current_price"),
                        as_of: r.try_get::<NaiveDate, _>("as_of").unwrap_or(NaiveDate::MIN),
                    }))
                }
                Err(e) => {
                    if attempt >= PRICE_FETCH_ATTEMPTS {
                        return Err(StoreError::RetriesExhausted {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    warn!(ticker, attempt, error = %e, "price fetch failed, retrying");
                    tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_column_mapping_is_total() {
        for (name, _) in MODEL_COLUMNS {
            assert!(!model_column(name).is_empty(), "{name} has no column");
        }
        assert_eq!(model_column(MODEL_PEG), "pegbase");
        assert_eq!(model_column("unknown model"), "");
    }

    #[test]
    fn test_batch_chunking_covers_all_tickers() {
        let tickers: Vec<String> = (0..2_500).map(|i| format!("{i:06}")).collect();
        let chunks: Vec<_> = tickers.chunks(IN_BATCH_SIZE).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1_000);
        assert_eq!(chunks[2].len(), 500);
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, tickers.len());
    }
}
