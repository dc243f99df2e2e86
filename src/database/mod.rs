pub mod snapshot_file;
pub mod store;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::{FinancialSnapshot, PriceRecord};

/// Accessor-boundary error taxonomy. "Not found" is not an error: it
/// surfaces as `Ok(None)` from the source methods.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store fetch failed: {0}")]
    Fetch(#[from] sqlx::Error),
    #[error("store fetch failed after {attempts} attempts: {source}")]
    RetriesExhausted { attempts: u32, source: sqlx::Error },
    #[error("snapshot file unreadable: {0}")]
    SnapshotFile(#[from] std::io::Error),
    #[error("snapshot file malformed: {0}")]
    SnapshotParse(#[from] serde_json::Error),
}

/// A source of normalized valuation snapshots and latest prices.
///
/// The live store and the static JSON fallback implement the same
/// contract, so callers can select either path without changing any
/// downstream logic.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self, ticker: &str) -> Result<Option<FinancialSnapshot>, StoreError>;
    async fn fetch_latest_price(&self, ticker: &str) -> Result<Option<PriceRecord>, StoreError>;
}

/// Open a connection pool against the configured SQLite store.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create the store tables when they do not exist yet. Used by the CLI
/// on first run and by the integration tests against in-memory SQLite.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stock_snapshots (
            ticker TEXT NOT NULL,
            company_name TEXT NOT NULL,
            industry TEXT,
            sub_industry TEXT,
            shares_outstanding REAL,
            bpsbase REAL,
            srimbase REAL,
            srimdecline10 REAL,
            srimdecline20 REAL,
            epsper REAL,
            pegbase REAL,
            roeeps REAL,
            yamaguchi REAL,
            lowrange REAL,
            midrange REAL,
            highrange REAL,
            avgeps REAL,
            trustscore REAL,
            riskscore REAL,
            as_of TEXT NOT NULL,
            PRIMARY KEY (ticker, as_of)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stock_prices (
            ticker TEXT NOT NULL,
            current_price REAL NOT NULL,
            as_of TEXT NOT NULL,
            PRIMARY KEY (ticker, as_of)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stock_universe (
            ticker TEXT PRIMARY KEY,
            company_name TEXT NOT NULL,
            industry TEXT,
            debt_ratio REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stock_fundamentals (
            ticker TEXT PRIMARY KEY,
            shares_outstanding REAL,
            per REAL,
            pbr REAL,
            eps_y1 REAL, eps_y2 REAL, eps_y3 REAL,
            roe_y1 REAL, roe_y2 REAL, roe_y3 REAL,
            op_income_y1 REAL, op_income_y2 REAL, op_income_y3 REAL,
            dividend_y1 REAL, dividend_y2 REAL, dividend_y3 REAL,
            fcf_ps_y1 REAL, fcf_ps_y2 REAL, fcf_ps_y3 REAL,
            ncav_per_share REAL,
            bps REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
