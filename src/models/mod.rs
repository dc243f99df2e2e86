pub mod fair_price;
pub mod screening;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-company valuation inputs, precomputed upstream by the ingestion
/// pipeline and read as a single row per ticker and as-of date.
///
/// Numeric fields are total: a missing column in the store or the JSON
/// fallback reads as 0.0, never as NaN or null.
///
/// Store columns use flattened lowercase spellings; the mapping lives in
/// `database::store::MODEL_COLUMNS`, so this struct is built there rather
/// than derived FromRow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// 6-digit KRX ticker, unique per as-of date.
    pub ticker: String,
    pub company_name: String,
    pub industry: Option<String>,
    pub sub_industry: Option<String>,
    #[serde(default)]
    pub shares_outstanding: f64,

    // Valuation model outputs, one scalar each in KRW.
    #[serde(default)]
    pub bps_value: f64,
    #[serde(default)]
    pub srim_base: f64,
    #[serde(default)]
    pub srim_decline_10: f64,
    #[serde(default)]
    pub srim_decline_20: f64,
    #[serde(default)]
    pub eps_per_value: f64,
    #[serde(default)]
    pub peg_value: f64,
    #[serde(default)]
    pub roe_eps_value: f64,
    #[serde(default)]
    pub yamaguchi_value: f64,

    // Quartile-like fair-price bounds, precomputed upstream.
    #[serde(default)]
    pub low_range: f64,
    #[serde(default)]
    pub mid_range: f64,
    #[serde(default)]
    pub high_range: f64,

    #[serde(default)]
    pub avg_eps: f64,
    /// 0-10, passed through to results unchanged.
    #[serde(default)]
    pub trust_score: f64,
    /// 0-1, passed through to results unchanged.
    #[serde(default)]
    pub risk_score: f64,

    pub as_of: NaiveDate,
}

/// Latest end-of-day price for a ticker. Built explicitly in the store,
/// like `FinancialSnapshot`, so the NULL-to-0.0 coercion stays in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub ticker: String,
    pub current_price: f64,
    pub as_of: NaiveDate,
}
