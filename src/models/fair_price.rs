// Fair-price aggregation result types

use serde::{Deserialize, Serialize};

// Fixed model names. The store keeps one lowercase/flattened column per
// model; see database::store::MODEL_COLUMNS for the mapping.
pub const MODEL_BPS: &str = "BPS-based";
pub const MODEL_SRIM_BASE: &str = "S-RIM base";
pub const MODEL_SRIM_DECLINE_10: &str = "S-RIM decline 10%";
pub const MODEL_SRIM_DECLINE_20: &str = "S-RIM decline 20%";
pub const MODEL_EPS_PER: &str = "EPS x PER";
pub const MODEL_PEG: &str = "PEG-based";
pub const MODEL_ROE_EPS: &str = "ROE x EPS";
pub const MODEL_YAMAGUCHI: &str = "Yamaguchi";

/// Semantic bucket for one valuation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelCategory {
    AssetBased,
    EarningsBased,
    Mixed,
    /// S-RIM decline scenarios: informational only, never in aggregate stats.
    SrimScenario,
}

/// Hardcoded, total mapping from model name to bucket. Adding a model
/// means extending this match, not inferring placement from the value.
pub fn model_category(name: &str) -> Option<ModelCategory> {
    match name {
        MODEL_BPS => Some(ModelCategory::AssetBased),
        MODEL_EPS_PER | MODEL_PEG | MODEL_ROE_EPS => Some(ModelCategory::EarningsBased),
        MODEL_SRIM_BASE | MODEL_YAMAGUCHI => Some(ModelCategory::Mixed),
        MODEL_SRIM_DECLINE_10 | MODEL_SRIM_DECLINE_20 => Some(ModelCategory::SrimScenario),
        _ => None,
    }
}

/// Why a model output was flagged as an outlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlierReason {
    #[serde(rename = "negative_or_zero")]
    NegativeOrZero,
    #[serde(rename = "value_range")]
    ValueRange,
}

/// A named scalar output of one valuation formula.
#[derive(Debug, Clone, Serialize)]
pub struct ModelItem {
    pub name: &'static str,
    pub value: f64,
    /// True for the S-RIM decline scenarios (excluded from statistics).
    pub is_reference: bool,
    /// Populated only when the item is flagged as an outlier.
    pub reason: Option<OutlierReason>,
}

impl ModelItem {
    pub fn new(name: &'static str, value: f64, is_reference: bool) -> Self {
        Self {
            name,
            value,
            is_reference,
            reason: None,
        }
    }
}

/// Model outputs partitioned into semantic buckets.
///
/// `all` is the union of the three non-reference buckets and never
/// includes `srim_scenarios`; every item lives in exactly one bucket.
#[derive(Debug, Clone, Serialize)]
pub struct CategorizedModels {
    pub asset_based: Vec<ModelItem>,
    pub earnings_based: Vec<ModelItem>,
    pub mixed_models: Vec<ModelItem>,
    pub srim_scenarios: Vec<ModelItem>,
    pub all: Vec<ModelItem>,
}

/// Outlier detection output for one company.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub outliers: Vec<ModelItem>,
    pub has_outliers: bool,
    /// Lower median of the positive model values the flags were judged against.
    pub median: f64,
}

/// PER sanity classification shown as a user-facing caveat. Never alters
/// the numeric fair-price range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerHealth {
    #[serde(rename = "negative")]
    Negative,
    #[serde(rename = "extreme_high")]
    ExtremeHigh,
    #[serde(rename = "normal")]
    Normal,
}

/// Engine output for a single-company lookup. Derived per request,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CalculatedResults {
    pub ticker: String,
    pub company_name: String,
    pub models: CategorizedModels,
    pub outliers: OutlierReport,
    pub low_range: f64,
    pub mid_range: f64,
    pub high_range: f64,
    pub trust_score: f64,
    pub risk_score: f64,
    pub current_price: f64,
    /// current_price / mid_range; None when the mid range is not positive.
    pub price_ratio: Option<f64>,
    pub per_health: PerHealth,
}
