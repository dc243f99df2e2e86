// Population-wide screening strategies. Every screen follows the same
// shape: cheap debt-ratio pre-filter over the paginated universe,
// batched IN-list fetches for the survivors, numeric filters, then an
// intrinsic-value score with a margin-of-safety bar.

pub mod graham;
pub mod lynch;
pub mod marks;
pub mod quality;
pub mod srim;

pub use graham::GrahamScreener;
pub use lynch::LynchScreener;
pub use marks::MarksScreener;
pub use quality::QualityScreener;
pub use srim::SrimScreener;

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use crate::database::store::StockStore;
use crate::models::screening::{FundamentalsRow, ScreenCandidate, UniverseRow};

/// Debt-ratio ceiling (percent) for general industry.
const GENERAL_DEBT_LIMIT: f64 = 150.0;

/// Banks, insurers and brokers run leveraged balance sheets by design;
/// holding them to the general ceiling would empty the screen.
const FINANCIAL_DEBT_LIMIT: f64 = 600.0;

/// Industry-dependent debt-ratio ceiling for the pre-filter stage.
pub fn debt_ratio_limit(industry: Option<&str>) -> f64 {
    let Some(industry) = industry else {
        return GENERAL_DEBT_LIMIT;
    };
    let lowered = industry.to_lowercase();
    if ["bank", "insurance", "securities", "financ"]
        .iter()
        .any(|kw| lowered.contains(kw))
    {
        FINANCIAL_DEBT_LIMIT
    } else {
        GENERAL_DEBT_LIMIT
    }
}

/// Stage-1 filter: keep companies under their industry debt ceiling.
pub fn apply_debt_prefilter(universe: Vec<UniverseRow>) -> Vec<UniverseRow> {
    universe
        .into_iter()
        .filter(|row| row.debt_ratio <= debt_ratio_limit(row.industry.as_deref()))
        .collect()
}

pub fn average3(values: &[f64; 3]) -> f64 {
    (values[0] + values[1] + values[2]) / 3.0
}

/// Profitability consistency: at most one of the three fiscal years may
/// show an operating loss.
pub fn at_most_one_operating_loss(operating_income: &[f64; 3]) -> bool {
    operating_income.iter().filter(|&&v| v < 0.0).count() <= 1
}

/// Dividend paid in each of the last three fiscal years.
pub fn has_dividend_continuity(dividends: &[f64; 3]) -> bool {
    dividends.iter().all(|&d| d > 0.0)
}

/// Two-year compound annual EPS growth in percent, from oldest (index 2)
/// to latest (index 0). None when either endpoint is non-positive.
pub fn eps_cagr_percent(eps_by_year: &[f64; 3]) -> Option<f64> {
    let (latest, oldest) = (eps_by_year[0], eps_by_year[2]);
    if latest <= 0.0 || oldest <= 0.0 {
        return None;
    }
    Some(((latest / oldest).powf(0.5) - 1.0) * 100.0)
}

/// Everything a screen needs after the fetch stages: validated
/// fundamentals, latest prices and display names, joined in-process by
/// ticker.
pub(crate) struct StageInputs {
    pub fundamentals: Vec<FundamentalsRow>,
    pub prices: HashMap<String, f64>,
    pub names: HashMap<String, (String, Option<String>)>,
    pub tickers: Vec<String>,
}

/// Run the common fetch stages: paginated universe, debt pre-filter,
/// then batched dependent lookups for the survivors. Returns None when
/// any stage leaves no candidates, so the screen can end early with an
/// explicit empty result instead of empty-set arithmetic.
pub(crate) async fn load_stage_inputs(
    store: &StockStore,
    screen: &str,
) -> Result<Option<StageInputs>> {
    let universe = store.fetch_universe().await?;
    info!(screen, total = universe.len(), "universe loaded");

    let survivors = apply_debt_prefilter(universe);
    if survivors.is_empty() {
        info!(screen, "no stocks pass the debt pre-filter");
        return Ok(None);
    }

    let tickers: Vec<String> = survivors.iter().map(|r| r.ticker.clone()).collect();
    let names: HashMap<String, (String, Option<String>)> = survivors
        .into_iter()
        .map(|r| (r.ticker, (r.company_name, r.industry)))
        .collect();

    let fundamentals = store.fetch_fundamentals(&tickers).await?;
    if fundamentals.is_empty() {
        info!(screen, "no fundamentals for surviving candidates");
        return Ok(None);
    }
    let prices = store.fetch_prices_for(&tickers).await?;

    Ok(Some(StageInputs {
        fundamentals,
        prices,
        names,
        tickers,
    }))
}

/// Assemble a ranked candidate from per-stock evaluation output.
pub(crate) fn make_candidate(
    inputs: &StageInputs,
    ticker: &str,
    price: f64,
    intrinsic: f64,
    margin: f64,
    score: f64,
    reasoning: String,
) -> ScreenCandidate {
    let (company_name, industry) = inputs
        .names
        .get(ticker)
        .cloned()
        .unwrap_or((String::new(), None));
    ScreenCandidate {
        ticker: ticker.to_string(),
        company_name,
        industry,
        current_price: price,
        intrinsic_value: intrinsic,
        margin_of_safety: margin,
        score,
        rank: 0,
        reasoning,
    }
}

/// Sort by score (descending) and assign 1-based ranks.
pub fn rank_candidates(mut candidates: Vec<ScreenCandidate>) -> Vec<ScreenCandidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.rank = index + 1;
    }
    candidates
}
