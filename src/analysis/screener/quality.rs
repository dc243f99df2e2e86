// Quality screen: durable profitability at a sane price, ranked by ROE.

use anyhow::Result;
use tracing::info;

use super::{average3, has_dividend_continuity, load_stage_inputs, make_candidate, rank_candidates};
use crate::analysis::dcf::margin_of_safety;
use crate::database::store::StockStore;
use crate::models::screening::{FundamentalsRow, QualityCriteria, ScreenCandidate};

pub struct QualityScreener {
    store: StockStore,
    criteria: QualityCriteria,
}

impl QualityScreener {
    pub fn new(store: StockStore) -> Self {
        Self {
            store,
            criteria: QualityCriteria::default(),
        }
    }

    pub fn with_criteria(store: StockStore, criteria: QualityCriteria) -> Self {
        Self { store, criteria }
    }

    pub async fn run(&self) -> Result<Vec<ScreenCandidate>> {
        let Some(inputs) = load_stage_inputs(&self.store, "quality").await? else {
            return Ok(Vec::new());
        };

        let mut candidates = Vec::new();
        for row in &inputs.fundamentals {
            let Some(&price) = inputs.prices.get(&row.ticker) else {
                continue;
            };
            if price <= 0.0 {
                continue;
            }
            if let Some((intrinsic, margin, score, reasoning)) = evaluate(&self.criteria, row, price)
            {
                candidates.push(make_candidate(
                    &inputs, &row.ticker, price, intrinsic, margin, score, reasoning,
                ));
            }
        }

        info!(qualified = candidates.len(), "quality screen complete");
        Ok(rank_candidates(candidates))
    }
}

fn evaluate(c: &QualityCriteria, row: &FundamentalsRow, price: f64) -> Option<(f64, f64, f64, String)> {
    // ROE is a required field for this screen; a row with no ROE
    // history averages to 0 and fails the floor rather than passing
    // by accident.
    let avg_roe = average3(&row.roe_by_year);
    if avg_roe < c.min_avg_roe {
        return None;
    }
    // Quality demands profitability in every one of the three years.
    if row.operating_income_by_year.iter().any(|&v| v <= 0.0) {
        return None;
    }
    if c.require_dividend_continuity && !has_dividend_continuity(&row.dividend_by_year) {
        return None;
    }
    if !(row.per > 0.0 && row.per <= c.max_per) {
        return None;
    }
    if row.bps <= 0.0 {
        return None;
    }

    // Book value scaled by excess profitability over the required return.
    let intrinsic = row.bps * (avg_roe / c.required_return);
    let margin = margin_of_safety(intrinsic, price)?;
    if margin < c.min_margin_of_safety {
        return None;
    }

    let reasoning = format!(
        "3y avg ROE {:.1}% with unbroken operating profit; P/E {:.1}; ROE-scaled value {:.0}",
        avg_roe, row.per, intrinsic
    );
    Some((intrinsic, margin, avg_roe, reasoning))
}
