// Lynch-style growth-at-a-reasonable-price screen keyed on the PEG ratio.

use anyhow::Result;
use tracing::info;

use super::{
    at_most_one_operating_loss, eps_cagr_percent, load_stage_inputs, make_candidate,
    rank_candidates,
};
use crate::analysis::dcf::margin_of_safety;
use crate::database::store::StockStore;
use crate::models::screening::{FundamentalsRow, LynchCriteria, ScreenCandidate};

pub struct LynchScreener {
    store: StockStore,
    criteria: LynchCriteria,
}

impl LynchScreener {
    pub fn new(store: StockStore) -> Self {
        Self {
            store,
            criteria: LynchCriteria::default(),
        }
    }

    pub fn with_criteria(store: StockStore, criteria: LynchCriteria) -> Self {
        Self { store, criteria }
    }

    pub async fn run(&self) -> Result<Vec<ScreenCandidate>> {
        let Some(inputs) = load_stage_inputs(&self.store, "lynch").await? else {
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

        info!(qualified = candidates.len(), "lynch screen complete");
        Ok(rank_candidates(candidates))
    }
}

/// PEG filter plus a growth-rate fair value: Lynch's rule of thumb
/// prices a stock at a PER equal to its growth rate.
fn evaluate(c: &LynchCriteria, row: &FundamentalsRow, price: f64) -> Option<(f64, f64, f64, String)> {
    if !(row.per > 0.0 && row.per <= c.max_per) {
        return None;
    }
    if !at_most_one_operating_loss(&row.operating_income_by_year) {
        return None;
    }

    let growth = eps_cagr_percent(&row.eps_by_year)?;
    if growth < c.min_eps_growth {
        return None;
    }

    let peg = row.per / growth;
    if peg > c.max_peg {
        return None;
    }

    let intrinsic = row.eps_by_year[0] * growth;
    let margin = margin_of_safety(intrinsic, price)?;
    if margin < c.min_margin_of_safety {
        return None;
    }
    // Ranked by inverse PEG: cheapest growth first.
    let score = growth / row.per;

    let reasoning = format!(
        "EPS growth {:.1}%/yr at P/E {:.1} (PEG {:.2}); fair value {:.0}",
        growth, row.per, peg, intrinsic
    );
    Some((intrinsic, margin, score, reasoning))
}
