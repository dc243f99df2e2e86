// Marks-style screen: explicit 10-year DCF per share, bought only when
// the market price sits far below the projected value.

use anyhow::Result;
use tracing::info;

use super::{load_stage_inputs, make_candidate, rank_candidates};
use crate::analysis::dcf::{intrinsic_value_per_share, margin_of_safety, DcfAssumptions};
use crate::database::store::StockStore;
use crate::models::screening::{FundamentalsRow, MarksCriteria, ScreenCandidate};

/// Growth fallback when the FCF history does not support a CAGR.
const DEFAULT_FCF_GROWTH: f64 = 0.05;

pub struct MarksScreener {
    store: StockStore,
    criteria: MarksCriteria,
}

impl MarksScreener {
    pub fn new(store: StockStore) -> Self {
        Self {
            store,
            criteria: MarksCriteria::default(),
        }
    }

    pub fn with_criteria(store: StockStore, criteria: MarksCriteria) -> Self {
        Self { store, criteria }
    }

    pub async fn run(&self) -> Result<Vec<ScreenCandidate>> {
        let Some(inputs) = load_stage_inputs(&self.store, "marks").await? else {
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
            if let Some((intrinsic, margin, reasoning)) = evaluate(&self.criteria, row, price) {
                candidates.push(make_candidate(
                    &inputs, &row.ticker, price, intrinsic, margin, margin, reasoning,
                ));
            }
        }

        info!(qualified = candidates.len(), "marks screen complete");
        Ok(rank_candidates(candidates))
    }
}

fn evaluate(c: &MarksCriteria, row: &FundamentalsRow, price: f64) -> Option<(f64, f64, String)> {
    let fcf = &row.fcf_per_share_by_year;

    // FCF missing for all three years means the candidate cannot be
    // valued; skip it rather than projecting from nothing.
    if fcf.iter().all(|&v| v == 0.0) {
        return None;
    }
    let starting_fcf = (fcf[0] + fcf[1] + fcf[2]) / 3.0;
    if starting_fcf <= 0.0 {
        return None;
    }

    let growth = derive_fcf_growth(fcf).unwrap_or(DEFAULT_FCF_GROWTH);
    let assumptions = DcfAssumptions {
        growth_rate: growth.clamp(0.0, c.max_growth),
        terminal_growth: c.terminal_growth,
        discount_rate: c.discount_rate,
    };

    let intrinsic = intrinsic_value_per_share(starting_fcf, &assumptions);
    let margin = margin_of_safety(intrinsic, price)?;
    if margin < c.min_margin_of_safety {
        return None;
    }

    let reasoning = format!(
        "10y DCF at {:.0}% growth / {:.0}% discount values FCF {:.0}/share at {:.0}",
        assumptions.growth_rate * 100.0,
        c.discount_rate * 100.0,
        starting_fcf,
        intrinsic
    );
    Some((intrinsic, margin, reasoning))
}

/// Two-year FCF-per-share CAGR from the three-year history. None when
/// either endpoint is non-positive.
fn derive_fcf_growth(fcf_by_year: &[f64; 3]) -> Option<f64> {
    let (latest, oldest) = (fcf_by_year[0], fcf_by_year[2]);
    if latest <= 0.0 || oldest <= 0.0 {
        return None;
    }
    Some((latest / oldest).powf(0.5) - 1.0)
}
