// Modified-Graham value screen: cheap earnings power plus liquidation
// value, bought only with a margin of safety.

use anyhow::Result;
use tracing::info;

use super::{
    at_most_one_operating_loss, average3, has_dividend_continuity, load_stage_inputs,
    make_candidate, rank_candidates,
};
use crate::analysis::dcf::margin_of_safety;
use crate::database::store::StockStore;
use crate::models::screening::{FundamentalsRow, GrahamCriteria, ScreenCandidate};

/// Multiplier applied to 3-year average EPS for the earnings-power leg
/// of the modified-Graham intrinsic value.
const EPS_MULTIPLIER: f64 = 8.0;

pub struct GrahamScreener {
    store: StockStore,
    criteria: GrahamCriteria,
}

impl GrahamScreener {
    pub fn new(store: StockStore) -> Self {
        Self {
            store,
            criteria: GrahamCriteria::default(),
        }
    }

    pub fn with_criteria(store: StockStore, criteria: GrahamCriteria) -> Self {
        Self { store, criteria }
    }

    pub async fn run(&self) -> Result<Vec<ScreenCandidate>> {
        let Some(inputs) = load_stage_inputs(&self.store, "graham").await? else {
            return Ok(Vec::new());
        };

        let mut candidates = Vec::new();
        for row in &inputs.fundamentals {
            // A candidate with missing price data is skipped, never fatal.
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

        info!(qualified = candidates.len(), "graham screen complete");
        Ok(rank_candidates(candidates))
    }
}

/// Per-candidate filter and intrinsic-value scoring. Pure over the row
/// and criteria; returns None when any filter fails.
fn evaluate(c: &GrahamCriteria, row: &FundamentalsRow, price: f64) -> Option<(f64, f64, String)> {
    if !(row.per > 0.0 && row.per <= c.max_per) {
        return None;
    }
    if !(row.pbr > 0.0 && row.pbr <= c.max_pbr) {
        return None;
    }
    if !at_most_one_operating_loss(&row.operating_income_by_year) {
        return None;
    }
    if c.require_dividend_continuity && !has_dividend_continuity(&row.dividend_by_year) {
        return None;
    }

    let avg_eps = average3(&row.eps_by_year);
    if avg_eps <= 0.0 {
        return None;
    }

    // Earnings power and liquidation value, averaged.
    let intrinsic = (avg_eps * EPS_MULTIPLIER + row.ncav_per_share) / 2.0;
    let margin = margin_of_safety(intrinsic, price)?;
    if margin < c.min_margin_of_safety {
        return None;
    }

    let reasoning = format!(
        "P/E {:.1}, P/B {:.2}; 3y avg EPS {:.0}, NCAV/share {:.0}; margin of safety {:.0}%",
        row.per,
        row.pbr,
        avg_eps,
        row.ncav_per_share,
        margin * 100.0
    );
    Some((intrinsic, margin, reasoning))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::screening::GrahamCriteria;

    fn row(per: f64, pbr: f64, eps: [f64; 3], ncav: f64) -> FundamentalsRow {
        FundamentalsRow {
            ticker: "005930".to_string(),
            shares_outstanding: 1_000_000.0,
            per,
            pbr,
            eps_by_year: eps,
            roe_by_year: [10.0, 11.0, 12.0],
            operating_income_by_year: [100.0, 120.0, 110.0],
            dividend_by_year: [100.0, 100.0, 100.0],
            fcf_per_share_by_year: [500.0, 450.0, 400.0],
            ncav_per_share: ncav,
            bps: 12_000.0,
        }
    }

    #[test]
    fn test_undervalued_candidate_passes() {
        let c = GrahamCriteria::default();
        // Intrinsic = (1000 * 8 + 6000) / 2 = 7000; price 4000 -> margin ~43%.
        let result = evaluate(&c, &row(8.0, 0.8, [1_000.0, 1_000.0, 1_000.0], 6_000.0), 4_000.0);
        let (intrinsic, margin, _) = result.expect("should qualify");
        assert_eq!(intrinsic, 7_000.0);
        assert!(margin > 0.30);
    }

    #[test]
    fn test_thin_margin_is_rejected() {
        let c = GrahamCriteria::default();
        // Same intrinsic value of 7000, price 6000 -> margin ~14% < 30%.
        let result = evaluate(&c, &row(8.0, 0.8, [1_000.0, 1_000.0, 1_000.0], 6_000.0), 6_000.0);
        assert!(result.is_none());
    }

    #[test]
    fn test_valuation_bounds_enforced() {
        let c = GrahamCriteria::default();
        let eps = [1_000.0, 1_000.0, 1_000.0];
        assert!(evaluate(&c, &row(12.0, 0.8, eps, 6_000.0), 1_000.0).is_none()); // PER too high
        assert!(evaluate(&c, &row(8.0, 1.4, eps, 6_000.0), 1_000.0).is_none()); // PBR too high
        assert!(evaluate(&c, &row(0.0, 0.8, eps, 6_000.0), 1_000.0).is_none()); // PER missing/zero
    }

    #[test]
    fn test_repeated_operating_losses_rejected() {
        let mut r = row(8.0, 0.8, [1_000.0, 1_000.0, 1_000.0], 6_000.0);
        r.operating_income_by_year = [100.0, -10.0, -20.0];
        assert!(evaluate(&GrahamCriteria::default(), &r, 1_000.0).is_none());
    }

    #[test]
    fn test_negative_average_eps_rejected() {
        let r = row(8.0, 0.8, [-3_000.0, 500.0, 500.0], 6_000.0);
        assert!(evaluate(&GrahamCriteria::default(), &r, 1_000.0).is_none());
    }
}
