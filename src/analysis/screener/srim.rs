// S-RIM screen: buys companies whose residual-income value (precomputed
// upstream) stands well above the market price, with a profitability floor.

use std::collections::HashMap;

use anyhow::Result;
use tracing::info;

use super::{average3, load_stage_inputs, make_candidate, rank_candidates};
use crate::analysis::dcf::margin_of_safety;
use crate::database::store::StockStore;
use crate::models::screening::{ScreenCandidate, SrimCriteria};

pub struct SrimScreener {
    store: StockStore,
    criteria: SrimCriteria,
}

impl SrimScreener {
    pub fn new(store: StockStore) -> Self {
        Self {
            store,
            criteria: SrimCriteria::default(),
        }
    }

    pub fn with_criteria(store: StockStore, criteria: SrimCriteria) -> Self {
        Self { store, criteria }
    }

    pub async fn run(&self) -> Result<Vec<ScreenCandidate>> {
        let Some(inputs) = load_stage_inputs(&self.store, "srim").await? else {
            return Ok(Vec::new());
        };

        // One more dependent stage: latest valuation snapshots carry the
        // precomputed S-RIM base value.
        let snapshots = self.store.fetch_snapshots_for(&inputs.tickers).await?;
        if snapshots.is_empty() {
            info!("srim screen: no valuation snapshots for surviving candidates");
            return Ok(Vec::new());
        }
        let srim_by_ticker: HashMap<String, f64> = snapshots
            .into_iter()
            .map(|s| (s.ticker, s.srim_base))
            .collect();

        let mut candidates = Vec::new();
        for row in &inputs.fundamentals {
            let Some(&price) = inputs.prices.get(&row.ticker) else {
                continue;
            };
            if price <= 0.0 {
                continue;
            }
            let Some(&srim_base) = srim_by_ticker.get(&row.ticker) else {
                continue;
            };

            let avg_roe = average3(&row.roe_by_year);
            if avg_roe < self.criteria.min_avg_roe {
                continue;
            }
            let Some(margin) = margin_of_safety(srim_base, price) else {
                continue;
            };
            if margin < self.criteria.min_margin_of_safety {
                continue;
            }

            let reasoning = format!(
                "S-RIM value {:.0} vs price {:.0} ({:.0}% margin); 3y avg ROE {:.1}%",
                srim_base,
                price,
                margin * 100.0,
                avg_roe
            );
            candidates.push(make_candidate(
                &inputs, &row.ticker, price, srim_base, margin, margin, reasoning,
            ));
        }

        info!(qualified = candidates.len(), "srim screen complete");
        Ok(rank_candidates(candidates))
    }
}
