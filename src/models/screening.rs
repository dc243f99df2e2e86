// Screening criteria and result models
// One criteria struct per strategy, conventional defaults on each.

use serde::{Deserialize, Serialize};

/// Margin-of-safety bar shared by the intrinsic-value screens.
pub const MARGIN_OF_SAFETY_BAR: f64 = 0.30;

/// Universe row used by the cheap pre-filter stage.
#[derive(Debug, Clone)]
pub struct UniverseRow {
    pub ticker: String,
    pub company_name: String,
    pub industry: Option<String>,
    pub debt_ratio: f64,
}

/// Dependent numeric fields fetched (batched) for surviving candidates.
///
/// Year-indexed arrays run most-recent-first: index 0 is the latest
/// fiscal year, index 2 the oldest of the three.
#[derive(Debug, Clone)]
pub struct FundamentalsRow {
    pub ticker: String,
    pub shares_outstanding: f64,
    pub per: f64,
    pub pbr: f64,
    pub eps_by_year: [f64; 3],
    pub roe_by_year: [f64; 3],
    pub operating_income_by_year: [f64; 3],
    pub dividend_by_year: [f64; 3],
    pub fcf_per_share_by_year: [f64; 3],
    pub ncav_per_share: f64,
    pub bps: f64,
}

/// A stock that cleared every stage of a screen, ranked by its
/// strategy-specific score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenCandidate {
    pub ticker: String,
    pub company_name: String,
    pub industry: Option<String>,
    pub current_price: f64,
    pub intrinsic_value: f64,
    pub margin_of_safety: f64,
    /// Strategy-specific ranking score (meaning varies per screen).
    pub score: f64,
    pub rank: usize,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrahamCriteria {
    pub max_per: f64,
    pub max_pbr: f64,
    pub require_dividend_continuity: bool,
    pub min_margin_of_safety: f64,
}

impl Default for GrahamCriteria {
    fn default() -> Self {
        Self {
            max_per: 10.0,
            max_pbr: 1.0,
            require_dividend_continuity: true,
            min_margin_of_safety: MARGIN_OF_SAFETY_BAR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LynchCriteria {
    pub max_per: f64,
    pub max_peg: f64,
    pub min_eps_growth: f64,
    pub min_margin_of_safety: f64,
}

impl Default for LynchCriteria {
    fn default() -> Self {
        Self {
            max_per: 25.0,
            max_peg: 0.5,
            min_eps_growth: 5.0, // percent per year
            min_margin_of_safety: MARGIN_OF_SAFETY_BAR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrimCriteria {
    pub min_avg_roe: f64,
    pub min_margin_of_safety: f64,
}

impl Default for SrimCriteria {
    fn default() -> Self {
        Self {
            min_avg_roe: 8.0,
            min_margin_of_safety: MARGIN_OF_SAFETY_BAR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCriteria {
    pub min_avg_roe: f64,
    pub max_per: f64,
    pub require_dividend_continuity: bool,
    /// Required return used to scale book value into an intrinsic value.
    pub required_return: f64,
    pub min_margin_of_safety: f64,
}

impl Default for QualityCriteria {
    fn default() -> Self {
        Self {
            min_avg_roe: 15.0,
            max_per: 15.0,
            require_dividend_continuity: true,
            required_return: 8.0,
            min_margin_of_safety: MARGIN_OF_SAFETY_BAR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarksCriteria {
    pub discount_rate: f64,
    pub terminal_growth: f64,
    /// FCF growth is derived per company but clamped to this ceiling.
    pub max_growth: f64,
    pub min_margin_of_safety: f64,
}

impl Default for MarksCriteria {
    fn default() -> Self {
        Self {
            discount_rate: 0.10,
            terminal_growth: 0.02,
            max_growth: 0.15,
            min_margin_of_safety: MARGIN_OF_SAFETY_BAR,
        }
    }
}
