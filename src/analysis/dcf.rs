// Discounted cash flow projection used by the Marks-style screen.

/// Years of explicit FCF projection before the terminal value.
const PROJECTION_YEARS: u32 = 10;

/// Minimum spread kept between the discount rate and the perpetual
/// growth rate so the Gordon denominator never approaches zero.
const MIN_TERMINAL_SPREAD: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct DcfAssumptions {
    /// Year-over-year growth applied to the starting FCF.
    pub growth_rate: f64,
    /// Perpetual growth used for the terminal value.
    pub terminal_growth: f64,
    pub discount_rate: f64,
}

impl Default for DcfAssumptions {
    fn default() -> Self {
        Self {
            growth_rate: 0.05,
            terminal_growth: 0.02,
            discount_rate: 0.10,
        }
    }
}

/// Intrinsic value per share from a 10-year FCF projection plus a
/// Gordon-growth terminal value, everything discounted to today.
///
/// Non-positive starting FCF short-circuits to 0.0; no projection is
/// attempted for a company that is not generating cash.
pub fn intrinsic_value_per_share(starting_fcf: f64, assumptions: &DcfAssumptions) -> f64 {
    if starting_fcf <= 0.0 {
        return 0.0;
    }

    let discount = assumptions.discount_rate;
    let terminal_growth = {
        // Clamp the perpetual rate so the spread stays at least 1%.
        if discount - assumptions.terminal_growth < MIN_TERMINAL_SPREAD {
            discount - MIN_TERMINAL_SPREAD
        } else {
            assumptions.terminal_growth
        }
    };

    let mut present_value = 0.0;
    let mut fcf = starting_fcf;
    for year in 1..=PROJECTION_YEARS {
        fcf *= 1.0 + assumptions.growth_rate;
        present_value += fcf / (1.0 + discount).powi(year as i32);
    }

    let terminal_value = fcf * (1.0 + terminal_growth) / (discount - terminal_growth);
    present_value += terminal_value / (1.0 + discount).powi(PROJECTION_YEARS as i32);

    present_value
}

/// (intrinsic - price) / intrinsic. None when the intrinsic value is not
/// positive, so callers skip the candidate instead of dividing by zero.
pub fn margin_of_safety(intrinsic_value: f64, current_price: f64) -> Option<f64> {
    if intrinsic_value > 0.0 {
        Some((intrinsic_value - current_price) / intrinsic_value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_fcf_short_circuits() {
        let assumptions = DcfAssumptions::default();
        assert_eq!(intrinsic_value_per_share(0.0, &assumptions), 0.0);
        assert_eq!(intrinsic_value_per_share(-1_000.0, &assumptions), 0.0);
    }

    #[test]
    fn test_higher_discount_rate_lowers_value() {
        let low = DcfAssumptions {
            discount_rate: 0.08,
            ..DcfAssumptions::default()
        };
        let high = DcfAssumptions {
            discount_rate: 0.12,
            ..DcfAssumptions::default()
        };
        let value_low = intrinsic_value_per_share(1_000.0, &low);
        let value_high = intrinsic_value_per_share(1_000.0, &high);
        assert!(value_high < value_low);
    }

    #[test]
    fn test_higher_starting_fcf_raises_value() {
        let assumptions = DcfAssumptions::default();
        let small = intrinsic_value_per_share(500.0, &assumptions);
        let large = intrinsic_value_per_share(1_500.0, &assumptions);
        assert!(large > small);
        assert!(small > 0.0);
    }

    #[test]
    fn test_terminal_spread_clamp() {
        // Zero spread between discount and perpetual growth must not blow up.
        let assumptions = DcfAssumptions {
            growth_rate: 0.05,
            terminal_growth: 0.08,
            discount_rate: 0.08,
        };
        let value = intrinsic_value_per_share(1_000.0, &assumptions);
        assert!(value.is_finite());
        assert!(value > 0.0);
    }

    #[test]
    fn test_margin_of_safety() {
        assert_eq!(margin_of_safety(10_000.0, 7_000.0), Some(0.3));
        assert_eq!(margin_of_safety(0.0, 7_000.0), None);
        assert_eq!(margin_of_safety(-100.0, 7_000.0), None);

        // Overpriced stocks produce a negative margin, not an error.
        let negative = margin_of_safety(10_000.0, 15_000.0).unwrap();
        assert!(negative < 0.0);
    }
}
