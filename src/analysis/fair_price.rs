// Multi-model fair-value aggregation: categorization, outlier detection
// and final result assembly for a single company.

use crate::models::fair_price::{
    model_category, CalculatedResults, CategorizedModels, ModelCategory, ModelItem, OutlierReason,
    OutlierReport, PerHealth, MODEL_BPS, MODEL_EPS_PER, MODEL_PEG, MODEL_ROE_EPS, MODEL_SRIM_BASE,
    MODEL_SRIM_DECLINE_10, MODEL_SRIM_DECLINE_20, MODEL_YAMAGUCHI,
};
use crate::models::{FinancialSnapshot, PriceRecord};

/// Multiplier band around the median beyond which a value is an outlier.
const OUTLIER_RANGE_FACTOR: f64 = 3.0;

/// PER above this is classified as an overvaluation caveat.
const EXTREME_PER_THRESHOLD: f64 = 100.0;

/// Assemble the flat named-model list from a snapshot. No computation
/// happens here: every dollar value was produced by the upstream
/// ingestion pipeline and is carried as-is.
pub fn build_model_items(snapshot: &FinancialSnapshot) -> Vec<ModelItem> {
    vec![
        ModelItem::new(MODEL_BPS, snapshot.bps_value, false),
        ModelItem::new(MODEL_SRIM_BASE, snapshot.srim_base, false),
        ModelItem::new(MODEL_SRIM_DECLINE_10, snapshot.srim_decline_10, true),
        ModelItem::new(MODEL_SRIM_DECLINE_20, snapshot.srim_decline_20, true),
        ModelItem::new(MODEL_EPS_PER, snapshot.eps_per_value, false),
        ModelItem::new(MODEL_PEG, snapshot.peg_value, false),
        ModelItem::new(MODEL_ROE_EPS, snapshot.roe_eps_value, false),
        ModelItem::new(MODEL_YAMAGUCHI, snapshot.yamaguchi_value, false),
    ]
}

/// Lower median of the positive values in `values`.
///
/// Even-length lists take the element at index n/2, not the average of
/// the middle pair. Downstream flagging depends on this exact tie-break;
/// do not switch to an averaged median.
pub fn lower_median(values: &[f64]) -> f64 {
    let mut positive: Vec<f64> = values.iter().copied().filter(|&v| v > 0.0).collect();
    if positive.is_empty() {
        return 0.0;
    }
    positive.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    positive[positive.len() / 2]
}

/// Flag outliers among the non-reference models, in place.
///
/// Branch order is load-bearing: the BPS exemption is checked first,
/// then non-positive values, then the median range band. A negative
/// BPS value therefore still flags `negative_or_zero` (the exemption
/// requires a positive value).
pub fn detect_outliers(models: &mut [ModelItem]) -> OutlierReport {
    let median = lower_median(
        &models
            .iter()
            .filter(|m| !m.is_reference)
            .map(|m| m.value)
            .collect::<Vec<f64>>(),
    );

    let mut outliers = Vec::new();
    for model in models.iter_mut().filter(|m| !m.is_reference) {
        // Book value per share is trusted even when extreme.
        if model.name.contains("BPS") && model.value > 0.0 {
            continue;
        }
        if model.value <= 0.0 {
            model.reason = Some(OutlierReason::NegativeOrZero);
        } else if model.value > median * OUTLIER_RANGE_FACTOR
            || model.value < median / OUTLIER_RANGE_FACTOR
        {
            model.reason = Some(OutlierReason::ValueRange);
        }
        if model.reason.is_some() {
            outliers.push(model.clone());
        }
    }

    let has_outliers = !outliers.is_empty();
    OutlierReport {
        outliers,
        has_outliers,
        median,
    }
}

/// Partition model items into their semantic buckets.
///
/// The mapping is hardcoded and total over the fixed model set; the two
/// S-RIM decline scenarios land in `srim_scenarios` only and are never
/// part of `all`.
pub fn categorize_models(items: &[ModelItem]) -> CategorizedModels {
    let mut asset_based = Vec::new();
    let mut earnings_based = Vec::new();
    let mut mixed_models = Vec::new();
    let mut srim_scenarios = Vec::new();
    let mut all = Vec::new();

    for item in items {
        match model_category(item.name) {
            Some(ModelCategory::AssetBased) => asset_based.push(item.clone()),
            Some(ModelCategory::EarningsBased) => earnings_based.push(item.clone()),
            Some(ModelCategory::Mixed) => mixed_models.push(item.clone()),
            Some(ModelCategory::SrimScenario) => {
                srim_scenarios.push(item.clone());
                continue;
            }
            None => continue,
        }
        all.push(item.clone());
    }

    CategorizedModels {
        asset_based,
        earnings_based,
        mixed_models,
        srim_scenarios,
        all,
    }
}

/// current_price / mid_range, or None when the mid range is not positive.
pub fn price_ratio(current_price: f64, mid_range: f64) -> Option<f64> {
    if mid_range > 0.0 {
        Some(current_price / mid_range)
    } else {
        None
    }
}

/// Classify PER sanity for user-facing caveats.
pub fn classify_per_health(current_price: f64, avg_eps: f64) -> PerHealth {
    if avg_eps <= 0.0 {
        PerHealth::Negative
    } else if current_price / avg_eps > EXTREME_PER_THRESHOLD {
        PerHealth::ExtremeHigh
    } else {
        PerHealth::Normal
    }
}

/// Run the full single-company pipeline: assemble model items, flag
/// outliers, categorize, and attach the precomputed range and
/// pass-through scores.
pub fn calculate(snapshot: &FinancialSnapshot, price: &PriceRecord) -> CalculatedResults {
    let mut items = build_model_items(snapshot);
    let outliers = detect_outliers(&mut items);
    let models = categorize_models(&items);

    CalculatedResults {
        ticker: snapshot.ticker.clone(),
        company_name: snapshot.company_name.clone(),
        models,
        outliers,
        low_range: snapshot.low_range,
        mid_range: snapshot.mid_range,
        high_range: snapshot.high_range,
        trust_score: snapshot.trust_score,
        risk_score: snapshot.risk_score,
        current_price: price.current_price,
        price_ratio: price_ratio(price.current_price, snapshot.mid_range),
        per_health: classify_per_health(price.current_price, snapshot.avg_eps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &'static str, value: f64) -> ModelItem {
        ModelItem::new(name, value, false)
    }

    #[test]
    fn test_lower_median_even_length() {
        // Even-length lists must take the element at index n/2.
        assert_eq!(lower_median(&[10.0, 20.0, 30.0, 40.0]), 30.0);
    }

    #[test]
    fn test_lower_median_ignores_non_positive() {
        assert_eq!(lower_median(&[-500.0, 0.0, 15000.0]), 15000.0);
        assert_eq!(lower_median(&[-1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_bps_exempt_from_range_flagging() {
        let mut models = vec![
            item(MODEL_BPS, 500.0),
            item(MODEL_EPS_PER, 10.0),
            item(MODEL_ROE_EPS, 10.0),
            item(MODEL_YAMAGUCHI, 10.0),
        ];
        let report = detect_outliers(&mut models);
        assert_eq!(report.median, 10.0);

        // BPS at 50x the median is trusted; a non-BPS value at the same
        // ratio must flag.
        assert!(models[0].reason.is_none());

        let mut models = vec![
            item(MODEL_SRIM_BASE, 500.0),
            item(MODEL_EPS_PER, 10.0),
            item(MODEL_ROE_EPS, 10.0),
            item(MODEL_YAMAGUCHI, 10.0),
        ];
        detect_outliers(&mut models);
        assert_eq!(models[0].reason, Some(OutlierReason::ValueRange));
    }

    #[test]
    fn test_zero_and_negative_flag_negative_or_zero() {
        let mut models = vec![
            item(MODEL_EPS_PER, 0.0),
            item(MODEL_PEG, -5.0),
            item(MODEL_ROE_EPS, 100.0),
        ];
        let report = detect_outliers(&mut models);
        assert_eq!(models[0].reason, Some(OutlierReason::NegativeOrZero));
        assert_eq!(models[1].reason, Some(OutlierReason::NegativeOrZero));
        assert!(report.has_outliers);
    }

    #[test]
    fn test_negative_bps_is_not_exempt() {
        let mut models = vec![item(MODEL_BPS, -100.0), item(MODEL_EPS_PER, 50.0)];
        detect_outliers(&mut models);
        assert_eq!(models[0].reason, Some(OutlierReason::NegativeOrZero));
    }

    #[test]
    fn test_reference_models_excluded_from_detection() {
        let mut models = vec![
            item(MODEL_EPS_PER, 100.0),
            ModelItem::new(MODEL_SRIM_DECLINE_10, -1.0, true),
        ];
        let report = detect_outliers(&mut models);
        assert!(models[1].reason.is_none());
        assert!(!report.has_outliers);
    }

    #[test]
    fn test_categorization_is_complete_and_disjoint() {
        let snapshot = sample_snapshot();
        let items = build_model_items(&snapshot);
        let models = categorize_models(&items);

        // 8 fixed models minus the 2 decline scenarios.
        assert_eq!(models.all.len(), 6);
        assert_eq!(models.srim_scenarios.len(), 2);
        assert_eq!(
            models.asset_based.len() + models.earnings_based.len() + models.mixed_models.len(),
            models.all.len()
        );
        for bucket_item in models.all.iter() {
            let in_asset = models.asset_based.iter().any(|m| m.name == bucket_item.name);
            let in_earnings = models
                .earnings_based
                .iter()
                .any(|m| m.name == bucket_item.name);
            let in_mixed = models.mixed_models.iter().any(|m| m.name == bucket_item.name);
            assert_eq!(
                [in_asset, in_earnings, in_mixed].iter().filter(|&&b| b).count(),
                1,
                "{} must live in exactly one bucket",
                bucket_item.name
            );
        }
    }

    #[test]
    fn test_price_ratio_guard() {
        assert_eq!(price_ratio(11000.0, 13750.0), Some(0.8));
        assert_eq!(price_ratio(11000.0, 0.0), None);
        assert_eq!(price_ratio(11000.0, -1.0), None);
    }

    #[test]
    fn test_per_health_classification() {
        assert_eq!(classify_per_health(10000.0, -120.0), PerHealth::Negative);
        assert_eq!(classify_per_health(10000.0, 0.0), PerHealth::Negative);
        assert_eq!(classify_per_health(10100.0, 100.0), PerHealth::ExtremeHigh);
        assert_eq!(classify_per_health(9000.0, 600.0), PerHealth::Normal);
    }

    fn sample_snapshot() -> FinancialSnapshot {
        FinancialSnapshot {
            ticker: "005930".to_string(),
            company_name: "Samsung Electronics".to_string(),
            industry: Some("Electronics".to_string()),
            sub_industry: None,
            shares_outstanding: 5_969_782_550.0,
            bps_value: 12_000.0,
            srim_base: 15_000.0,
            srim_decline_10: 9_000.0,
            srim_decline_20: 6_000.0,
            eps_per_value: 18_000.0,
            peg_value: -500.0,
            roe_eps_value: 16_000.0,
            yamaguchi_value: 14_000.0,
            low_range: 12_000.0,
            mid_range: 15_000.0,
            high_range: 17_000.0,
            avg_eps: 1_200.0,
            trust_score: 7.0,
            risk_score: 0.25,
            as_of: chrono::NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let snapshot = sample_snapshot();
        let price = PriceRecord {
            ticker: "005930".to_string(),
            current_price: 11_000.0,
            as_of: chrono::NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        };

        let results = calculate(&snapshot, &price);

        // Median over the positive non-reference values
        // [12000, 14000, 15000, 16000, 18000] -> index 2 -> 15000.
        assert_eq!(results.outliers.median, 15_000.0);

        // Only PEG (-500) flags, as negative_or_zero.
        assert_eq!(results.outliers.outliers.len(), 1);
        assert_eq!(results.outliers.outliers[0].name, MODEL_PEG);
        assert_matches::assert_matches!(
            results.outliers.outliers[0].reason,
            Some(OutlierReason::NegativeOrZero)
        );
        assert!(results.outliers.has_outliers);

        assert_eq!(results.models.all.len(), 6);
        assert_eq!(results.price_ratio, Some(11_000.0 / 15_000.0));
        assert_eq!(results.per_health, PerHealth::Normal);
        assert_eq!(results.trust_score, 7.0);
        assert_eq!(results.risk_score, 0.25);
    }
}
