//! Numeric helpers shared by the aggregation folds.
//!
//! Percentages are always clamped to `[0, 100]` and never divide by zero.
//! Currency values are plain `f64` display aggregates, not ledger amounts.

/// Clamp a percentage into `[0, 100]`. `NaN` becomes `0`.
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// `part / total * 100`, clamped. Returns `0` when `total` is not positive.
pub fn percentage(part: f64, total: f64) -> f64 {
    if total <= 0.0 || !total.is_finite() {
        return 0.0;
    }
    clamp_percentage(part / total * 100.0)
}

/// Collection rate for a set of fees: collected over expected.
pub fn collection_rate(collected: f64, expected: f64) -> f64 {
    percentage(collected, expected)
}

/// Round to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of a slice, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_rate_stays_in_range() {
        let amounts = [0.0, 1.0, 250.0, 25_000.0, 1e9];
        let paids = [0.0, 0.5, 250.0, 30_000.0, 2e9, -10.0];
        for amount in amounts {
            for paid in paids {
                let rate = collection_rate(paid, amount);
                assert!((0.0..=100.0).contains(&rate), "{paid}/{amount} -> {rate}");
            }
        }
    }

    #[test]
    fn zero_expected_yields_zero() {
        assert_eq!(collection_rate(100.0, 0.0), 0.0);
        assert_eq!(collection_rate(0.0, 0.0), 0.0);
    }

    #[test]
    fn overpayment_clamps_to_hundred() {
        assert_eq!(collection_rate(30_000.0, 25_000.0), 100.0);
    }

    #[test]
    fn nan_is_clamped_to_zero() {
        assert_eq!(clamp_percentage(f64::NAN), 0.0);
        assert_eq!(percentage(1.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn round2_rounds_half_away() {
        assert_eq!(round2(33.33333), 33.33);
        assert_eq!(round2(66.666), 66.67);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[50.0, 100.0]), Some(75.0));
    }
}
