//! Confidence for learned patterns.
//!
//! Grows with cluster size and literal ratio, and stays inside
//! [`LEARNED_CONFIDENCE_FLOOR`, `LEARNED_CONFIDENCE_CEILING`], below the tier
//! reserved for curated, tested patterns.

use sift_core::constants::{LEARNED_CONFIDENCE_CEILING, LEARNED_CONFIDENCE_FLOOR};

/// Cluster size at which the size factor saturates.
pub const SATURATION_SIZE: f64 = 20.0;

const SIZE_WEIGHT: f64 = 0.6;
const LITERAL_WEIGHT: f64 = 0.4;

/// `ln(1 + n) / ln(1 + SATURATION_SIZE)`, capped at 1.
pub fn size_factor(group_size: usize) -> f64 {
    let n = group_size as f64;
    ((1.0 + n).ln() / (1.0 + SATURATION_SIZE).ln()).min(1.0)
}

/// Monotone non-decreasing in both `group_size` and `literal_ratio`.
pub fn learned_confidence(group_size: usize, literal_ratio: f64) -> f64 {
    let ratio = if literal_ratio.is_nan() {
        0.0
    } else {
        literal_ratio.clamp(0.0, 1.0)
    };
    let span = LEARNED_CONFIDENCE_CEILING - LEARNED_CONFIDENCE_FLOOR;
    let score = SIZE_WEIGHT * size_factor(group_size) + LITERAL_WEIGHT * ratio;
    (LEARNED_CONFIDENCE_FLOOR + span * score)
        .clamp(LEARNED_CONFIDENCE_FLOOR, LEARNED_CONFIDENCE_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sift_core::constants::CURATED_CONFIDENCE_TIER;

    #[test]
    fn bounds() {
        assert_eq!(learned_confidence(0, 0.0), LEARNED_CONFIDENCE_FLOOR);
        assert!((learned_confidence(1_000, 1.0) - LEARNED_CONFIDENCE_CEILING).abs() < 1e-12);
        assert!(learned_confidence(1_000, 1.0) < CURATED_CONFIDENCE_TIER);
    }

    #[test]
    fn ten_line_group_with_half_literals() {
        let c = learned_confidence(10, 0.5);
        assert!(c > 0.66 && c < 0.68, "{c}");
    }

    proptest! {
        #[test]
        fn prop_larger_and_more_consistent_scores_at_least_as_high(
            n in 0usize..200, extra in 0usize..50,
            r in 0.0f64..=1.0, dr in 0.0f64..=1.0,
        ) {
            let r2 = (r + dr).min(1.0);
            prop_assert!(learned_confidence(n + extra, r2) >= learned_confidence(n, r));
            let c = learned_confidence(n, r);
            prop_assert!(c >= LEARNED_CONFIDENCE_FLOOR && c <= LEARNED_CONFIDENCE_CEILING);
        }
    }
}
