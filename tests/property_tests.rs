//! Property-based tests for timerres
//!
//! - Test statistical invariants
//! - Test classifier bounds
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use timerres::classify::curve::ErrorRateCurve;
use timerres::classify::{best_error_rate, best_threshold, ClockMethod};
use timerres::stats::histogram::{BinSpec, Histogram};
use timerres::stats::repetition::block_means;
use timerres::stats::DescriptiveStats;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Latency-like samples: small non-negative integers as floats
fn arb_samples(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec((0u32..200).prop_map(f64::from), 1..max_len)
}

fn arb_clock() -> impl Strategy<Value = ClockMethod> {
    prop_oneof![Just(ClockMethod::Direct), Just(ClockMethod::Interpolated)]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Descriptive statistics
    // ========================================================================

    /// Property: average is sum / len
    #[test]
    fn prop_average_is_sum_over_len(samples in arb_samples(100)) {
        prop_assume!(samples.len() >= 2);
        let stats = DescriptiveStats::compute(&samples).unwrap();
        #[allow(clippy::cast_precision_loss)]
        let expected = samples.iter().sum::<f64>() / samples.len() as f64;
        prop_assert!((stats.average - expected).abs() < 1e-9);
    }

    /// Property: median and mean lie within the sample range
    #[test]
    fn prop_center_within_range(samples in arb_samples(100)) {
        prop_assume!(samples.len() >= 2);
        let stats = DescriptiveStats::compute(&samples).unwrap();
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(stats.median >= min && stats.median <= max);
        prop_assert!(stats.average >= min - 1e-9 && stats.average <= max + 1e-9);
        prop_assert!(stats.standard_deviation >= 0.0);
    }

    /// Property: constant sequences have zero spread
    #[test]
    fn prop_constant_zero_stdev(value in 0u32..1000, len in 2usize..50) {
        let samples = vec![f64::from(value); len];
        let stats = DescriptiveStats::compute(&samples).unwrap();
        prop_assert!(stats.standard_deviation.abs() < 1e-12);
    }

    // ========================================================================
    // Repetition averaging
    // ========================================================================

    /// Property: k = 1 is the identity
    #[test]
    fn prop_block_means_identity(samples in arb_samples(100)) {
        prop_assert_eq!(block_means(&samples, 1).unwrap(), samples);
    }

    /// Property: output length is ceil(len / k) and k = len gives the mean
    #[test]
    fn prop_block_means_length(samples in arb_samples(100), k in 1usize..20) {
        let averaged = block_means(&samples, k).unwrap();
        prop_assert_eq!(averaged.len(), samples.len().div_ceil(k));

        let whole = block_means(&samples, samples.len()).unwrap();
        prop_assert_eq!(whole.len(), 1);
        #[allow(clippy::cast_precision_loss)]
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        prop_assert!((whole[0] - mean).abs() < 1e-9);
    }

    // ========================================================================
    // Threshold classifier
    // ========================================================================

    /// Property: best error rate is a proportion no worse than a coin flip
    #[test]
    fn prop_best_error_rate_bounded(
        hits in arb_samples(60),
        misses in arb_samples(60),
        clock in arb_clock()
    ) {
        let rate = best_error_rate(&hits, &misses, clock).unwrap();
        prop_assert!((0.0..=0.5).contains(&rate));
    }

    /// Property: fully separated direct populations classify perfectly
    #[test]
    fn prop_separated_direct_is_perfect(
        hits in arb_samples(60),
        gap in 1u32..50,
        misses in arb_samples(60)
    ) {
        let hit_max = hits.iter().copied().fold(0.0, f64::max);
        let shifted: Vec<f64> = misses.iter().map(|m| m + hit_max + f64::from(gap)).collect();
        prop_assert_eq!(best_error_rate(&hits, &shifted, ClockMethod::Direct).unwrap(), 0.0);
        // Mirrored for an interpolated clock: hits read large, misses small.
        prop_assert_eq!(best_error_rate(&shifted, &hits, ClockMethod::Interpolated).unwrap(), 0.0);
    }

    /// Property: the reported fit is internally consistent
    #[test]
    fn prop_fit_consistent(
        hits in arb_samples(60),
        misses in arb_samples(60),
        clock in arb_clock()
    ) {
        let fit = best_threshold(&hits, &misses, clock).unwrap();
        prop_assert!(fit.threshold >= 0);
        prop_assert!(((fit.false_hit_rate + fit.false_miss_rate) / 2.0 - fit.error_rate).abs() < 1e-12);
    }

    // ========================================================================
    // Error rate curve
    // ========================================================================

    /// Property: curve covers 1..min(len, cap) with rates in [0, 0.5]
    #[test]
    fn prop_curve_shape(
        hits in arb_samples(80),
        misses in arb_samples(80),
        clock in arb_clock()
    ) {
        let curve = ErrorRateCurve::compute(&hits, &misses, clock).unwrap();
        let limit = hits.len().min(misses.len()).min(50);
        prop_assert_eq!(curve.len(), limit.saturating_sub(1));
        for (i, point) in curve.points().iter().enumerate() {
            prop_assert_eq!(point.repetitions, i + 1);
            prop_assert!((0.0..=0.5).contains(&point.error_rate));
        }
    }

    // ========================================================================
    // Histogram
    // ========================================================================

    /// Property: hit percentages sum to the share of hits strictly in range
    #[test]
    fn prop_histogram_hit_mass(hits in arb_samples(100), misses in arb_samples(100)) {
        let spec = BinSpec::new(0, 200, 10).unwrap();
        let hist = Histogram::build(&hits, &misses, spec).unwrap();
        let inside = hits.iter().filter(|&&h| h > 0.0 && h < 200.0).count();
        #[allow(clippy::cast_precision_loss)]
        let expected = inside as f64 * 100.0 / hits.len() as f64;
        let total: f64 = hist.iter().map(|(_, b)| b.hits).sum();
        prop_assert!((total - expected).abs() < 1e-6);
    }
}
