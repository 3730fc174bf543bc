//! End-to-end analysis over a results directory
//!
//! Tests the complete pipeline:
//! 1. Instrumentation output wrapped into records
//! 2. Records appended to per-subject logs
//! 3. Analyzer reading logs back into curves, thresholds and histograms

use std::fs;

use tempfile::TempDir;
use timerres::analysis::{Analyzer, HistogramRange};
use timerres::classify::ClockMethod;
use timerres::config::Config;
use timerres::experiment::{AccessLabel, Browser, MeasurementRecord, SampleStore, SubjectKey};
use timerres::stats::histogram::Normalization;
use timerres::Error;

fn alternating(len: usize, even: f64, odd: f64) -> Vec<f64> {
    (0..len).map(|i| if i % 2 == 0 { even } else { odd }).collect()
}

/// Store a hit/miss experiment the way instrumentation reports it: one
/// record per population.
fn record_hit_miss(
    store: &SampleStore,
    subject: &SubjectKey,
    clock: ClockMethod,
    coop: bool,
    hits: Vec<f64>,
    misses: Vec<f64>,
) {
    let hits = MeasurementRecord::hit_miss(subject, coop, clock, AccessLabel::Hits, hits).unwrap();
    let misses =
        MeasurementRecord::hit_miss(subject, coop, clock, AccessLabel::Misses, misses).unwrap();
    store.append(hits, subject).unwrap();
    store.append(misses, subject).unwrap();
}

fn store_in(dir: &TempDir, cap: usize) -> SampleStore {
    SampleStore::new(
        Config::builder()
            .results_dir(dir.path())
            .max_repetitions(cap)
            .build()
            .unwrap(),
    )
}

#[test]
fn test_error_rate_curve_from_store() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 10);
    let subject = SubjectKey::new(Browser::Firefox, "81");

    record_hit_miss(
        &store,
        &subject,
        ClockMethod::Direct,
        false,
        alternating(31, 8.0, 12.0),
        alternating(31, 15.0, 11.0),
    );
    // Same subject, other selection: must not leak into the result.
    record_hit_miss(
        &store,
        &subject,
        ClockMethod::Direct,
        true,
        vec![100.0, 100.0],
        vec![1.0, 1.0],
    );

    let analyzer = Analyzer::new(&store);
    let curve = analyzer
        .error_rate_curve(&subject, ClockMethod::Direct, false)
        .unwrap();

    assert_eq!(curve.len(), 9);
    assert!((curve.error_rate(1).unwrap() - 0.25).abs() < f64::EPSILON);
    assert_eq!(curve.error_rate(9), Some(0.0));
}

#[test]
fn test_samples_concatenate_across_runs() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 50);
    let subject = SubjectKey::new(Browser::Chrome, "84");

    record_hit_miss(&store, &subject, ClockMethod::Interpolated, true, vec![40.0, 41.0], vec![5.0, 6.0]);
    record_hit_miss(&store, &subject, ClockMethod::Interpolated, true, vec![42.0, 43.0], vec![7.0, 8.0]);

    let analyzer = Analyzer::new(&store);
    let pair = analyzer
        .hit_miss_samples(&subject, ClockMethod::Interpolated, true)
        .unwrap();
    assert_eq!(pair.hits, vec![40.0, 41.0, 42.0, 43.0]);
    assert_eq!(pair.misses, vec![5.0, 6.0, 7.0, 8.0]);

    let fit = analyzer
        .best_threshold(&subject, ClockMethod::Interpolated, true)
        .unwrap();
    assert!(fit.error_rate.abs() < f64::EPSILON);
}

#[test]
fn test_missing_selection_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 50);
    let subject = SubjectKey::new(Browser::Firefox, "79");
    let analyzer = Analyzer::new(&store);

    // No log at all
    assert!(matches!(
        analyzer.error_rate_curve(&subject, ClockMethod::Direct, false),
        Err(Error::NotFound(_))
    ));

    // Log with hits only
    let hits =
        MeasurementRecord::hit_miss(&subject, false, ClockMethod::Direct, AccessLabel::Hits, vec![1.0, 2.0])
            .unwrap();
    store.append(hits, &subject).unwrap();
    let err = analyzer
        .error_rate_curve(&subject, ClockMethod::Direct, false)
        .unwrap_err();
    assert!(err.is_recoverable());
    assert!(err.to_string().contains("firefox 79"));
}

#[test]
fn test_histogram_with_automatic_max() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 50);
    let subject = SubjectKey::new(Browser::Firefox, "81");
    record_hit_miss(&store, &subject, ClockMethod::Direct, false, vec![1.0, 1.0, 2.0], vec![1.0, 4.0]);

    let analyzer = Analyzer::new(&store);
    let hist = analyzer
        .histogram(&subject, ClockMethod::Direct, false, HistogramRange::default())
        .unwrap();

    // max defaults to the largest sample (4), itself excluded
    assert_eq!(hist.spec().max_value, 4);
    assert!((hist.bin(1).unwrap().hits - 200.0 / 3.0).abs() < 1e-9);
    assert!((hist.bin(1).unwrap().misses - 100.0 / 3.0).abs() < 1e-9);
    assert!(hist.bin(4).unwrap().misses.abs() < f64::EPSILON);

    let per_series = analyzer
        .histogram(
            &subject,
            ClockMethod::Direct,
            false,
            HistogramRange {
                max: Some(5),
                normalization: Normalization::PerSeries,
                ..HistogramRange::default()
            },
        )
        .unwrap();
    assert!((per_series.bin(4).unwrap().misses - 50.0).abs() < 1e-9);
}

#[test]
fn test_tick_distributions_skip_corrupt_logs() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 50);

    for (version, base) in [("80", 40.0), ("81", 20.0)] {
        let subject = SubjectKey::new(Browser::Firefox, version);
        let stale = MeasurementRecord::tick_distribution(&subject, false, vec![1.0, 2.0]).unwrap();
        let latest =
            MeasurementRecord::tick_distribution(&subject, false, vec![base, base + 1.0]).unwrap();
        let isolated =
            MeasurementRecord::tick_distribution(&subject, true, vec![base * 10.0, base]).unwrap();
        store.append(stale, &subject).unwrap();
        store.append(latest, &subject).unwrap();
        store.append(isolated, &subject).unwrap();
    }
    fs::write(dir.path().join("firefox").join("firefox-82.json"), "not json").unwrap();

    let analyzer = Analyzer::new(&store);
    let data = analyzer.tick_distributions(Browser::Firefox, false).unwrap();

    assert_eq!(data.len(), 2);
    assert_eq!(data["80"], vec![40.0, 41.0]);
    assert_eq!(data["81"], vec![20.0, 21.0]);

    assert!(analyzer.tick_distributions(Browser::Chrome, false).unwrap().is_empty());
}

#[test]
fn test_sab_availability_latest_wins() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir, 50);
    let subject = SubjectKey::new(Browser::Firefox, "76");

    store
        .append(MeasurementRecord::sab_availability(&subject, true, false, vec![]), &subject)
        .unwrap();
    store
        .append(
            MeasurementRecord::sab_availability(
                &subject,
                true,
                true,
                vec!["dom.postMessage.sharedArrayBuffer.withCOOP_COEP".to_string()],
            ),
            &subject,
        )
        .unwrap();

    let analyzer = Analyzer::new(&store);
    let status = analyzer.sab_availability(&subject, true).unwrap().unwrap();
    assert!(status.available);
    assert_eq!(status.flags.len(), 1);
    assert!(analyzer.sab_availability(&subject, false).unwrap().is_none());
}
