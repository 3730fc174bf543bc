//! Error Rate Curve Example
//!
//! Records a synthetic hit/miss experiment into a scratch results directory,
//! then reads it back and prints the statistics, best threshold and the
//! error rate against repetition count.
//!
//! Run with: RUST_LOG=debug cargo run --example error_curve

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use timerres::analysis::{Analyzer, HistogramRange};
use timerres::classify::ClockMethod;
use timerres::config::Config;
use timerres::experiment::{AccessLabel, Browser, MeasurementRecord, SampleStore, SubjectKey};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== timerres: hit/miss error rate curve ===\n");

    let results_dir = std::env::temp_dir().join("timerres-demo");
    if results_dir.exists() {
        std::fs::remove_dir_all(&results_dir)?;
    }
    let config = Config::builder()
        .results_dir(&results_dir)
        .measurement_repetitions(1_000)
        .build()?;
    let store = SampleStore::new(config);
    let subject = SubjectKey::new(Browser::Firefox, "81");

    // -------------------------------------------------------------------------
    // 1. Simulate instrumentation: a coarse interpolated clock where misses
    //    leave ~6 fewer ticks before the next edge, with heavy jitter.
    // -------------------------------------------------------------------------
    let mut rng = StdRng::seed_from_u64(2020);
    let n = store.config().measurement_repetitions;
    let hits: Vec<f64> = (0..n).map(|_| f64::from(rng.gen_range(20..44))).collect();
    let misses: Vec<f64> = (0..n).map(|_| f64::from(rng.gen_range(14..38))).collect();

    let clock = ClockMethod::Interpolated;
    for (label, values) in [(AccessLabel::Hits, hits), (AccessLabel::Misses, misses)] {
        let record = MeasurementRecord::hit_miss(&subject, false, clock, label, values)?;
        let len = store.append(record, &subject)?;
        println!("appended {label:?} record, log now holds {len} records");
    }
    println!("log: {}", store.config().log_path(&subject).display());

    // -------------------------------------------------------------------------
    // 2. Analyse
    // -------------------------------------------------------------------------
    let analyzer = Analyzer::new(&store);

    let fit = analyzer
        .best_threshold(&subject, clock, false)
        .context("no hit/miss data for the demo subject")?;
    println!(
        "\nbest threshold {}: false hits {:.1}%, false misses {:.1}%, error {:.1}%",
        fit.threshold,
        fit.false_hit_rate * 100.0,
        fit.false_miss_rate * 100.0,
        fit.error_rate * 100.0
    );

    let curve = analyzer.error_rate_curve(&subject, clock, false)?;
    println!("\nrepetitions  error rate");
    for point in curve.points().iter().step_by(5) {
        println!("{:>11}  {:>9.2}%", point.repetitions, point.error_rate * 100.0);
    }
    match curve.repetitions_for(0.01) {
        Some(k) => println!("\n1% error reached with {k} repetitions"),
        None => println!("\n1% error not reached below {} repetitions", curve.len() + 1),
    }

    let histogram = analyzer.histogram(
        &subject,
        clock,
        false,
        HistogramRange {
            step: 4,
            ..HistogramRange::default()
        },
    )?;
    println!("\nbin   hits%  misses%");
    for (edge, bin) in histogram.iter() {
        println!("{edge:>3}  {:>6.1}  {:>7.1}", bin.hits, bin.misses);
    }

    println!("\n{}", serde_json::to_string_pretty(&curve)?);
    Ok(())
}
