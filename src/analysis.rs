//! Analysis entry points over stored measurement logs
//!
//! Each entry point selects the records of one subject (or one browser)
//! matching a clock method and isolation flag, then runs the statistics of
//! [`crate::stats`] and [`crate::classify`] on them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use timerres::analysis::Analyzer;
//! use timerres::classify::ClockMethod;
//! use timerres::config::Config;
//! use timerres::experiment::{Browser, SampleStore, SubjectKey};
//!
//! let store = SampleStore::new(Config::default());
//! let analyzer = Analyzer::new(&store);
//!
//! let subject = SubjectKey::new(Browser::Firefox, "81");
//! let curve = analyzer.error_rate_curve(&subject, ClockMethod::Interpolated, false)?;
//! for point in curve.points() {
//!     println!("{:>3} repetitions: {:.1}%", point.repetitions, point.error_rate * 100.0);
//! }
//! # Ok::<(), timerres::Error>(())
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classify::curve::ErrorRateCurve;
use crate::classify::{best_threshold, ClockMethod, ThresholdFit};
use crate::experiment::{
    AccessLabel, Browser, RecordKind, RecordLog, RecordPayload, SampleStore, SubjectKey,
};
use crate::stats::histogram::{BinSpec, Histogram, Normalization};
use crate::{Error, Result};

/// Hit and miss latencies of one subject, in log order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplePair {
    /// Cached access latencies
    pub hits: Vec<f64>,
    /// Uncached access latencies
    pub misses: Vec<f64>,
}

impl SamplePair {
    /// Concatenate the values of every hit/miss record of `log` measured
    /// with `clock` under isolation flag `coop`.
    #[must_use]
    pub fn from_log(log: &RecordLog, clock: ClockMethod, coop: bool) -> Self {
        let mut pair = Self::default();
        for record in log.of_kind(RecordKind::HitMiss) {
            let RecordPayload::HitMiss(samples) = record.payload() else {
                continue;
            };
            if samples.clock_method != clock || record.coop() != coop {
                continue;
            }
            let target = match samples.label {
                AccessLabel::Hits => &mut pair.hits,
                AccessLabel::Misses => &mut pair.misses,
            };
            target.extend_from_slice(samples.summary.values());
        }
        pair
    }

    /// Largest sample across both populations.
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        self.hits
            .iter()
            .chain(&self.misses)
            .copied()
            .reduce(f64::max)
    }
}

/// Histogram range; `max: None` stretches to the largest sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramRange {
    /// Exclusive lower bound
    pub min: i64,
    /// Exclusive upper bound, or the largest sample
    pub max: Option<i64>,
    /// Bin width
    pub step: i64,
    /// Percentage denominator
    pub normalization: Normalization,
}

impl Default for HistogramRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: None,
            step: 1,
            normalization: Normalization::HitTotal,
        }
    }
}

/// SharedArrayBuffer availability of one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SabStatus {
    /// SharedArrayBuffer usable
    pub available: bool,
    /// Browser preferences required
    pub flags: Vec<String>,
}

/// Runs analyses against the logs of a [`SampleStore`].
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<'a> {
    store: &'a SampleStore,
}

impl<'a> Analyzer<'a> {
    /// Create an analyzer over `store`.
    #[must_use]
    pub const fn new(store: &'a SampleStore) -> Self {
        Self { store }
    }

    /// Hit and miss latencies of `subject` for `clock` and `coop`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the subject has no log or the log has no hits
    /// or no misses for this selection, plus any error of
    /// [`SampleStore::read_all`].
    pub fn hit_miss_samples(
        &self,
        subject: &SubjectKey,
        clock: ClockMethod,
        coop: bool,
    ) -> Result<SamplePair> {
        let log = self.store.read_all(subject)?;
        let pair = SamplePair::from_log(&log, clock, coop);
        if pair.hits.is_empty() || pair.misses.is_empty() {
            return Err(Error::NotFound(format!(
                "no hit/miss results for {subject} with {clock} clock and COOP/COEP {coop}"
            )));
        }
        Ok(pair)
    }

    /// Error rate against repetition count, capped by
    /// `Config::max_repetitions`.
    ///
    /// # Errors
    ///
    /// See [`Analyzer::hit_miss_samples`].
    pub fn error_rate_curve(
        &self,
        subject: &SubjectKey,
        clock: ClockMethod,
        coop: bool,
    ) -> Result<ErrorRateCurve> {
        let pair = self.hit_miss_samples(subject, clock, coop)?;
        let curve = ErrorRateCurve::compute_capped(
            &pair.hits,
            &pair.misses,
            clock,
            self.store.config().max_repetitions,
        )?;
        info!(
            %subject,
            %clock,
            coop,
            points = curve.len(),
            raw_error_rate = curve.error_rate(1),
            "computed error rate curve"
        );
        Ok(curve)
    }

    /// Best single-measurement threshold.
    ///
    /// # Errors
    ///
    /// See [`Analyzer::hit_miss_samples`].
    pub fn best_threshold(
        &self,
        subject: &SubjectKey,
        clock: ClockMethod,
        coop: bool,
    ) -> Result<ThresholdFit> {
        let pair = self.hit_miss_samples(subject, clock, coop)?;
        best_threshold(&pair.hits, &pair.misses, clock)
    }

    /// Normalized hit/miss histogram.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty range or non-positive step, plus
    /// the errors of [`Analyzer::hit_miss_samples`].
    pub fn histogram(
        &self,
        subject: &SubjectKey,
        clock: ClockMethod,
        coop: bool,
        range: HistogramRange,
    ) -> Result<Histogram> {
        let pair = self.hit_miss_samples(subject, clock, coop)?;
        let max = match range.max {
            Some(max) => max,
            #[allow(clippy::cast_possible_truncation)]
            None => pair.max_value().map_or(range.min, |v| v.ceil() as i64),
        };
        let spec = BinSpec::new(range.min, max, range.step)?;
        Histogram::build_with(&pair.hits, &pair.misses, spec, range.normalization)
    }

    /// Tick-count samples per version of `browser`, for jitter comparison.
    ///
    /// Logs that are missing or corrupt are skipped with a warning. When a
    /// log holds several matching records, the latest one wins.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedSubject` for an unconfigured browser and `Io` if
    /// the browser directory cannot be listed.
    pub fn tick_distributions(
        &self,
        browser: Browser,
        coop: bool,
    ) -> Result<BTreeMap<String, Vec<f64>>> {
        let mut data = BTreeMap::new();
        for version in self.store.versions(browser)? {
            let subject = SubjectKey::new(browser, version);
            let log = match self.store.read_all(&subject) {
                Ok(log) => log,
                Err(e) if e.is_recoverable() => {
                    warn!(%subject, error = %e, "skipping measurement log");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let latest = log
                .of_kind(RecordKind::TickDistribution)
                .filter(|r| r.coop() == coop)
                .filter_map(|r| match r.payload() {
                    RecordPayload::TickDistribution(summary) => Some(summary.values()),
                    _ => None,
                })
                .last();
            if let Some(values) = latest {
                data.insert(subject.version().to_string(), values.to_vec());
            }
        }

        if data.is_empty() {
            warn!(%browser, coop, "no tick distribution results found");
        }
        Ok(data)
    }

    /// Latest SharedArrayBuffer availability result of `subject`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`SampleStore::read_all`].
    pub fn sab_availability(&self, subject: &SubjectKey, coop: bool) -> Result<Option<SabStatus>> {
        let log = self.store.read_all(subject)?;
        Ok(log
            .of_kind(RecordKind::SabAvailability)
            .filter(|r| r.coop() == coop)
            .filter_map(|r| match r.payload() {
                RecordPayload::SabAvailability {
                    sab_available,
                    flags,
                } => Some(SabStatus {
                    available: *sab_available,
                    flags: flags.clone(),
                }),
                _ => None,
            })
            .last())
    }
}
