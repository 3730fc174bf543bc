//! Hit/miss threshold classification
//!
//! Given latency samples for cache hits and cache misses, find the integer
//! threshold that best separates them and report the resulting error rate.
//!
//! ## Sign convention
//!
//! The comparison direction depends on the clock:
//!
//! - [`ClockMethod::Direct`]: the timer counts ticks while the access runs,
//!   so misses (slow) read **larger** than hits. A miss below the threshold
//!   is a false hit; a hit above it is a false miss.
//! - [`ClockMethod::Interpolated`]: the timer reports the residual until the
//!   next clock edge, which shrinks as the access takes longer, so misses
//!   read **smaller** than hits. A miss above the threshold is a false hit;
//!   a hit below it is a false miss.
//!
//! Error rate at threshold `t` is `(false_hit_rate + false_miss_rate) / 2`.

pub mod curve;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How a timing value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockMethod {
    /// Monotonic tick counter (shared-memory counting thread)
    #[serde(alias = "SharedArrayBuffer")]
    Direct,
    /// Residual ticks to the next edge of a coarsened timer
    #[serde(alias = "performance.now")]
    Interpolated,
}

impl ClockMethod {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Interpolated => "interpolated",
        }
    }
}

impl fmt::Display for ClockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" | "SharedArrayBuffer" => Ok(Self::Direct),
            "interpolated" | "performance.now" => Ok(Self::Interpolated),
            other => Err(Error::InvalidInput(format!("unknown clock method: {other}"))),
        }
    }
}

/// Best threshold found by [`best_threshold`] and its rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFit {
    /// Cut value
    pub threshold: i64,
    /// Fraction of misses classified as hits
    pub false_hit_rate: f64,
    /// Fraction of hits classified as misses
    pub false_miss_rate: f64,
    /// Mean of the two rates
    pub error_rate: f64,
}

/// Fraction of `misses` classified as hits at `threshold`.
///
/// # Errors
///
/// Returns `InvalidInput` if `misses` is empty.
pub fn false_hit_rate(misses: &[f64], threshold: i64, clock: ClockMethod) -> Result<f64> {
    require_samples(misses, "misses")?;
    #[allow(clippy::cast_precision_loss)]
    let t = threshold as f64;
    let wrong = match clock {
        ClockMethod::Interpolated => misses.iter().filter(|&&m| m > t).count(),
        ClockMethod::Direct => misses.iter().filter(|&&m| m < t).count(),
    };
    Ok(fraction(wrong, misses.len()))
}

/// Fraction of `hits` classified as misses at `threshold`.
///
/// # Errors
///
/// Returns `InvalidInput` if `hits` is empty.
pub fn false_miss_rate(hits: &[f64], threshold: i64, clock: ClockMethod) -> Result<f64> {
    require_samples(hits, "hits")?;
    #[allow(clippy::cast_precision_loss)]
    let t = threshold as f64;
    let wrong = match clock {
        ClockMethod::Interpolated => hits.iter().filter(|&&h| h < t).count(),
        ClockMethod::Direct => hits.iter().filter(|&&h| h > t).count(),
    };
    Ok(fraction(wrong, hits.len()))
}

/// Mean classification error at `threshold`.
///
/// # Errors
///
/// Returns `InvalidInput` if either sequence is empty.
pub fn error_rate_at(hits: &[f64], misses: &[f64], threshold: i64, clock: ClockMethod) -> Result<f64> {
    let fit = fit_at(hits, misses, threshold, clock)?;
    Ok(fit.error_rate)
}

/// Scan every integer threshold in `[0, floor(max sample))` and keep the
/// lowest one reaching the minimum error rate.
///
/// When the largest sample is below 1 the scan still evaluates `t = 0`.
///
/// # Errors
///
/// Returns `InvalidInput` if either sequence is empty or holds a
/// non-finite value.
pub fn best_threshold(hits: &[f64], misses: &[f64], clock: ClockMethod) -> Result<ThresholdFit> {
    require_samples(hits, "hits")?;
    require_samples(misses, "misses")?;

    let max = hits
        .iter()
        .chain(misses)
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    #[allow(clippy::cast_possible_truncation)]
    let upper = (max.floor() as i64).max(1);

    let mut best = fit_at(hits, misses, 0, clock)?;
    for threshold in 1..upper {
        let fit = fit_at(hits, misses, threshold, clock)?;
        if fit.error_rate < best.error_rate {
            best = fit;
        }
    }
    Ok(best)
}

/// Minimum error rate over all scanned thresholds.
///
/// # Errors
///
/// Returns `InvalidInput` if either sequence is empty or holds a
/// non-finite value.
///
/// # Examples
///
/// ```rust
/// use timerres::classify::{best_error_rate, ClockMethod};
///
/// let hits = [10.0, 10.0, 10.0, 12.0, 12.0];
/// let misses = [30.0, 30.0, 28.0, 31.0, 29.0];
/// assert_eq!(best_error_rate(&hits, &misses, ClockMethod::Direct)?, 0.0);
/// # Ok::<(), timerres::Error>(())
/// ```
pub fn best_error_rate(hits: &[f64], misses: &[f64], clock: ClockMethod) -> Result<f64> {
    Ok(best_threshold(hits, misses, clock)?.error_rate)
}

fn fit_at(hits: &[f64], misses: &[f64], threshold: i64, clock: ClockMethod) -> Result<ThresholdFit> {
    let false_hit_rate = false_hit_rate(misses, threshold, clock)?;
    let false_miss_rate = false_miss_rate(hits, threshold, clock)?;
    Ok(ThresholdFit {
        threshold,
        false_hit_rate,
        false_miss_rate,
        error_rate: (false_hit_rate + false_miss_rate) / 2.0,
    })
}

fn require_samples(samples: &[f64], name: &str) -> Result<()> {
    if samples.is_empty() {
        return Err(Error::InvalidInput(format!("{name} sample sequence is empty")));
    }
    if samples.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "{name} sample sequence contains a non-finite value"
        )));
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn fraction(count: usize, total: usize) -> f64 {
    count as f64 / total as f64
}
