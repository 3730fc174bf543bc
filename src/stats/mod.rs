//! Descriptive statistics over latency sample sequences
//!
//! A sample sequence is an ordered slice of timing values (ticks or time).
//! Order is measurement order; only [`repetition`] depends on it.

pub mod histogram;
pub mod repetition;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean, sample standard deviation and median of a sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Arithmetic mean
    pub average: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub standard_deviation: f64,
    /// Median (mean of the two middle values for even lengths)
    pub median: f64,
}

impl DescriptiveStats {
    /// Compute statistics for `samples`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `samples` has fewer than 2 elements
    /// (standard deviation is undefined), holds a non-finite value, or
    /// spans a range whose mean or deviation overflows `f64`.
    pub fn compute(samples: &[f64]) -> Result<Self> {
        if samples.len() < 2 {
            return Err(Error::InvalidInput(format!(
                "descriptive statistics need at least 2 samples, got {}",
                samples.len()
            )));
        }
        if let Some(bad) = samples.iter().find(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "descriptive statistics need finite samples, got {bad}"
            )));
        }

        let average = mean(samples);
        #[allow(clippy::cast_precision_loss)]
        let variance = samples
            .iter()
            .map(|v| (v - average).powi(2))
            .sum::<f64>()
            / (samples.len() - 1) as f64;

        let standard_deviation = variance.sqrt();
        if !average.is_finite() || !standard_deviation.is_finite() {
            return Err(Error::InvalidInput(format!(
                "sample range overflows: average {average}, standard deviation {standard_deviation}"
            )));
        }

        Ok(Self {
            average,
            standard_deviation,
            median: median(samples),
        })
    }

    /// Check if `other` matches within float parsing error.
    fn approx_eq(&self, other: &Self) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0);
        close(self.average, other.average)
            && close(self.standard_deviation, other.standard_deviation)
            && close(self.median, other.median)
    }
}

/// Sample values together with their descriptive statistics.
///
/// Only constructible through [`SampleSummary::from_values`], so a summary
/// always holds at least two finite values and statistics that match them.
/// Deserialization recomputes the statistics and rejects stored ones that
/// disagree with the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredSummary")]
pub struct SampleSummary {
    values: Vec<f64>,
    #[serde(flatten)]
    stats: DescriptiveStats,
}

impl SampleSummary {
    /// Summarize `values`, keeping the raw sequence.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if fewer than 2 values are given or the
    /// statistics are not finite.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        let stats = DescriptiveStats::compute(&values)?;
        Ok(Self { values, stats })
    }

    /// Raw values in measurement order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Statistics of the values.
    #[must_use]
    pub const fn stats(&self) -> DescriptiveStats {
        self.stats
    }
}

/// Summary as written in a measurement log, before validation.
#[derive(Deserialize)]
struct StoredSummary {
    values: Vec<f64>,
    #[serde(flatten)]
    stats: DescriptiveStats,
}

impl TryFrom<StoredSummary> for SampleSummary {
    type Error = Error;

    fn try_from(stored: StoredSummary) -> Result<Self> {
        let summary = Self::from_values(stored.values)?;
        if !summary.stats.approx_eq(&stored.stats) {
            return Err(Error::InvalidInput(format!(
                "stored statistics {:?} do not match values {:?}",
                stored.stats, summary.stats
            )));
        }
        Ok(summary)
    }
}

/// Arithmetic mean; callers guarantee a non-empty slice.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

fn median(samples: &[f64]) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
