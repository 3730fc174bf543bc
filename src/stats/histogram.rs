//! Hit/miss latency histograms
//!
//! Bins two sample sequences into fixed-width buckets and expresses the
//! counts on a percentage scale, for visual inspection of how well the two
//! populations separate.
//!
//! ## Contract
//!
//! - A sample `v` is counted only if `min_value < v < max_value`. Samples
//!   equal to either bound are excluded.
//! - A counted sample lands in bin `floor(v / step) * step`.
//! - With [`Normalization::HitTotal`] (the default) **both** series are
//!   divided by `hit_count / 100`. Miss percentages are therefore relative
//!   to the number of hits, not to the number of misses. When the two
//!   populations have different sizes the miss column does not sum to 100.
//! - [`Normalization::PerSeries`] divides each series by its own count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Denominator used to turn bin counts into percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Divide hit and miss counts by the hit-sample count
    #[default]
    HitTotal,
    /// Divide each series by its own sample count
    PerSeries,
}

/// Binning range and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSpec {
    /// Exclusive lower bound
    pub min_value: i64,
    /// Exclusive upper bound
    pub max_value: i64,
    /// Bin width
    pub step: i64,
}

impl BinSpec {
    /// Create a bin specification.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `step` is not positive or the range is empty.
    pub fn new(min_value: i64, max_value: i64, step: i64) -> Result<Self> {
        if step <= 0 {
            return Err(Error::InvalidInput(format!(
                "histogram step must be positive, got {step}"
            )));
        }
        if min_value >= max_value {
            return Err(Error::InvalidInput(format!(
                "histogram range [{min_value}, {max_value}) is empty"
            )));
        }
        Ok(Self {
            min_value,
            max_value,
            step,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn contains(&self, value: f64) -> bool {
        value > self.min_value as f64 && value < self.max_value as f64
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn bin_of(&self, value: f64) -> i64 {
        (value / self.step as f64).floor() as i64 * self.step
    }
}

/// Percentages of hit and miss samples in one bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Hit percentage
    pub hits: f64,
    /// Miss percentage
    pub misses: f64,
}

/// Normalized hit/miss histogram keyed by bin lower edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    spec: BinSpec,
    normalization: Normalization,
    bins: BTreeMap<i64, HistogramBin>,
}

impl Histogram {
    /// Bin `hits` and `misses` with the default [`Normalization::HitTotal`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `hits` is empty.
    pub fn build(hits: &[f64], misses: &[f64], spec: BinSpec) -> Result<Self> {
        Self::build_with(hits, misses, spec, Normalization::default())
    }

    /// Bin `hits` and `misses` with an explicit normalization.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a series used as a denominator is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn build_with(
        hits: &[f64],
        misses: &[f64],
        spec: BinSpec,
        normalization: Normalization,
    ) -> Result<Self> {
        if hits.is_empty() {
            return Err(Error::InvalidInput(
                "histogram needs at least one hit sample".to_string(),
            ));
        }
        if normalization == Normalization::PerSeries && misses.is_empty() {
            return Err(Error::InvalidInput(
                "per-series normalization needs at least one miss sample".to_string(),
            ));
        }

        let mut bins = BTreeMap::new();
        let mut edge = spec.min_value;
        while edge <= spec.max_value {
            bins.insert(edge, HistogramBin::default());
            edge += spec.step;
        }

        for &hit in hits.iter().filter(|v| spec.contains(**v)) {
            bins.entry(spec.bin_of(hit)).or_default().hits += 1.0;
        }
        for &miss in misses.iter().filter(|v| spec.contains(**v)) {
            bins.entry(spec.bin_of(miss)).or_default().misses += 1.0;
        }

        let hit_scale = hits.len() as f64 / 100.0;
        let miss_scale = match normalization {
            Normalization::HitTotal => hit_scale,
            Normalization::PerSeries => misses.len() as f64 / 100.0,
        };
        for bin in bins.values_mut() {
            bin.hits /= hit_scale;
            bin.misses /= miss_scale;
        }

        Ok(Self {
            spec,
            normalization,
            bins,
        })
    }

    /// Bin at lower edge `edge`, if any.
    #[must_use]
    pub fn bin(&self, edge: i64) -> Option<&HistogramBin> {
        self.bins.get(&edge)
    }

    /// Bins in ascending edge order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &HistogramBin)> {
        self.bins.iter().map(|(edge, bin)| (*edge, bin))
    }

    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Check if the histogram has no bins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Binning parameters used.
    #[must_use]
    pub const fn spec(&self) -> BinSpec {
        self.spec
    }

    /// Normalization used.
    #[must_use]
    pub const fn normalization(&self) -> Normalization {
        self.normalization
    }
}
