//! Error rate as a function of repetition count
//!
//! For each repetition count `k`, both populations are reduced to
//! block-means of `k` samples and the best achievable error rate is
//! recomputed. The resulting curve shows how much averaging an attacker
//! needs to reach a target classification error.

use serde::{Deserialize, Serialize};

use super::{best_error_rate, ClockMethod};
use crate::stats::repetition::block_means;
use crate::{Error, Result};

/// Default exclusive upper bound on the repetition count.
pub const MAX_REPETITION_CAP: usize = 50;

/// One point of an [`ErrorRateCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Samples averaged per measurement
    pub repetitions: usize,
    /// Minimal error rate in `[0, 1]`
    pub error_rate: f64,
}

/// Minimal error rate for each repetition count `1..limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRateCurve {
    clock_method: ClockMethod,
    points: Vec<CurvePoint>,
}

impl ErrorRateCurve {
    /// Compute the curve with the default cap of [`MAX_REPETITION_CAP`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either sequence is empty.
    pub fn compute(hits: &[f64], misses: &[f64], clock: ClockMethod) -> Result<Self> {
        Self::compute_capped(hits, misses, clock, MAX_REPETITION_CAP)
    }

    /// Compute the curve for `k` in `1..min(len(hits), len(misses), cap)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either sequence is empty.
    pub fn compute_capped(
        hits: &[f64],
        misses: &[f64],
        clock: ClockMethod,
        cap: usize,
    ) -> Result<Self> {
        if hits.is_empty() || misses.is_empty() {
            return Err(Error::InvalidInput(format!(
                "error rate curve needs hits and misses, got {} hits and {} misses",
                hits.len(),
                misses.len()
            )));
        }

        let limit = hits.len().min(misses.len()).min(cap);
        let points = (1..limit)
            .map(|repetitions| -> Result<CurvePoint> {
                let hit_avg = block_means(hits, repetitions)?;
                let miss_avg = block_means(misses, repetitions)?;
                Ok(CurvePoint {
                    repetitions,
                    error_rate: best_error_rate(&hit_avg, &miss_avg, clock)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            clock_method: clock,
            points,
        })
    }

    /// Clock the samples were measured with.
    #[must_use]
    pub const fn clock_method(&self) -> ClockMethod {
        self.clock_method
    }

    /// Points in ascending repetition order.
    #[must_use]
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Error rate at `repetitions`, if computed.
    #[must_use]
    pub fn error_rate(&self, repetitions: usize) -> Option<f64> {
        repetitions
            .checked_sub(1)
            .and_then(|i| self.points.get(i))
            .map(|p| p.error_rate)
    }

    /// Smallest repetition count whose error rate is at most `target`.
    #[must_use]
    pub fn repetitions_for(&self, target: f64) -> Option<usize> {
        self.points
            .iter()
            .find(|p| p.error_rate <= target)
            .map(|p| p.repetitions)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if no repetition count was evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
