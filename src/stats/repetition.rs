//! Repetition averaging
//!
//! Models an attacker who repeats each measurement `k` times and keeps the
//! mean: the sequence is cut into consecutive windows of `k` samples and
//! each window collapses to its mean.
//!
//! A trailing window shorter than `k` is kept and averaged over the samples
//! it has. Dropping it would discard measurements the attacker did take.

use super::mean;
use crate::{Error, Result};

/// Block-means of `samples` over non-overlapping windows of `k`.
///
/// The output preserves window order and has `ceil(len / k)` elements.
/// `k = 1` returns the input unchanged.
///
/// # Errors
///
/// Returns `InvalidInput` if `k` is zero.
///
/// # Examples
///
/// ```rust
/// use timerres::stats::repetition::block_means;
///
/// let averaged = block_means(&[1.0, 3.0, 5.0, 7.0, 9.0], 2)?;
/// assert_eq!(averaged, vec![2.0, 6.0, 9.0]);
/// # Ok::<(), timerres::Error>(())
/// ```
pub fn block_means(samples: &[f64], k: usize) -> Result<Vec<f64>> {
    if k == 0 {
        return Err(Error::InvalidInput(
            "repetition window size must be positive".to_string(),
        ));
    }

    Ok(samples.chunks(k).map(mean).collect())
}
