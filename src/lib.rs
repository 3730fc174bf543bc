//! # timerres: Browser Timer-Resolution Analysis
//!
//! Quantifies how well a browser timer separates cache hits from cache
//! misses, and how much repeated measurement an attacker needs to recover
//! the distinction when the timer is coarsened or jittered.
//!
//! ## Pipeline
//!
//! ```text
//! instrumentation ──> MeasurementRecord ──> SampleStore (one JSON log per browser build)
//!                                                 │
//!                          Analyzer <─────────────┘
//!                             ├─ DescriptiveStats   mean / stdev / median
//!                             ├─ Histogram          normalized hit/miss bins
//!                             ├─ best_threshold     optimal hit/miss cut
//!                             └─ ErrorRateCurve     error vs. repetitions
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use timerres::classify::{best_error_rate, curve::ErrorRateCurve, ClockMethod};
//!
//! let hits = [10.0, 10.0, 10.0, 12.0, 12.0];
//! let misses = [30.0, 30.0, 28.0, 31.0, 29.0];
//!
//! // Fully separated populations classify without error.
//! assert_eq!(best_error_rate(&hits, &misses, ClockMethod::Direct)?, 0.0);
//!
//! let curve = ErrorRateCurve::compute(&hits, &misses, ClockMethod::Direct)?;
//! assert_eq!(curve.len(), 4);
//! # Ok::<(), timerres::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod classify;
pub mod config;
pub mod error;
pub mod experiment;
pub mod stats;

pub use error::{Error, Result};
