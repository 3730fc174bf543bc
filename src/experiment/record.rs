//! Measurement Record - one experiment result for one browser build
//!
//! Records serialize to a flat JSON object: the common header fields
//! (`browser`, `version`, `coop`, `recorded_at`), a `kind` tag, and the
//! fields of that kind.
//!
//! ```json
//! {
//!   "browser": "firefox",
//!   "version": "81",
//!   "coop": true,
//!   "recorded_at": "2020-10-01T12:00:00Z",
//!   "kind": "hit_miss",
//!   "clock_method": "interpolated",
//!   "label": "hits",
//!   "values": [12.0, 13.0],
//!   "average": 12.5,
//!   "standard_deviation": 0.7071067811865476,
//!   "median": 12.5
//! }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Browser, SubjectKey};
use crate::classify::ClockMethod;
use crate::stats::SampleSummary;
use crate::Result;

/// Which population a hit/miss sample sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLabel {
    /// Cached (fast) accesses
    Hits,
    /// Uncached (slow) accesses
    Misses,
}

/// Discriminant of a [`RecordPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// SharedArrayBuffer availability probe
    SabAvailability,
    /// Increments counted per clock edge
    TickDistribution,
    /// Labeled cache access latencies
    HitMiss,
    /// Timer cost against a cycle counter
    TimerCalibration,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SabAvailability => "sab_availability",
            Self::TickDistribution => "tick_distribution",
            Self::HitMiss => "hit_miss",
            Self::TimerCalibration => "timer_calibration",
        })
    }
}

/// Samples of one hit/miss population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitMissSamples {
    /// Clock the latencies were read with
    pub clock_method: ClockMethod,
    /// Population label
    pub label: AccessLabel,
    /// Values and statistics
    #[serde(flatten)]
    pub summary: SampleSummary,
}

/// Timer execution cost measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSamples {
    /// Timer being calibrated
    pub clock_method: ClockMethod,
    /// Values and statistics
    #[serde(flatten)]
    pub summary: SampleSummary,
}

/// Kind-specific content of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordPayload {
    /// Whether SharedArrayBuffer was usable, and the preferences it needed
    SabAvailability {
        /// SharedArrayBuffer constructor reachable from the page
        sab_available: bool,
        /// Browser preferences enabled to get there
        flags: Vec<String>,
    },
    /// Ticks counted within one clock period, per measurement
    TickDistribution(SampleSummary),
    /// One labeled hit/miss latency population
    HitMiss(HitMissSamples),
    /// Timer execution cost
    TimerCalibration(CalibrationSamples),
}

impl RecordPayload {
    /// Discriminant of this payload.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::SabAvailability { .. } => RecordKind::SabAvailability,
            Self::TickDistribution(_) => RecordKind::TickDistribution,
            Self::HitMiss(_) => RecordKind::HitMiss,
            Self::TimerCalibration(_) => RecordKind::TimerCalibration,
        }
    }
}

/// A single experiment result, appended to the log of its subject.
///
/// Records are immutable once built; the log only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    browser: Browser,
    version: String,
    coop: bool,
    recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    payload: RecordPayload,
}

impl MeasurementRecord {
    /// Create a record stamped with the current time.
    ///
    /// # Arguments
    ///
    /// * `subject` - Browser build the measurement ran on
    /// * `coop` - Whether cross-origin isolation (COOP/COEP) was enabled
    /// * `payload` - Kind-specific content
    #[must_use]
    pub fn new(subject: &SubjectKey, coop: bool, payload: RecordPayload) -> Self {
        Self::builder(subject, coop, payload).build()
    }

    /// Create a builder for a record with a custom timestamp.
    #[must_use]
    pub fn builder(
        subject: &SubjectKey,
        coop: bool,
        payload: RecordPayload,
    ) -> MeasurementRecordBuilder {
        MeasurementRecordBuilder::new(subject, coop, payload)
    }

    /// SharedArrayBuffer availability record.
    #[must_use]
    pub fn sab_availability(
        subject: &SubjectKey,
        coop: bool,
        sab_available: bool,
        flags: Vec<String>,
    ) -> Self {
        Self::new(
            subject,
            coop,
            RecordPayload::SabAvailability {
                sab_available,
                flags,
            },
        )
    }

    /// Tick distribution record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if fewer than 2 values are given.
    pub fn tick_distribution(subject: &SubjectKey, coop: bool, values: Vec<f64>) -> Result<Self> {
        let summary = SampleSummary::from_values(values)?;
        Ok(Self::new(subject, coop, RecordPayload::TickDistribution(summary)))
    }

    /// Hit/miss record for one population.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if fewer than 2 values are given.
    pub fn hit_miss(
        subject: &SubjectKey,
        coop: bool,
        clock_method: ClockMethod,
        label: AccessLabel,
        values: Vec<f64>,
    ) -> Result<Self> {
        let summary = SampleSummary::from_values(values)?;
        Ok(Self::new(
            subject,
            coop,
            RecordPayload::HitMiss(HitMissSamples {
                clock_method,
                label,
                summary,
            }),
        ))
    }

    /// Timer calibration record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if fewer than 2 values are given.
    pub fn timer_calibration(
        subject: &SubjectKey,
        coop: bool,
        clock_method: ClockMethod,
        values: Vec<f64>,
    ) -> Result<Self> {
        let summary = SampleSummary::from_values(values)?;
        Ok(Self::new(
            subject,
            coop,
            RecordPayload::TimerCalibration(CalibrationSamples {
                clock_method,
                summary,
            }),
        ))
    }

    /// Browser family.
    #[must_use]
    pub const fn browser(&self) -> Browser {
        self.browser
    }

    /// Browser version label.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Subject this record belongs to.
    #[must_use]
    pub fn subject(&self) -> SubjectKey {
        SubjectKey::new(self.browser, self.version.clone())
    }

    /// Whether cross-origin isolation was enabled.
    #[must_use]
    pub const fn coop(&self) -> bool {
        self.coop
    }

    /// When the record was created.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Kind-specific content.
    #[must_use]
    pub const fn payload(&self) -> &RecordPayload {
        &self.payload
    }

    /// Record kind.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        self.payload.kind()
    }
}

/// Builder for `MeasurementRecord`.
#[derive(Debug)]
pub struct MeasurementRecordBuilder {
    subject: SubjectKey,
    coop: bool,
    recorded_at: DateTime<Utc>,
    payload: RecordPayload,
}

impl MeasurementRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(subject: &SubjectKey, coop: bool, payload: RecordPayload) -> Self {
        Self {
            subject: subject.clone(),
            coop,
            recorded_at: Utc::now(),
            payload,
        }
    }

    /// Set a custom timestamp.
    #[must_use]
    pub const fn recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    /// Build the `MeasurementRecord`.
    #[must_use]
    pub fn build(self) -> MeasurementRecord {
        MeasurementRecord {
            browser: self.subject.browser(),
            version: self.subject.version().to_string(),
            coop: self.coop,
            recorded_at: self.recorded_at,
            payload: self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> SubjectKey {
        SubjectKey::new(Browser::Firefox, "81")
    }

    #[test]
    fn test_hit_miss_record_fields() {
        let record = MeasurementRecord::hit_miss(
            &subject(),
            true,
            ClockMethod::Interpolated,
            AccessLabel::Hits,
            vec![12.0, 13.0],
        )
        .unwrap();

        assert_eq!(record.kind(), RecordKind::HitMiss);
        assert_eq!(record.browser(), Browser::Firefox);
        assert_eq!(record.version(), "81");
        assert!(record.coop());
        match record.payload() {
            RecordPayload::HitMiss(samples) => {
                assert_eq!(samples.label, AccessLabel::Hits);
                assert!((samples.summary.stats().average - 12.5).abs() < f64::EPSILON);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_record_requires_two_samples() {
        assert!(MeasurementRecord::tick_distribution(&subject(), false, vec![1.0]).is_err());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = MeasurementRecord::hit_miss(
            &subject(),
            false,
            ClockMethod::Direct,
            AccessLabel::Misses,
            vec![30.0, 32.0],
        )
        .unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "hit_miss");
        assert_eq!(json["browser"], "firefox");
        assert_eq!(json["version"], "81");
        assert_eq!(json["coop"], false);
        assert_eq!(json["clock_method"], "direct");
        assert_eq!(json["label"], "misses");
        assert_eq!(json["average"], 31.0);
        assert_eq!(json["values"][1], 32.0);
    }
}
