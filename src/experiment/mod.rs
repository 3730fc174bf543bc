//! Measurement records and their persistence
//!
//! ## Schema Overview
//!
//! ```text
//! SubjectKey (browser, version) (1) ──< RecordLog (1 file)
//!                                           │
//!                                           └──< MeasurementRecord (N) [append-only]
//!                                                  ├─ SabAvailability
//!                                                  ├─ TickDistribution
//!                                                  ├─ HitMiss (hits | misses)
//!                                                  └─ TimerCalibration
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use timerres::classify::ClockMethod;
//! use timerres::config::Config;
//! use timerres::experiment::{AccessLabel, Browser, MeasurementRecord, SampleStore, SubjectKey};
//!
//! let store = SampleStore::new(Config::default());
//! let subject = SubjectKey::new(Browser::Chrome, "84");
//!
//! let hits = MeasurementRecord::hit_miss(
//!     &subject, true, ClockMethod::Direct, AccessLabel::Hits, vec![10.0, 11.0, 10.0],
//! )?;
//! store.append(hits, &subject)?;
//! # Ok::<(), timerres::Error>(())
//! ```

mod record;
mod store;
mod subject;

pub use record::{
    AccessLabel, CalibrationSamples, HitMissSamples, MeasurementRecord, MeasurementRecordBuilder,
    RecordKind, RecordPayload,
};
pub use store::{RecordLog, SampleStore};
pub use subject::{Browser, SubjectKey};
