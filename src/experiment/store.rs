//! Sample Store - file-backed, append-only measurement logs
//!
//! One JSON file per `(browser, version)` subject holds the ordered list of
//! every record measured on that build, in experiment execution order.
//! Records are never modified or removed.
//!
//! ## Write Pattern
//!
//! Appends read the whole log, push the record and write the whole log back.
//! Two guards keep this safe:
//!
//! - Appends to the same file go through a per-file mutex owned by the
//!   store, so concurrent appenders sharing one `SampleStore` never lose
//!   each other's records.
//! - The new log is written to a temporary file and renamed over the old
//!   one, so readers see either the previous or the next log, never a
//!   partial one.
//!
//! Processes that open separate stores on the same directory are not
//! coordinated; share one store (e.g. behind an `Arc`) instead.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Browser, MeasurementRecord, RecordKind, SubjectKey};
use crate::config::Config;
use crate::{Error, Result};

/// Ordered, append-only list of records for one subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordLog {
    records: Vec<MeasurementRecord>,
}

impl RecordLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in execution order.
    #[must_use]
    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    /// Iterate over records in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, MeasurementRecord> {
        self.records.iter()
    }

    /// Records of one kind, in execution order.
    pub fn of_kind(&self, kind: RecordKind) -> impl Iterator<Item = &MeasurementRecord> {
        self.records.iter().filter(move |r| r.kind() == kind)
    }

    /// Most recently appended record.
    #[must_use]
    pub fn last(&self) -> Option<&MeasurementRecord> {
        self.records.last()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the log holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, record: MeasurementRecord) {
        self.records.push(record);
    }
}

impl FromIterator<MeasurementRecord> for RecordLog {
    fn from_iter<I: IntoIterator<Item = MeasurementRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RecordLog {
    type Item = &'a MeasurementRecord;
    type IntoIter = std::slice::Iter<'a, MeasurementRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// File-backed store of measurement logs.
///
/// ## Example
///
/// ```rust,no_run
/// use timerres::config::Config;
/// use timerres::experiment::{Browser, MeasurementRecord, SampleStore, SubjectKey};
///
/// let store = SampleStore::new(Config::default());
/// let subject = SubjectKey::new(Browser::Firefox, "81");
///
/// let record = MeasurementRecord::tick_distribution(&subject, false, vec![41.0, 43.0, 40.0])?;
/// store.append(record, &subject)?;
///
/// let log = store.read_all(&subject)?;
/// assert_eq!(log.len(), 1);
/// # Ok::<(), timerres::Error>(())
/// ```
#[derive(Debug)]
pub struct SampleStore {
    config: Config,
    writers: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl SampleStore {
    /// Create a store rooted at `config.results_dir`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            writers: DashMap::new(),
        }
    }

    /// Store configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Append `record` to the log of `subject` and return the new log length.
    ///
    /// A missing log starts empty. An unparsable log is moved aside to
    /// the first free `<file>.corrupt[.N]` backup, reported with a warning, and replaced by a log
    /// holding only `record`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedSubject` if the browser is not configured,
    /// `InvalidInput` for an invalid version or if `record` belongs to
    /// another subject, and `Io` or `Serialization` if the log cannot be
    /// written.
    pub fn append(&self, record: MeasurementRecord, subject: &SubjectKey) -> Result<usize> {
        self.check_subject(subject)?;
        if record.browser() != subject.browser() || record.version() != subject.version() {
            return Err(Error::InvalidInput(format!(
                "record for {} appended to log of {subject}",
                record.subject()
            )));
        }

        let path = self.config.log_path(subject);
        let writer = Arc::clone(self.writers.entry(path.clone()).or_default().value());
        let _guard = writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut log = match load_log(&path) {
            Ok(log) => log,
            Err(Error::NotFound(_)) => RecordLog::new(),
            Err(Error::CorruptLog { path, reason }) => {
                let backup = corrupt_backup_path(&path);
                warn!(
                    log = %path.display(),
                    backup = %backup.display(),
                    %reason,
                    "measurement log is corrupt, starting a new one"
                );
                fs::rename(&path, &backup)?;
                RecordLog::new()
            }
            Err(e) => return Err(e),
        };

        log.push(record);
        write_log(&path, &log)?;
        debug!(%subject, records = log.len(), "appended measurement record");
        Ok(log.len())
    }

    /// Read the full log of `subject`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedSubject` if the browser is not configured,
    /// `InvalidInput` for an invalid version, `NotFound` if no log exists
    /// yet, and `CorruptLog` if it cannot be parsed.
    pub fn read_all(&self, subject: &SubjectKey) -> Result<RecordLog> {
        self.check_subject(subject)?;
        let log = load_log(&self.config.log_path(subject))?;
        debug!(%subject, records = log.len(), "read measurement log");
        Ok(log)
    }

    /// Versions of `browser` that have a log on disk, sorted.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedSubject` if the browser is not configured and `Io`
    /// if the browser directory exists but cannot be listed.
    pub fn versions(&self, browser: Browser) -> Result<Vec<String>> {
        self.check_supported(browser)?;
        let dir = self.config.browser_dir(browser);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "no results directory");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{browser}-");
        let mut versions = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(version) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                if !version.is_empty() {
                    versions.push(version.to_string());
                }
            }
        }
        versions.sort();
        Ok(versions)
    }

    fn check_subject(&self, subject: &SubjectKey) -> Result<()> {
        self.check_supported(subject.browser())?;
        subject.validate()
    }

    fn check_supported(&self, browser: Browser) -> Result<()> {
        if self.config.supports(browser) {
            Ok(())
        } else {
            Err(Error::UnsupportedSubject(format!(
                "{browser} is not a supported browser"
            )))
        }
    }
}

fn load_log(path: &Path) -> Result<RecordLog> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::NotFound(format!(
                "no measurement log at {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        if e.is_io() {
            Error::Serialization(e)
        } else {
            Error::CorruptLog {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
    })
}

fn write_log(path: &Path, log: &RecordLog) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let tmp = path.with_extension("json.tmp");
    let file = File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, log)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    fs::rename(&tmp, path)?;
    Ok(())
}

/// First backup name not yet taken: `<file>.json.corrupt`, then
/// `<file>.json.corrupt.1`, `<file>.json.corrupt.2`, ...
fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut backup = path.with_extension("json.corrupt");
    let mut n = 0_u32;
    while backup.exists() {
        n += 1;
        backup = path.with_extension(format!("json.corrupt.{n}"));
    }
    backup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_default() {
        let log = RecordLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(log.last().is_none());
    }

    #[test]
    fn test_log_serializes_as_array() {
        let json = serde_json::to_string(&RecordLog::new()).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_backup_path() {
        let path = Path::new("/r/firefox/firefox-81.json");
        assert_eq!(
            corrupt_backup_path(path),
            PathBuf::from("/r/firefox/firefox-81.json.corrupt")
        );
    }
}
