//! Subject identity - which browser build a measurement came from

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Browser family under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome / Chromium
    Chrome,
    /// Tor Browser
    Tor,
}

impl Browser {
    /// Every browser family this crate knows about.
    pub const ALL: [Self; 3] = [Self::Firefox, Self::Chrome, Self::Tor];

    /// Lowercase name, also used in log file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Firefox => "firefox",
            Self::Chrome => "chrome",
            Self::Tor => "tor",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedSubject(format!("unknown browser: {s}")))
    }
}

/// A `(browser, version)` pair; one measurement log exists per subject.
///
/// Versions are free-form strings: usually a major version number, but
/// custom builds (e.g. a cycle-counter instrumented build) use a label.
/// A version is also a file name component, so it must be non-empty and
/// free of path separators; [`SampleStore`](super::SampleStore) rejects keys
/// that are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StoredSubjectKey")]
pub struct SubjectKey {
    browser: Browser,
    version: String,
}

impl SubjectKey {
    /// Create a subject key without validating `version`.
    ///
    /// Use [`SubjectKey::parse`] for untrusted input.
    #[must_use]
    pub fn new(browser: Browser, version: impl Into<String>) -> Self {
        Self {
            browser,
            version: version.into(),
        }
    }

    /// Parse a subject from a browser name.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedSubject` for an unknown browser name, and
    /// `InvalidInput` for an empty version or one containing a path separator.
    pub fn parse(browser: &str, version: impl Into<String>) -> Result<Self> {
        let subject = Self::new(browser.parse()?, version);
        subject.validate()?;
        Ok(subject)
    }

    /// Check that the version is usable as a file name component.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty version, `.` or `..`, or one
    /// containing a path separator.
    pub fn validate(&self) -> Result<()> {
        let version = self.version.as_str();
        if version.is_empty() || version.contains(['/', '\\']) || matches!(version, "." | "..") {
            return Err(Error::InvalidInput(format!(
                "invalid browser version: {version:?}"
            )));
        }
        Ok(())
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

    /// Log file name: `<browser>-<version>.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.browser, self.version)
    }
}

#[derive(Deserialize)]
struct StoredSubjectKey {
    browser: Browser,
    version: String,
}

impl TryFrom<StoredSubjectKey> for SubjectKey {
    type Error = Error;

    fn try_from(stored: StoredSubjectKey) -> Result<Self> {
        let subject = Self::new(stored.browser, stored.version);
        subject.validate()?;
        Ok(subject)
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.browser, self.version)
    }
}
