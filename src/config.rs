//! Configuration for measurement storage and analysis.
//!
//! Built once and handed to [`SampleStore`](crate::experiment::SampleStore)
//! and [`Analyzer`](crate::analysis::Analyzer); nothing reads global state.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::curve::MAX_REPETITION_CAP;
use crate::experiment::{Browser, SubjectKey};
use crate::{Error, Result};

/// Default number of measurements requested per experiment run.
pub const DEFAULT_MEASUREMENT_REPETITIONS: usize = 1000;

/// Storage and analysis settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory holding one sub-directory of logs per browser
    /// (default: `./results`).
    pub results_dir: PathBuf,

    /// Browsers logs may be written for or read from
    /// (default: firefox, chrome, tor).
    pub supported_browsers: Vec<Browser>,

    /// Exclusive upper bound on the repetition count of error rate curves
    /// (default: 50).
    pub max_repetitions: usize,

    /// Measurements requested from instrumentation per run (default: 1,000).
    pub measurement_repetitions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("./results"),
            supported_browsers: Browser::ALL.to_vec(),
            max_repetitions: MAX_REPETITION_CAP,
            measurement_repetitions: DEFAULT_MEASUREMENT_REPETITIONS,
        }
    }
}

impl Config {
    /// Create a configuration builder starting from the defaults.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a configuration from a JSON file; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be opened, `Serialization` if it is
    /// not valid JSON, and `InvalidInput` if a value is out of range.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `max_repetitions` or
    /// `measurement_repetitions` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_repetitions == 0 {
            return Err(Error::InvalidInput(
                "max_repetitions must be positive".to_string(),
            ));
        }
        if self.measurement_repetitions == 0 {
            return Err(Error::InvalidInput(
                "measurement_repetitions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `browser` is in the supported set.
    #[must_use]
    pub fn supports(&self, browser: Browser) -> bool {
        self.supported_browsers.contains(&browser)
    }

    /// Directory holding the logs of `browser`.
    #[must_use]
    pub fn browser_dir(&self, browser: Browser) -> PathBuf {
        self.results_dir.join(browser.as_str())
    }

    /// Log file of `subject`: `<results_dir>/<browser>/<browser>-<version>.json`.
    #[must_use]
    pub fn log_path(&self, subject: &SubjectKey) -> PathBuf {
        self.browser_dir(subject.browser()).join(subject.file_name())
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the results directory
    #[must_use]
    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.results_dir = dir.into();
        self
    }

    /// Restrict the supported browsers
    #[must_use]
    pub fn supported_browsers(mut self, browsers: impl IntoIterator<Item = Browser>) -> Self {
        self.config.supported_browsers = browsers.into_iter().collect();
        self
    }

    /// Set the repetition cap for error rate curves
    #[must_use]
    pub const fn max_repetitions(mut self, cap: usize) -> Self {
        self.config.max_repetitions = cap;
        self
    }

    /// Set the number of measurements per run
    #[must_use]
    pub const fn measurement_repetitions(mut self, count: usize) -> Self {
        self.config.measurement_repetitions = count;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a value is out of range
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
