//! Configuration loading and typed config structures for Drumwatch.
//!
//! The optional configuration file is `drumwatch-config.yaml` in the working
//! directory of the host. Every field has a default matching the deployed
//! widget (a 1000x600 image refreshed every 15 minutes), so an absent file
//! or an empty document is a valid configuration.
//!
//! The unit roster is not configurable; see [`crate::roster`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Shortest refresh interval the host accepts, in minutes.
pub const MIN_REFRESH_MINUTES: u64 = 15;

/// Largest accepted image width or height, in pixels.
pub const MAX_RENDER_DIMENSION: u32 = 8192;

/// Seconds in one minute.
const SECONDS_PER_MINUTE: u64 = 60;

/// Errors that can occur when loading configuration or flag files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `drumwatch-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DrumwatchConfig {
    /// Output image settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Periodic refresh settings.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Where the snapshot is written and where flags are read from.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DrumwatchConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is unusable.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = (self.render.width, self.render.height);
        if width == 0 || height == 0 {
            return Err(ConfigError::Invalid {
                reason: format!("render size must be non-zero, got {width}x{height}"),
            });
        }
        if width > MAX_RENDER_DIMENSION || height > MAX_RENDER_DIMENSION {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "render size must be at most {MAX_RENDER_DIMENSION} per side, got {width}x{height}"
                ),
            });
        }
        self.refresh.interval()?;
        Ok(())
    }
}

/// Output image settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderConfig {
    /// Image width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Image height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Optional `TrueType` font for labels. The built-in bitmap face is used
    /// when unset.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            font_path: None,
        }
    }
}

/// Periodic refresh settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshConfig {
    /// Minutes between periodic refreshes. Values below
    /// [`MIN_REFRESH_MINUTES`] are raised to it.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
        }
    }
}

impl RefreshConfig {
    /// The effective refresh interval, never shorter than
    /// [`MIN_REFRESH_MINUTES`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the interval does not fit in a
    /// [`Duration`] of seconds.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        let minutes = self.interval_minutes.max(MIN_REFRESH_MINUTES);
        let seconds = minutes
            .checked_mul(SECONDS_PER_MINUTE)
            .ok_or_else(|| ConfigError::Invalid {
                reason: format!("refresh interval of {minutes} minutes overflows"),
            })?;
        Ok(Duration::from_secs(seconds))
    }
}

/// File locations used by the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Where the rendered snapshot is written (PNG).
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Flat YAML map of maintenance flags, re-read before every render.
    #[serde(default = "default_flags_path")]
    pub flags_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            flags_path: default_flags_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_width() -> u32 {
    1000
}

const fn default_height() -> u32 {
    600
}

const fn default_interval_minutes() -> u64 {
    MIN_REFRESH_MINUTES
}

fn default_output_path() -> PathBuf {
    PathBuf::from("drumwatch.png")
}

fn default_flags_path() -> PathBuf {
    PathBuf::from("drumwatch-flags.yaml")
}

fn default_log_level() -> String {
    "info".to_owned()
}
