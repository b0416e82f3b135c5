//! Configuration file handling for motion-tweet.
//!
//! Loads configuration from `~/.config/motion-tweet/config.toml` or a custom path.
//! Every field has a built-in default, so an empty or missing file is valid.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::Resolution;

/// Configuration file structure for motion-tweet.
///
/// Built once at startup and handed to each component by reference; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub dry_run: DryRunConfig,
}

/// Motion detection settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MotionConfig {
    /// How much a pixel's green value has to change to count as changed.
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// How many changed pixels are needed before a capture is triggered.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u32,
    #[serde(default = "default_test_width")]
    pub test_width: u32,
    #[serde(default = "default_test_height")]
    pub test_height: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CameraConfig {
    /// Still-capture executable (raspistill compatible flags).
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_test_timeout_ms")]
    pub test_timeout_ms: u64,
    #[serde(default = "default_save_width")]
    pub save_width: u32,
    #[serde(default = "default_save_height")]
    pub save_height: u32,
    #[serde(default = "default_save_timeout_ms")]
    pub save_timeout_ms: u64,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Hard limit on a single capture process before it is killed.
    #[serde(default = "default_process_timeout_secs")]
    pub process_timeout_secs: u64,
    /// Fixed pause between failed test-frame acquisitions.
    #[serde(default = "default_acquire_retry_delay_ms")]
    pub acquire_retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Free space to keep in the capture directory, in bytes.
    #[serde(default = "default_reserve_bytes")]
    pub reserve_bytes: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PublishConfig {
    /// First wait after a failed publish; doubled after every further failure.
    #[serde(default = "default_base_wait_secs")]
    pub base_wait_secs: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DryRunConfig {
    #[serde(default = "default_dry_run_iterations")]
    pub iterations: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            sensitivity: default_sensitivity(),
            test_width: default_test_width(),
            test_height: default_test_height(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            test_timeout_ms: default_test_timeout_ms(),
            save_width: default_save_width(),
            save_height: default_save_height(),
            save_timeout_ms: default_save_timeout_ms(),
            jpeg_quality: default_jpeg_quality(),
            process_timeout_secs: default_process_timeout_secs(),
            acquire_retry_delay_ms: default_acquire_retry_delay_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reserve_bytes: default_reserve_bytes(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            base_wait_secs: default_base_wait_secs(),
        }
    }
}

impl Default for DryRunConfig {
    fn default() -> Self {
        Self {
            iterations: default_dry_run_iterations(),
        }
    }
}

impl MotionConfig {
    pub fn test_resolution(&self) -> Resolution {
        Resolution::new(self.test_width, self.test_height)
    }
}

impl CameraConfig {
    pub fn save_resolution(&self) -> Resolution {
        Resolution::new(self.save_width, self.save_height)
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.process_timeout_secs)
    }

    pub fn acquire_retry_delay(&self) -> Duration {
        Duration::from_millis(self.acquire_retry_delay_ms)
    }
}

impl PublishConfig {
    pub fn base_wait(&self) -> Duration {
        Duration::from_secs(self.base_wait_secs)
    }
}

fn default_threshold() -> u8 {
    10
}
fn default_sensitivity() -> u32 {
    20
}
fn default_test_width() -> u32 {
    100
}
fn default_test_height() -> u32 {
    75
}
fn default_command() -> String {
    "raspistill".into()
}
fn default_test_timeout_ms() -> u64 {
    200
}
fn default_save_width() -> u32 {
    1280
}
fn default_save_height() -> u32 {
    960
}
fn default_save_timeout_ms() -> u64 {
    500
}
fn default_jpeg_quality() -> u8 {
    15
}
fn default_process_timeout_secs() -> u64 {
    30
}
fn default_acquire_retry_delay_ms() -> u64 {
    100
}
fn default_reserve_bytes() -> u64 {
    40 * 1024 * 1024
}
fn default_base_wait_secs() -> u64 {
    60
}
fn default_dry_run_iterations() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            Self::load_from_explicit(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a path the user named explicitly.
    /// Unlike [`Config::load`], a missing file is an error.
    pub fn load_from_explicit(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        config.validate().map_err(|(field, reason)| ConfigError::InvalidValue {
            path,
            field,
            reason,
        })?;
        Ok(config)
    }

    /// Reject values that parse but can never work.
    ///
    /// Returns the offending field and what is wrong with it.
    pub fn validate(&self) -> Result<(), (&'static str, &'static str)> {
        let checks = [
            (self.motion.test_width == 0, "motion.test_width", "must be at least 1"),
            (self.motion.test_height == 0, "motion.test_height", "must be at least 1"),
            (self.camera.save_width == 0, "camera.save_width", "must be at least 1"),
            (self.camera.save_height == 0, "camera.save_height", "must be at least 1"),
            (self.camera.command.trim().is_empty(), "camera.command", "must not be empty"),
            (
                self.camera.jpeg_quality > 100,
                "camera.jpeg_quality",
                "must be between 0 and 100",
            ),
            (
                self.camera.process_timeout_secs == 0,
                "camera.process_timeout_secs",
                "must be at least 1",
            ),
        ];
        match checks.into_iter().find(|(bad, _, _)| *bad) {
            Some((_, field, reason)) => Err((field, reason)),
            None => Ok(()),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: PathBuf,
        field: &'static str,
        reason: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue {
                path,
                field,
                reason,
            } => {
                write!(
                    f,
                    "Invalid config file '{}': {} {}",
                    path.display(),
                    field,
                    reason
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Directory holding motion-tweet's config and secrets files.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("motion-tweet")
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the default secrets file path.
pub fn default_auth_path() -> PathBuf {
    config_dir().join("auth")
}
