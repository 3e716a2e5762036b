use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::segment_builder::SegmentConfig;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Output language hint passed to the backend (e.g. "en-US")
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Transcription backend config
    #[serde(default)]
    pub backend: BackendConfig,

    /// Audio upload config
    #[serde(default)]
    pub storage: StorageConfig,

    /// Audio extraction config
    #[serde(default)]
    pub audio: AudioConfig,

    /// Word-to-cue segmentation tunables
    #[serde(default)]
    pub segmentation: SegmentConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Transcription backend settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    /// Service endpoint URL
    #[serde(default = "default_backend_endpoint")]
    pub endpoint: String,

    /// API key (optional, sent as bearer token when set)
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Seconds between status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Overall wait budget in seconds, measured from submission
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Consecutive transient poll failures tolerated before giving up
    #[serde(default = "default_max_transient_retries")]
    pub max_transient_retries: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_backend_endpoint(),
            api_key: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
            max_transient_retries: default_max_transient_retries(),
        }
    }
}

/// Audio upload settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Presigned-URL issuing service endpoint
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_storage_endpoint(),
        }
    }
}

/// Audio extraction settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    /// Bitrate in bps for the extracted mp3
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,

    /// Path to the ffmpeg binary
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bitrate: default_bitrate(),
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_backend_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_storage_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    30 * 60
}

fn default_max_transient_retries() -> u32 {
    3
}

fn default_bitrate() -> u32 {
    48_000
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language_code: default_language_code(),
            backend: BackendConfig::default(),
            storage: StorageConfig::default(),
            audio: AudioConfig::default(),
            segmentation: SegmentConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// Checks the endpoints are parseable URLs, the polling and audio knobs
    /// are positive, and the segmentation limits are satisfiable.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend.endpoint)
            .map_err(|e| anyhow!("Invalid backend endpoint '{}': {}", self.backend.endpoint, e))?;
        Url::parse(&self.storage.endpoint)
            .map_err(|e| anyhow!("Invalid storage endpoint '{}': {}", self.storage.endpoint, e))?;

        if self.language_code.is_empty() {
            return Err(anyhow!("language_code must not be empty"));
        }
        if self.backend.poll_interval_secs == 0 {
            return Err(anyhow!("poll_interval_secs must be at least 1"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be at least 1"));
        }
        if self.audio.bitrate == 0 {
            return Err(anyhow!("audio bitrate must be positive"));
        }

        self.segmentation
            .validate()
            .map_err(|e| anyhow!("Invalid segmentation config: {}", e))?;

        Ok(())
    }
}
