//! Configuration for gesture-pilot.

use crate::core::emitter::EmitPolicy;
use crate::core::motion::MAX_SAMPLE_SIZE;
use crate::core::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inactivity window before recognition suspends itself
    #[serde(rename = "suspend_after_ms", with = "duration_millis")]
    pub suspend_after: Duration,

    /// Motion score (0-255) that wakes a suspended pipeline
    pub motion_wake_threshold: f64,

    /// Edge length of the square frames are downsampled to for motion scoring
    pub motion_sample_size: u32,

    /// Consecutive identical frames before the stable command switches
    pub stable_frames: u32,

    /// Whether the operator sees a mirrored preview
    pub mirrored_view: bool,

    /// When to publish the stable command
    pub emit_policy: EmitPolicy,

    /// Replay pacing in frames per second
    pub frame_rate: u32,

    /// Operator-requested suspension, picked up by a running agent
    pub suspended: bool,

    /// Path for exporting published commands
    pub export_path: PathBuf,

    /// Path for storing the activity log
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gesture-pilot");
        let pipeline = PipelineConfig::default();

        Self {
            suspend_after: pipeline.suspend_after,
            motion_wake_threshold: pipeline.motion_wake_threshold,
            motion_sample_size: pipeline.motion_sample_size,
            stable_frames: pipeline.stable_frames,
            mirrored_view: pipeline.mirrored_view,
            emit_policy: pipeline.emit_policy,
            frame_rate: 30,
            suspended: false,
            export_path: data_dir.join("exports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gesture-pilot")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stable_frames == 0 {
            return Err(ConfigError::InvalidValue(
                "stable_frames must be at least 1".to_string(),
            ));
        }
        if self.motion_sample_size == 0 || self.motion_sample_size > MAX_SAMPLE_SIZE {
            return Err(ConfigError::InvalidValue(format!(
                "motion_sample_size must be between 1 and {MAX_SAMPLE_SIZE}"
            )));
        }
        if !self.motion_wake_threshold.is_finite() || self.motion_wake_threshold < 0.0 {
            return Err(ConfigError::InvalidValue(
                "motion_wake_threshold must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// The pipeline settings carried by this configuration.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            suspend_after: self.suspend_after,
            motion_wake_threshold: self.motion_wake_threshold,
            motion_sample_size: self.motion_sample_size,
            stable_frames: self.stable_frames,
            mirrored_view: self.mirrored_view,
            emit_policy: self.emit_policy,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
