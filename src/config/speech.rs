//! The immutable per-run speech configuration.
//!
//! [`SpeechConfig`] is built once by the binary (settings overlaid with CLI
//! flags), validated, and then shared as `Arc<SpeechConfig>` by every
//! playback session in the run.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::{AppConfig, DEFAULT_SILENCE};

/// Errors detected before any process is spawned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The voice model file does not exist.
    #[error("Model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Speed must be strictly positive.
    #[error("speed must be greater than 0 (got {0})")]
    InvalidSpeed(f32),

    /// Volume must not be negative.
    #[error("volume must be 0 or greater (got {0})")]
    InvalidVolume(f32),

    /// Sentence silence must not be negative.
    #[error("silence must be 0 or greater (got {0})")]
    InvalidSilence(f32),
}

/// Settings for one invocation.  Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechConfig {
    /// Path to the `.onnx` voice model.
    pub model: PathBuf,
    /// Length-scale multiplier.
    pub speed: f32,
    /// Volume multiplier.
    pub volume: f32,
    /// Seconds of silence between sentences.
    pub silence: f32,
    /// Save synthesised audio here instead of playing it.
    pub output: Option<PathBuf>,
}

impl SpeechConfig {
    /// A configuration with default speed, volume and silence.
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            speed: 1.0,
            volume: 1.0,
            silence: DEFAULT_SILENCE,
            output: None,
        }
    }

    /// Take speed, volume and silence from persisted settings.
    pub fn from_settings(settings: &AppConfig, model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            speed: settings.speed,
            volume: settings.volume,
            silence: settings.silence,
            output: None,
        }
    }

    /// Check value ranges and that the model file exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_values()?;
        if !self.model.exists() {
            return Err(ConfigError::ModelNotFound(self.model.clone()));
        }
        Ok(())
    }

    /// Range checks only; used before a model has been downloaded.
    pub fn validate_values(&self) -> Result<(), ConfigError> {
        let speed_ok = self.speed.is_finite() && self.speed > 0.0;
        let volume_ok = self.volume.is_finite() && self.volume >= 0.0;
        let silence_ok = self.silence.is_finite() && self.silence >= 0.0;

        if !speed_ok {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        if !volume_ok {
            return Err(ConfigError::InvalidVolume(self.volume));
        }
        if !silence_ok {
            return Err(ConfigError::InvalidSilence(self.silence));
        }
        Ok(())
    }

    /// `true` when the run saves audio instead of playing it.
    pub fn is_save_mode(&self) -> bool {
        self.output.is_some()
    }

    /// The model path as given.
    pub fn model(&self) -> &Path {
        &self.model
    }
}
