//! Persisted settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Every field is
//! `#[serde(default)]` so a hand-written `settings.toml` only needs the keys
//! it wants to change.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Voice used when neither `-m` nor `settings.toml` names one.
pub const DEFAULT_VOICE: &str = "en_US-kristin-medium";

/// Seconds of silence inserted between sentences by default.
pub const DEFAULT_SILENCE: f32 = 0.6;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// How to launch the speech-synthesis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable name or path (e.g. `"piper"` or `"python3"`).
    pub program: String,
    /// Arguments placed before the generated `--model …` arguments
    /// (e.g. `["-m", "piper"]` to run piper as a Python module).
    pub args: Vec<String>,
    /// Treat any output on the engine's stderr as a synthesis failure.
    ///
    /// Disable for engines that log progress to stderr.
    pub fail_on_stderr: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "piper".into(),
            args: Vec::new(),
            fail_on_stderr: true,
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerConfig
// ---------------------------------------------------------------------------

/// Audio player override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Full player command line, e.g. `["mpv", "--no-video"]`.  The audio
    /// file path is appended as the last argument.
    ///
    /// `None` (or an empty list) lets the platform resolver pick a player.
    pub command: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use reed::config::AppConfig;
///
/// // Returns Default when the file is missing.
/// let config = AppConfig::load().unwrap();
/// println!("default voice: {}", config.voice);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Voice name (file stem under the data directory) used without `-m`.
    pub voice: String,
    /// Speech speed multiplier passed as the engine's length scale.
    pub speed: f32,
    /// Volume multiplier.
    pub volume: f32,
    /// Seconds of silence between sentences.
    pub silence: f32,
    /// Synthesis engine launch settings.
    pub engine: EngineConfig,
    /// Audio player override.
    pub player: PlayerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.into(),
            speed: 1.0,
            volume: 1.0,
            silence: DEFAULT_SILENCE,
            engine: EngineConfig::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// The configured player override, if it names at least a program.
    pub fn player_override(&self) -> Option<&[String]> {
        self.player
            .command
            .as_deref()
            .filter(|command| !command.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
