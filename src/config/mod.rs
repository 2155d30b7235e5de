//! Configuration module for reed.
//!
//! Provides `AppConfig` (persisted settings), `AppPaths` for cross-platform
//! directories, TOML persistence via `AppConfig::load` / `AppConfig::save`,
//! and `SpeechConfig`, the immutable per-run configuration handed to the
//! playback core.

pub mod paths;
pub mod settings;
pub mod speech;

pub use paths::AppPaths;
pub use settings::{AppConfig, EngineConfig, PlayerConfig, DEFAULT_SILENCE, DEFAULT_VOICE};
pub use speech::{ConfigError, SpeechConfig};
