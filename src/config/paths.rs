//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\reed\
//!   macOS:   ~/Library/Application Support/reed/
//!   Linux:   ~/.config/reed/
//!
//! Data dir (voice models):
//!   Windows: %LOCALAPPDATA%\reed\
//!   macOS:   ~/Library/Application Support/reed/
//!   Linux:   ~/.local/share/reed/

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory holding downloaded `.onnx` voice models and their
    /// `.onnx.json` sidecars.
    pub data_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "reed";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self::with_roots(config_dir, data_dir)
    }

    /// Build paths under explicit roots (tests, portable installs).
    pub fn with_roots(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let settings_file = config_dir.join("settings.toml");
        Self {
            config_dir,
            settings_file,
            data_dir: data_dir.into(),
        }
    }

    /// Create the data directory if it does not exist yet and return it.
    pub fn ensure_data_dir(&self) -> std::io::Result<&Path> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(&self.data_dir)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
