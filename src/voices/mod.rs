//! Voice models: name parsing, path resolution and the installed-voice list.
//!
//! Piper voices are named `<lang>_<REGION>-<voice>-<quality>` (for example
//! `en_US-kristin-medium`) and live in the data directory as
//! `<name>.onnx` with a `<name>.onnx.json` sidecar.

pub mod download;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;

pub use download::{ensure_model, DownloadEvent, Downloader, HF_BASE_URL};

// ---------------------------------------------------------------------------
// VoiceError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("invalid voice name `{0}` (expected <lang>-<voice>-<quality>, e.g. en_US-kristin-medium)")]
    InvalidName(String),

    #[error("Download failed: {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// VoiceName
// ---------------------------------------------------------------------------

/// A voice name split into the parts of the download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceName {
    /// The full name, without `.onnx`.
    pub name: String,
    /// e.g. `en_US`
    pub lang_code: String,
    /// e.g. `kristin` (multi-part names are joined with `_`)
    pub voice: String,
    /// e.g. `medium`
    pub quality: String,
}

impl VoiceName {
    /// Parse `name`, accepting an optional trailing `.onnx`.
    pub fn parse(name: &str) -> Result<Self, VoiceError> {
        let name = name.strip_suffix(".onnx").unwrap_or(name);
        let parts: Vec<&str> = name.split('-').collect();

        match parts.as_slice() {
            [lang_code, middle @ .., quality]
                if !middle.is_empty()
                    && lang_code.len() >= 2
                    && parts.iter().all(|p| !p.is_empty()) =>
            {
                Ok(Self {
                    name: name.to_owned(),
                    lang_code: (*lang_code).to_owned(),
                    voice: middle.join("_"),
                    quality: (*quality).to_owned(),
                })
            }
            _ => Err(VoiceError::InvalidName(name.to_owned())),
        }
    }

    /// Two-letter language family (`en` for `en_US`).
    pub fn family(&self) -> &str {
        self.lang_code.get(..2).unwrap_or(&self.lang_code)
    }

    /// `(model_url, config_url)` under `base`.
    pub fn urls(&self, base: &str) -> (String, String) {
        let base = format!(
            "{}/{}/{}/{}/{}/{}",
            base.trim_end_matches('/'),
            self.family(),
            self.lang_code,
            self.voice,
            self.quality,
            self.name
        );
        (format!("{base}.onnx"), format!("{base}.onnx.json"))
    }

    pub fn file_name(&self) -> String {
        format!("{}.onnx", self.name)
    }
}

/// Download URLs for `name` on Hugging Face.
///
/// ```
/// let (model, config) = reed::voices::model_url("en_US-kristin-medium").unwrap();
/// assert!(model.ends_with("/en/en_US/kristin/medium/en_US-kristin-medium.onnx"));
/// assert!(config.ends_with(".onnx.json"));
/// ```
pub fn model_url(name: &str) -> Result<(String, String), VoiceError> {
    Ok(VoiceName::parse(name)?.urls(HF_BASE_URL))
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

/// Turn the `-m` argument into a model path.
///
/// * none → `<data_dir>/<default_voice>.onnx`
/// * an existing path → that path
/// * a bare name → `<data_dir>/<name>.onnx`
/// * anything else → the literal path (reported missing later)
pub fn resolve_model_path(arg: Option<&str>, default_voice: &str, data_dir: &Path) -> PathBuf {
    let Some(arg) = arg else {
        return data_dir.join(format!("{default_voice}.onnx"));
    };

    let literal = PathBuf::from(arg);
    if literal.exists() || arg.contains(['/', '\\']) {
        return literal;
    }

    if arg.ends_with(".onnx") {
        data_dir.join(arg)
    } else {
        data_dir.join(format!("{arg}.onnx"))
    }
}

// ---------------------------------------------------------------------------
// Installed voices
// ---------------------------------------------------------------------------

/// A `.onnx` file in the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVoice {
    pub name: String,
    pub size_bytes: u64,
}

impl InstalledVoice {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1_048_576.0
    }
}

/// Voices in `dir`, sorted by name.  A missing directory has none.
pub fn list_installed(dir: &Path) -> Result<Vec<InstalledVoice>, VoiceError> {
    let io_err = |source| VoiceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(e)),
    };

    let mut voices = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("onnx") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let size_bytes = entry.metadata().map_err(io_err)?.len();
        voices.push(InstalledVoice {
            name: name.to_owned(),
            size_bytes,
        });
    }

    voices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(voices)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_name() {
        let v = VoiceName::parse("en_US-kristin-medium").unwrap();
        assert_eq!(v.lang_code, "en_US");
        assert_eq!(v.voice, "kristin");
        assert_eq!(v.quality, "medium");
        assert_eq!(v.family(), "en");
    }

    #[test]
    fn multi_part_voice_is_joined_with_underscore() {
        let v = VoiceName::parse("en_GB-southern_english-female-low.onnx").unwrap();
        assert_eq!(v.name, "en_GB-southern_english-female-low");
        assert_eq!(v.voice, "southern_english_female");
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["kristin", "en_US-medium", "", "en_US--medium", "e-x-y"] {
            assert!(VoiceName::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn hugging_face_urls() {
        let (onnx, json) = model_url("de_DE-thorsten-high").unwrap();
        assert_eq!(
            onnx,
            "https://huggingface.co/rhasspy/piper-voices/resolve/main/de/de_DE/thorsten/high/de_DE-thorsten-high.onnx"
        );
        assert_eq!(json, format!("{onnx}.json"));
    }

    #[test]
    fn resolve_default_voice() {
        let data = Path::new("/data/reed");
        assert_eq!(
            resolve_model_path(None, "en_US-kristin-medium", data),
            data.join("en_US-kristin-medium.onnx")
        );
    }

    #[test]
    fn resolve_bare_name_into_data_dir() {
        let data = Path::new("/data/reed");
        assert_eq!(
            resolve_model_path(Some("de_DE-thorsten-high"), "x", data),
            data.join("de_DE-thorsten-high.onnx")
        );
        assert_eq!(
            resolve_model_path(Some("de_DE-thorsten-high.onnx"), "x", data),
            data.join("de_DE-thorsten-high.onnx")
        );
    }

    #[test]
    fn resolve_paths_literally() {
        let data = Path::new("/data/reed");
        assert_eq!(
            resolve_model_path(Some("/models/custom.onnx"), "x", data),
            PathBuf::from("/models/custom.onnx")
        );

        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("local.onnx");
        std::fs::write(&existing, b"onnx").unwrap();
        let arg = existing.to_string_lossy().into_owned();
        assert_eq!(resolve_model_path(Some(&arg), "x", data), existing);
    }

    #[test]
    fn lists_onnx_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zz_ZZ-b-low.onnx"), vec![0u8; 2 * 1_048_576]).unwrap();
        std::fs::write(dir.path().join("aa_AA-a-low.onnx"), b"x").unwrap();
        std::fs::write(dir.path().join("aa_AA-a-low.onnx.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let voices = list_installed(dir.path()).unwrap();

        let names: Vec<_> = voices.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["aa_AA-a-low", "zz_ZZ-b-low"]);
        assert!((voices[1].size_mb() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_directory_has_no_voices() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_installed(&dir.path().join("nope")).unwrap().is_empty());
    }
}
