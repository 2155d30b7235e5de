//! Voice downloads from the `rhasspy/piper-voices` repository.
//!
//! Files are streamed into a temporary file next to the destination and
//! renamed into place only once complete, so an interrupted download never
//! leaves a truncated model behind.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::{ConfigError, SpeechConfig};

use super::{VoiceError, VoiceName};

/// Root of the piper voice repository.
pub const HF_BASE_URL: &str = "https://huggingface.co/rhasspy/piper-voices/resolve/main";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// DownloadEvent
// ---------------------------------------------------------------------------

/// Progress of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadEvent<'a> {
    Started(&'a Path),
    Saved(&'a Path),
}

impl fmt::Display for DownloadEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadEvent::Started(path) => {
                let name = path.file_name().unwrap_or(path.as_os_str());
                write!(f, "⬇ Downloading {}…", name.to_string_lossy())
            }
            DownloadEvent::Saved(path) => write!(f, "✓ Saved {}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Downloader
// ---------------------------------------------------------------------------

/// Blocking HTTP client for voice files.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    base_url: String,
}

impl Downloader {
    /// A downloader for [`HF_BASE_URL`].
    pub fn new() -> Result<Self, VoiceError> {
        let client = Client::builder()
            .user_agent(concat!("reed/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|source| VoiceError::Http {
                url: HF_BASE_URL.into(),
                source,
            })?;
        Ok(Self::with_client(client, HF_BASE_URL))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Download `name` (model and JSON config) into `dir`.
    ///
    /// Returns the path of the `.onnx` file.
    pub fn download_voice(
        &self,
        name: &str,
        dir: &Path,
        on_event: &mut dyn FnMut(DownloadEvent<'_>),
    ) -> Result<PathBuf, VoiceError> {
        let voice = VoiceName::parse(name)?;
        let model = dir.join(voice.file_name());
        self.download_to(&voice, &model, on_event)?;
        Ok(model)
    }

    /// Download `voice` to `model` and its config to `model.onnx.json`.
    fn download_to(
        &self,
        voice: &VoiceName,
        model: &Path,
        on_event: &mut dyn FnMut(DownloadEvent<'_>),
    ) -> Result<(), VoiceError> {
        let (model_url, config_url) = voice.urls(&self.base_url);
        self.fetch(&model_url, model, on_event)?;
        self.fetch(&config_url, &model.with_extension("onnx.json"), on_event)?;
        Ok(())
    }

    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        on_event: &mut dyn FnMut(DownloadEvent<'_>),
    ) -> Result<(), VoiceError> {
        on_event(DownloadEvent::Started(dest));
        log::info!("download: {url} -> {}", dest.display());

        let http_err = |source| VoiceError::Http {
            url: url.to_owned(),
            source,
        };
        let io_err = |source| VoiceError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(http_err)?;

        let dir = dest.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir).map_err(io_err)?;
        let mut partial = tempfile::Builder::new()
            .prefix(".reed-download-")
            .tempfile_in(dir)
            .map_err(io_err)?;

        let bytes = response.copy_to(&mut partial).map_err(http_err)?;
        partial.persist(dest).map_err(|e| io_err(e.error))?;

        log::debug!("download: wrote {bytes} bytes");
        on_event(DownloadEvent::Saved(dest));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ensure_model
// ---------------------------------------------------------------------------

/// Make sure `config.model` exists, downloading it when it belongs in
/// `data_dir`.
///
/// # Errors
///
/// A missing model outside `data_dir` is
/// [`ConfigError::ModelNotFound`]; download failures are passed through.
pub fn ensure_model(
    config: &SpeechConfig,
    data_dir: &Path,
    downloader: &Downloader,
    on_event: &mut dyn FnMut(DownloadEvent<'_>),
) -> Result<(), VoiceError> {
    let model = config.model();
    if model.exists() {
        return Ok(());
    }

    let not_found = || VoiceError::Config(ConfigError::ModelNotFound(model.to_path_buf()));
    if model.parent() != Some(data_dir) {
        return Err(not_found());
    }
    let name = model
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(not_found)?;

    let voice = VoiceName::parse(name).map_err(|_| not_found())?;
    downloader.download_to(&voice, model, on_event)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
