//! Command-line surface.
//!
//! `reed` takes free text plus flags; the words `voices` and
//! `download <name>` in first position select voice management instead of
//! speech.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{AppConfig, SpeechConfig};
use crate::text::{DocumentError, DocumentKind, TextSources};

/// Read text aloud using piper-tts.
#[derive(Debug, Clone, Parser)]
#[command(name = "reed", version, about)]
pub struct Cli {
    /// Text to read aloud (or: `voices`, `download <name>`)
    pub text: Vec<String>,

    /// Read text from a file (PDF and EPUB are read page by page or
    /// chapter by chapter)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// PDF pages or EPUB chapters to read (1-based), e.g. 1,3-5
    #[arg(long, value_name = "PAGES")]
    pub pages: Option<String>,

    /// Read text from the clipboard
    #[arg(short, long)]
    pub clipboard: bool,

    /// Voice name or path to a voice model
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Speech speed (default: 1.0, lower = slower)
    #[arg(short, long, allow_negative_numbers = true)]
    pub speed: Option<f32>,

    /// Volume multiplier (default: 1.0)
    #[arg(short, long, allow_negative_numbers = true)]
    pub volume: Option<f32>,

    /// Save to a WAV file instead of playing
    #[arg(short, long, value_name = "OUT.wav")]
    pub output: Option<PathBuf>,

    /// Seconds of silence between sentences
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub silence: Option<f32>,
}

/// What a run should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// List installed voices.
    Voices,
    /// Download a voice; `None` when the name is missing.
    Download(Option<String>),
    /// Prompt loop with background playback.
    Interactive,
    /// Read a PDF or EPUB one page or chapter at a time.
    ReadDocument(PathBuf, DocumentKind),
    /// Speak (or save) one text and exit.
    Speak,
}

impl Cli {
    /// Decide the action; `stdin_is_terminal` selects interactive mode when
    /// no text source was given.
    pub fn action(&self, stdin_is_terminal: bool) -> Action {
        match self.text.first().map(String::as_str) {
            Some("voices") if self.text.len() == 1 => Action::Voices,
            Some("download") => Action::Download(self.text.get(1).cloned()),
            _ => match self.document() {
                Some((path, kind)) => Action::ReadDocument(path.to_path_buf(), kind),
                None if stdin_is_terminal && !self.sources().is_explicit() => Action::Interactive,
                None => Action::Speak,
            },
        }
    }

    fn document(&self) -> Option<(&std::path::Path, DocumentKind)> {
        let path = self.file.as_deref()?;
        Some((path, DocumentKind::from_path(path)?))
    }

    /// `--pages` needs a PDF or EPUB `--file`.
    pub fn check_pages(&self) -> Result<(), DocumentError> {
        if self.pages.is_none() {
            return Ok(());
        }
        match &self.file {
            None => Err(DocumentError::PagesWithoutFile),
            Some(_) if self.document().is_none() => Err(DocumentError::PagesNeedDocument),
            Some(_) => Ok(()),
        }
    }

    pub fn sources(&self) -> TextSources {
        TextSources {
            clipboard: self.clipboard,
            file: self.file.clone(),
            words: self.text.clone(),
        }
    }

    /// Settings overlaid with whatever flags were given.
    pub fn speech_config(&self, settings: &AppConfig, model: PathBuf) -> SpeechConfig {
        let mut config = SpeechConfig::from_settings(settings, model);
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(volume) = self.volume {
            config.volume = volume;
        }
        if let Some(silence) = self.silence {
            config.silence = silence;
        }
        config.output = self.output.clone();
        config
    }
}
