//! Text acquisition for one-shot runs.
//!
//! Sources are consulted in a fixed order and the first one present wins:
//!
//! 1. clipboard (`-c`)
//! 2. file (`-f PATH`)
//! 3. piped standard input (only when stdin is not a terminal)
//! 4. positional words, joined with single spaces
//!
//! PDF and EPUB files are not read whole; see [`document`].

pub mod clipboard;
pub mod document;

use std::io::Read;
use std::path::PathBuf;

use thiserror::Error;

use crate::platform::PlatformError;

pub use clipboard::read_clipboard;
pub use document::{read_document, DocumentError, DocumentKind, Progress};

/// Errors raised while collecting the text to speak.
#[derive(Debug, Error)]
pub enum TextError {
    /// No source supplied anything.
    #[error("No input provided. Use --help for usage.")]
    NoInput,

    /// A source was used but yielded only whitespace.
    #[error("No text to read.")]
    Empty,

    #[error("Failed to read clipboard ({command}): {detail}")]
    Clipboard { command: String, detail: String },

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read standard input: {0}")]
    Stdin(#[source] std::io::Error),
}

/// What the command line asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSources {
    pub clipboard: bool,
    pub file: Option<PathBuf>,
    pub words: Vec<String>,
}

impl TextSources {
    /// `true` when an explicit source (words, file or clipboard) was given.
    pub fn is_explicit(&self) -> bool {
        self.clipboard || self.file.is_some() || !self.words.is_empty()
    }
}

/// Collect the text for a one-shot run.
///
/// `clipboard` is only called when `sources.clipboard` is set.  `stdin` is
/// `None` when standard input is a terminal.
///
/// # Errors
///
/// [`TextError::NoInput`] if nothing was supplied, [`TextError::Empty`] if
/// the chosen source held only whitespace, or the source's own error.
pub fn get_text<F>(
    sources: &TextSources,
    clipboard: F,
    stdin: Option<&mut dyn Read>,
) -> Result<String, TextError>
where
    F: FnOnce() -> Result<String, TextError>,
{
    let text = if sources.clipboard {
        clipboard()?
    } else if let Some(path) = &sources.file {
        std::fs::read_to_string(path).map_err(|source| TextError::File {
            path: path.clone(),
            source,
        })?
    } else if let Some(stdin) = stdin {
        let mut buf = String::new();
        stdin.read_to_string(&mut buf).map_err(TextError::Stdin)?;
        buf.trim().to_owned()
    } else if !sources.words.is_empty() {
        sources.words.join(" ")
    } else {
        return Err(TextError::NoInput);
    };

    if text.trim().is_empty() {
        return Err(TextError::Empty);
    }
    Ok(text)
}
