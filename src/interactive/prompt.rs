//! Line input for the interactive prompt.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::QUIT_WORDS;

/// Source of input lines.  `Ok(None)` means the user is done (EOF or
/// Ctrl-C).
pub trait LinePrompt {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>>;
}

/// `rustyline` editor with in-memory history, pre-seeded with the quit
/// commands so they are one arrow-key away.
pub struct RustylinePrompt {
    editor: DefaultEditor,
}

impl RustylinePrompt {
    pub fn new() -> anyhow::Result<Self> {
        let mut editor = DefaultEditor::new()?;
        for word in QUIT_WORDS {
            editor.add_history_entry(word)?;
        }
        Ok(Self { editor })
    }
}

impl LinePrompt for RustylinePrompt {
    fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
