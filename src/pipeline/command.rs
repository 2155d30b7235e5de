//! Synthesis engine command line.
//!
//! Maps a [`SpeechConfig`] onto piper's argument vector:
//!
//! ```text
//! <program> [leading args] --model <path> --length-scale <speed>
//!     --volume <volume> --sentence-silence <secs> --output-file <wav>
//! ```

use std::ffi::OsString;
use std::path::Path;

use crate::config::{EngineConfig, SpeechConfig};
use crate::platform::CommandSpec;

/// How to launch the synthesis engine and how strictly to judge its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub spec: CommandSpec,
    /// Any stderr output counts as a failed synthesis.
    pub fail_on_stderr: bool,
}

impl EngineCommand {
    pub fn new(spec: CommandSpec, fail_on_stderr: bool) -> Self {
        Self {
            spec,
            fail_on_stderr,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            CommandSpec::new(config.program.clone(), config.args.iter().cloned()),
            config.fail_on_stderr,
        )
    }
}

impl Default for EngineCommand {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// The per-utterance arguments appended after the engine's leading args.
///
/// The audio is always written to `output`: either a temporary artifact
/// (play mode) or the user's `-o` path (save mode).
pub fn engine_args(config: &SpeechConfig, output: &Path) -> Vec<OsString> {
    vec![
        "--model".into(),
        config.model.clone().into_os_string(),
        "--length-scale".into(),
        config.speed.to_string().into(),
        "--volume".into(),
        config.volume.to_string().into(),
        "--sentence-silence".into(),
        config.silence.to_string().into(),
        "--output-file".into(),
        output.as_os_str().to_owned(),
    ]
}
