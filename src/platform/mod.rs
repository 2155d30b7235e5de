//! Platform resolver — maps the running OS to player / clipboard commands
//! and to a pause/resume capability.
//!
//! # Selection policy
//!
//! Each OS has a fixed, ordered list of candidate commands.  The first one
//! whose executable is found on `PATH` wins.  Probing is done through the
//! [`ExecutableProbe`] seam so tests can fake which tools are installed.
//!
//! | OS      | Playback                             | Clipboard                  |
//! |---------|--------------------------------------|----------------------------|
//! | macOS   | `afplay`                             | `pbpaste`                  |
//! | Linux   | `paplay`, `aplay`, `ffplay`          | `wl-paste`, `xclip`, `xsel`|
//! | Windows | `powershell` SoundPlayer, `ffplay`   | `powershell Get-Clipboard` |
//!
//! Probing touches the filesystem, so callers resolve once per run and reuse
//! the result.

pub mod process;
pub mod suspend;

use std::fmt;
use std::process::Command;
use std::sync::Arc;

use thiserror::Error;

pub use process::{force_kill, terminate, wait_exited};
pub use suspend::{NoSuspend, SuspendResume};
#[cfg(unix)]
pub use suspend::SignalSuspend;

// ---------------------------------------------------------------------------
// PlatformError
// ---------------------------------------------------------------------------

/// No usable backend command exists on this system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// None of the playback candidates is installed.
    #[error("No supported audio player found (tried: {tried})")]
    NoAudioBackend { tried: String },

    /// None of the clipboard candidates is installed.
    #[error("No supported clipboard tool found (tried: {tried})")]
    NoClipboardBackend { tried: String },
}

// ---------------------------------------------------------------------------
// Os
// ---------------------------------------------------------------------------

/// Operating-system families with distinct command tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    MacOs,
    Linux,
    Windows,
    Other,
}

impl Os {
    /// The OS this binary was compiled for.
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Os::MacOs,
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            _ => Os::Other,
        }
    }

    /// Whether child processes can be suspended and continued with
    /// SIGSTOP / SIGCONT.
    pub fn supports_pause_resume(self) -> bool {
        cfg!(unix) && matches!(self, Os::MacOs | Os::Linux | Os::Other)
    }
}

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

/// An executable plus its fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A program with no leading arguments.
    pub fn bare(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a full command line (`["mpv", "--no-video"]`).
    ///
    /// Returns `None` for an empty slice.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    /// A [`Command`] with the program and leading arguments applied.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ExecutableProbe
// ---------------------------------------------------------------------------

/// Answers "is this executable installed?".
pub trait ExecutableProbe: Send + Sync {
    fn is_installed(&self, program: &str) -> bool;
}

/// Production probe backed by `which`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathProbe;

impl ExecutableProbe for PathProbe {
    fn is_installed(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Candidate tables
// ---------------------------------------------------------------------------

const WINDOWS_SOUND_PLAYER: &str = "(New-Object System.Media.SoundPlayer $args[0]).PlaySync()";

/// Playback commands for `os`, highest priority first.
pub fn playback_candidates(os: Os) -> Vec<CommandSpec> {
    match os {
        Os::MacOs => vec![CommandSpec::bare("afplay")],
        Os::Linux => vec![
            CommandSpec::bare("paplay"),
            CommandSpec::bare("aplay"),
            CommandSpec::new("ffplay", ["-nodisp", "-autoexit"]),
        ],
        Os::Windows => vec![
            CommandSpec::new(
                "powershell",
                ["-NoProfile", "-NonInteractive", "-c", WINDOWS_SOUND_PLAYER],
            ),
            CommandSpec::new("ffplay", ["-nodisp", "-autoexit", "-hide_banner"]),
        ],
        Os::Other => Vec::new(),
    }
}

/// Clipboard-read commands for `os`, highest priority first.
pub fn clipboard_candidates(os: Os) -> Vec<CommandSpec> {
    match os {
        Os::MacOs => vec![CommandSpec::bare("pbpaste")],
        Os::Linux => vec![
            CommandSpec::bare("wl-paste"),
            CommandSpec::new("xclip", ["-selection", "clipboard", "-o"]),
            CommandSpec::new("xsel", ["--clipboard", "--output"]),
        ],
        Os::Windows => vec![CommandSpec::new("powershell", ["-Command", "Get-Clipboard"])],
        Os::Other => Vec::new(),
    }
}

fn tried(candidates: &[CommandSpec]) -> String {
    if candidates.is_empty() {
        return "none for this platform".into();
    }
    candidates
        .iter()
        .map(|c| c.program.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// PlatformResolver
// ---------------------------------------------------------------------------

/// Resolves backend commands for one OS using an [`ExecutableProbe`].
pub struct PlatformResolver {
    os: Os,
    probe: Box<dyn ExecutableProbe>,
}

impl fmt::Debug for PlatformResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformResolver")
            .field("os", &self.os)
            .finish_non_exhaustive()
    }
}

impl Default for PlatformResolver {
    fn default() -> Self {
        Self::new(Os::current(), PathProbe)
    }
}

impl PlatformResolver {
    pub fn new(os: Os, probe: impl ExecutableProbe + 'static) -> Self {
        Self {
            os,
            probe: Box::new(probe),
        }
    }

    /// Ordered playback candidates for this OS (not probed).
    pub fn playback_candidates(&self) -> Vec<CommandSpec> {
        playback_candidates(self.os)
    }

    /// Ordered clipboard candidates for this OS (not probed).
    pub fn clipboard_candidates(&self) -> Vec<CommandSpec> {
        clipboard_candidates(self.os)
    }

    /// First installed playback command.
    pub fn resolve_playback_command(&self) -> Result<CommandSpec, PlatformError> {
        let candidates = self.playback_candidates();
        self.first_installed(&candidates)
            .ok_or_else(|| PlatformError::NoAudioBackend {
                tried: tried(&candidates),
            })
    }

    /// First installed clipboard command.
    pub fn resolve_clipboard_command(&self) -> Result<CommandSpec, PlatformError> {
        let candidates = self.clipboard_candidates();
        self.first_installed(&candidates)
            .ok_or_else(|| PlatformError::NoClipboardBackend {
                tried: tried(&candidates),
            })
    }

    pub fn supports_pause_resume(&self) -> bool {
        self.os.supports_pause_resume()
    }

    /// The suspend/resume capability for this platform, selected once.
    pub fn suspend_resume(&self) -> Arc<dyn SuspendResume> {
        #[cfg(unix)]
        {
            if self.supports_pause_resume() {
                return Arc::new(SignalSuspend);
            }
        }
        Arc::new(NoSuspend)
    }

    fn first_installed(&self, candidates: &[CommandSpec]) -> Option<CommandSpec> {
        let found = candidates
            .iter()
            .find(|c| self.probe.is_installed(&c.program))
            .cloned();
        if let Some(spec) = &found {
            log::debug!("platform: resolved {spec}");
        }
        found
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Probe that reports a fixed set of installed programs.
    struct Installed(&'static [&'static str]);

    impl ExecutableProbe for Installed {
        fn is_installed(&self, program: &str) -> bool {
            self.0.contains(&program)
        }
    }

    fn resolver(os: Os, installed: &'static [&'static str]) -> PlatformResolver {
        PlatformResolver::new(os, Installed(installed))
    }

    #[test]
    fn macos_uses_afplay() {
        let spec = resolver(Os::MacOs, &["afplay"])
            .resolve_playback_command()
            .unwrap();
        assert_eq!(spec, CommandSpec::bare("afplay"));
    }

    #[test]
    fn linux_prefers_paplay() {
        let spec = resolver(Os::Linux, &["ffplay", "aplay", "paplay"])
            .resolve_playback_command()
            .unwrap();
        assert_eq!(spec.program, "paplay");
    }

    #[test]
    fn linux_falls_back_to_aplay_then_ffplay() {
        let aplay = resolver(Os::Linux, &["aplay", "ffplay"])
            .resolve_playback_command()
            .unwrap();
        assert_eq!(aplay.program, "aplay");

        let ffplay = resolver(Os::Linux, &["ffplay"])
            .resolve_playback_command()
            .unwrap();
        assert_eq!(ffplay.args, vec!["-nodisp", "-autoexit"]);
    }

    #[test]
    fn windows_prefers_powershell() {
        let spec = resolver(Os::Windows, &["ffplay", "powershell"])
            .resolve_playback_command()
            .unwrap();
        assert_eq!(spec.program, "powershell");
        assert_eq!(spec.args.last().map(String::as_str), Some(WINDOWS_SOUND_PLAYER));
    }

    #[test]
    fn no_player_is_an_error() {
        let err = resolver(Os::Linux, &[]).resolve_playback_command().unwrap_err();
        assert_eq!(
            err,
            PlatformError::NoAudioBackend {
                tried: "paplay, aplay, ffplay".into()
            }
        );
    }

    #[test]
    fn unknown_platform_has_no_backends() {
        let r = resolver(Os::Other, &["paplay", "xclip"]);
        assert!(r.resolve_playback_command().is_err());
        assert!(matches!(
            r.resolve_clipboard_command(),
            Err(PlatformError::NoClipboardBackend { .. })
        ));
    }

    #[test]
    fn linux_clipboard_order() {
        assert_eq!(
            resolver(Os::Linux, &["xsel", "wl-paste"])
                .resolve_clipboard_command()
                .unwrap()
                .program,
            "wl-paste"
        );
        assert_eq!(
            resolver(Os::Linux, &["xsel", "xclip"])
                .resolve_clipboard_command()
                .unwrap()
                .args,
            vec!["-selection", "clipboard", "-o"]
        );
        assert_eq!(
            resolver(Os::Linux, &["xsel"])
                .resolve_clipboard_command()
                .unwrap()
                .program,
            "xsel"
        );
    }

    #[test]
    fn macos_clipboard_is_pbpaste() {
        let spec = resolver(Os::MacOs, &["pbpaste"])
            .resolve_clipboard_command()
            .unwrap();
        assert_eq!(spec.program, "pbpaste");
    }

    #[test]
    fn pause_resume_never_supported_on_windows() {
        assert!(!Os::Windows.supports_pause_resume());
        assert!(!resolver(Os::Windows, &[]).suspend_resume().is_supported());
    }

    #[cfg(unix)]
    #[test]
    fn pause_resume_supported_on_unix_hosts() {
        assert!(Os::Linux.supports_pause_resume());
        assert!(resolver(Os::Linux, &[]).suspend_resume().is_supported());
    }

    #[test]
    fn command_spec_from_argv() {
        let argv = vec!["mpv".to_string(), "--no-video".to_string()];
        let spec = CommandSpec::from_argv(&argv).unwrap();
        assert_eq!(spec.to_string(), "mpv --no-video");
        assert!(CommandSpec::from_argv(&[]).is_none());
    }
}
