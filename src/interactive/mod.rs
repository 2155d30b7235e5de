//! Interactive mode: a prompt loop that speaks each entered line.
//!
//! Speech runs through a [`PlaybackControl`] so the prompt stays responsive:
//! the next line (or `/pause`, `/stop`, …) can be entered while the previous
//! one is still playing.

pub mod prompt;

use std::io::Write;
use std::sync::Arc;

use crate::config::SpeechConfig;
use crate::playback::{ControlError, PlaybackControl, PlaybackState, Transition};

pub use prompt::{LinePrompt, RustylinePrompt};

/// Words that end the session.
pub const QUIT_WORDS: [&str; 2] = ["/quit", "/exit"];

const PROMPT: &str = "> ";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub const BANNER: &str = "\
🔊 reed - Interactive Mode
──────────────────────────────────────────────────────────────
Type or paste text and press Enter to hear it.
Type /quit or /exit to stop. Ctrl-D for EOF.
Available commands: /help, /clear, /replay, /pause, /resume, /stop, /status";

/// `(command, description)` pairs shown by `/help`.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/quit", "Exit interactive mode"),
    ("/exit", "Exit interactive mode"),
    ("/help", "Show this help"),
    ("/clear", "Clear screen"),
    ("/replay", "Replay last text"),
    ("/pause", "Pause playback"),
    ("/resume", "Resume paused playback"),
    ("/stop", "Stop playback"),
    ("/status", "Show playback status"),
];

// ---------------------------------------------------------------------------
// Input parsing
// ---------------------------------------------------------------------------

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Quit,
    Help,
    Clear,
    Replay,
    Pause,
    Resume,
    Stop,
    Status,
    /// Text to speak: non-blank lines, trimmed and joined with `\n`.
    Speak(String),
    /// Blank input.
    Nothing,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Input::Nothing;
        }

        let command = trimmed.to_lowercase();
        if QUIT_WORDS.contains(&command.as_str()) {
            return Input::Quit;
        }
        match command.as_str() {
            "/help" => return Input::Help,
            "/clear" => return Input::Clear,
            "/replay" => return Input::Replay,
            "/pause" => return Input::Pause,
            "/resume" => return Input::Resume,
            "/stop" => return Input::Stop,
            "/status" => return Input::Status,
            _ => {}
        }

        let text = trimmed
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Input::Speak(text)
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Run the prompt until the user quits.  Returns the process exit code.
pub fn interactive_loop(
    prompt: &mut dyn LinePrompt,
    control: &dyn PlaybackControl,
    config: &Arc<SpeechConfig>,
    out: &mut dyn Write,
) -> i32 {
    match run(prompt, control, config, out) {
        Ok(()) => 0,
        Err(e) => {
            log::error!("interactive: {e:#}");
            let _ = writeln!(out, "✗ {e}");
            1
        }
    }
}

fn run(
    prompt: &mut dyn LinePrompt,
    control: &dyn PlaybackControl,
    config: &Arc<SpeechConfig>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    writeln!(out, "{BANNER}")?;

    while let Some(line) = prompt.read_line(PROMPT)? {
        match Input::parse(&line) {
            Input::Nothing => continue,
            Input::Quit => break,
            Input::Help => print_help(out)?,
            Input::Clear => writeln!(out, "{CLEAR_SCREEN}{BANNER}")?,
            Input::Replay => match control.current_text() {
                Some(text) => speak(control, &text, config, out)?,
                None => writeln!(out, "No text to replay.")?,
            },
            Input::Pause => report_control(control.pause(), out)?,
            Input::Resume => report_control(control.resume(), out)?,
            Input::Stop => report_control(control.stop(), out)?,
            Input::Status => writeln!(out, "Status: {}", control.state().label())?,
            Input::Speak(text) => speak(control, &text, config, out)?,
        }
        out.flush()?;
    }
    Ok(())
}

fn speak(
    control: &dyn PlaybackControl,
    text: &str,
    config: &Arc<SpeechConfig>,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    if let Err(e) = control.play(text, config) {
        writeln!(out, "✗ {e}")?;
    }
    Ok(())
}

fn print_help(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "\nAvailable Commands:\n")?;
    for (command, description) in COMMANDS {
        writeln!(out, "{command:<9} - {description}")?;
    }
    writeln!(out)
}

/// Print a friendly line for a rejected control request.
fn report_control(result: Result<(), ControlError>, out: &mut dyn Write) -> std::io::Result<()> {
    let Err(err) = result else {
        return Ok(());
    };

    let message = match &err {
        ControlError::Illegal(illegal) => match (illegal.from, illegal.transition) {
            (PlaybackState::Idle, _) => "Nothing is playing.".to_owned(),
            (PlaybackState::Stopped, _) => "Already stopping.".to_owned(),
            (PlaybackState::Paused, Transition::Pause) => "Already paused.".to_owned(),
            (PlaybackState::Playing, Transition::Resume) => "Not paused.".to_owned(),
            _ => err.to_string(),
        },
        ControlError::NotPlayingYet => "Still generating speech; nothing to pause yet.".to_owned(),
        ControlError::Unsupported => "Pause/resume is not supported on this platform.".to_owned(),
        ControlError::Signal(_) => format!("✗ {err}"),
    };
    writeln!(out, "{message}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
