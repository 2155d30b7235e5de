//! Clipboard reading through the platform's paste command.
//!
//! The command (`pbpaste`, `wl-paste`, `xclip -o`, …) comes from the
//! [`PlatformResolver`](crate::platform::PlatformResolver); this module only
//! runs it and captures stdout.

use std::process::Stdio;

use crate::platform::CommandSpec;

use super::TextError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run `command` and return its trimmed stdout.
///
/// # Errors
///
/// Returns [`TextError::Clipboard`] if the command cannot be started or
/// exits non-zero.
pub fn read_clipboard(command: &CommandSpec) -> Result<String, TextError> {
    log::debug!("clipboard: running {command}");

    let output = command
        .to_command()
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| clipboard_error(command, e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        let detail = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        return Err(clipboard_error(command, detail));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn clipboard_error(command: &CommandSpec, detail: String) -> TextError {
    TextError::Clipboard {
        command: command.to_string(),
        detail,
    }
}
