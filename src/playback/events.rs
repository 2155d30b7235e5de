//! Status events delivered to the caller's reporter.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::state::SessionOutcome;

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Synthesis has started.
    Generating,
    /// Synthesis finished after `Duration` (blocking path only).
    Generated(Duration),
    /// The player process is running.
    Playing,
    Paused,
    Resumed,
    /// Save mode wrote the audio here.
    Saved { path: PathBuf, elapsed: Duration },
    /// A session ended.
    Finished(SessionOutcome),
}

impl fmt::Display for PlaybackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackEvent::Generating => f.write_str("⠋ Generating speech..."),
            PlaybackEvent::Generated(elapsed) => {
                write!(f, "✓ Generated in {:.1}s", elapsed.as_secs_f64())
            }
            PlaybackEvent::Playing => f.write_str("▶ Playing..."),
            PlaybackEvent::Paused => f.write_str("⏸ Paused"),
            PlaybackEvent::Resumed => f.write_str("▶ Resumed"),
            PlaybackEvent::Saved { path, elapsed } => write!(
                f,
                "✓ Done in {:.1}s, saved to {}",
                elapsed.as_secs_f64(),
                path.display()
            ),
            PlaybackEvent::Finished(SessionOutcome::Completed) => f.write_str("✓ Done"),
            PlaybackEvent::Finished(SessionOutcome::Stopped) => f.write_str("⏹ Stopped"),
            PlaybackEvent::Finished(SessionOutcome::Failed(reason)) => write!(f, "✗ {reason}"),
        }
    }
}

/// Receives [`PlaybackEvent`]s; called from the playback worker thread and
/// never while the controller's lock is held.
pub type Reporter = Arc<dyn Fn(&PlaybackEvent) + Send + Sync>;

/// A reporter that discards everything.
pub fn silent() -> Reporter {
    Arc::new(|_| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines() {
        assert_eq!(PlaybackEvent::Paused.to_string(), "⏸ Paused");
        assert_eq!(
            PlaybackEvent::Generated(Duration::from_millis(1300)).to_string(),
            "✓ Generated in 1.3s"
        );
        assert_eq!(
            PlaybackEvent::Finished(SessionOutcome::Failed("synthesis failed".into())).to_string(),
            "✗ synthesis failed"
        );
        assert_eq!(
            PlaybackEvent::Saved {
                path: "out.wav".into(),
                elapsed: Duration::from_secs(2)
            }
            .to_string(),
            "✓ Done in 2.0s, saved to out.wav"
        );
    }
}
