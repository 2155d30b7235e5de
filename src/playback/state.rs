//! Playback state machine.
//!
//! [`PlaybackState`] is owned by the controller and only changes through
//! [`PlaybackState::apply`], which rejects every transition not listed
//! below.
//!
//! ```text
//! Idle ──play──▶ Playing ──pause──▶ Paused ──resume──▶ Playing
//! Playing / Paused ──stop──▶ Stopped ──torn down──▶ Idle
//! Playing / Paused ──finished (done or failed)──▶ Idle
//! ```

use std::fmt;

/// State of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No session.
    #[default]
    Idle,
    /// A session is synthesising or playing.
    Playing,
    /// The player process is suspended.
    Paused,
    /// Stop requested; the worker is still tearing the session down.
    Stopped,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Play,
    Pause,
    Resume,
    Stop,
    /// The worker ended the session on its own (completed or failed).
    Finished,
    /// The worker finished cleaning up after a stop.
    TornDown,
}

impl Transition {
    /// The verb used in status and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Transition::Play => "play",
            Transition::Pause => "pause",
            Transition::Resume => "resume",
            Transition::Stop => "stop",
            Transition::Finished => "finish",
            Transition::TornDown => "tear down",
        }
    }
}

/// A transition that is not legal from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: PlaybackState,
    pub transition: Transition,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} while {}", self.transition.label(), self.from.label())
    }
}

impl std::error::Error for IllegalTransition {}

impl PlaybackState {
    /// The state after `transition`, or an error leaving `self` unchanged.
    ///
    /// ```
    /// use reed::playback::{PlaybackState, Transition};
    ///
    /// assert_eq!(PlaybackState::Idle.apply(Transition::Play), Ok(PlaybackState::Playing));
    /// assert!(PlaybackState::Idle.apply(Transition::Pause).is_err());
    /// ```
    pub fn apply(self, transition: Transition) -> Result<PlaybackState, IllegalTransition> {
        use PlaybackState::*;
        use Transition::*;

        match (self, transition) {
            (Idle, Play) => Ok(Playing),
            (Playing, Pause) => Ok(Paused),
            (Paused, Resume) => Ok(Playing),
            (Playing | Paused, Stop) => Ok(Stopped),
            (Playing | Paused, Finished) => Ok(Idle),
            (Stopped, TornDown) => Ok(Idle),
            (from, transition) => Err(IllegalTransition { from, transition }),
        }
    }

    /// `true` while a session is live and not yet stopping.
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }

    /// A short human-readable label for status output.
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopping",
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Synthesis and playback both succeeded.
    Completed,
    /// Ended by `stop()`.
    Stopped,
    /// The engine or player failed; carries the diagnostic.
    Failed(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use PlaybackState::*;
    use Transition::*;

    const ALL_STATES: [PlaybackState; 4] = [Idle, Playing, Paused, Stopped];
    const ALL_TRANSITIONS: [Transition; 6] = [Play, Pause, Resume, Stop, Finished, TornDown];

    #[test]
    fn legal_transitions() {
        assert_eq!(Idle.apply(Play), Ok(Playing));
        assert_eq!(Playing.apply(Pause), Ok(Paused));
        assert_eq!(Paused.apply(Resume), Ok(Playing));
        assert_eq!(Playing.apply(Stop), Ok(Stopped));
        assert_eq!(Paused.apply(Stop), Ok(Stopped));
        assert_eq!(Stopped.apply(TornDown), Ok(Idle));
        assert_eq!(Playing.apply(Finished), Ok(Idle));
    }

    #[test]
    fn everything_else_is_rejected() {
        let legal = [
            (Idle, Play),
            (Playing, Pause),
            (Paused, Resume),
            (Playing, Stop),
            (Paused, Stop),
            (Stopped, TornDown),
            (Playing, Finished),
            (Paused, Finished),
        ];

        for from in ALL_STATES {
            for transition in ALL_TRANSITIONS {
                if legal.contains(&(from, transition)) {
                    continue;
                }
                assert_eq!(
                    from.apply(transition),
                    Err(IllegalTransition { from, transition }),
                    "{from:?} --{transition:?}--> should be illegal"
                );
            }
        }
    }

    #[test]
    fn stop_never_leads_straight_to_idle() {
        assert_ne!(Playing.apply(Stop), Ok(Idle));
        assert!(Stopped.apply(Finished).is_err());
    }

    #[test]
    fn active_states() {
        assert!(!Idle.is_active());
        assert!(Playing.is_active());
        assert!(Paused.is_active());
        assert!(!Stopped.is_active());
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(PlaybackState::default(), Idle);
    }

    #[test]
    fn illegal_transition_message() {
        let err = Idle.apply(Pause).unwrap_err();
        assert_eq!(err.to_string(), "cannot pause while idle");

        let err = Stopped.apply(Resume).unwrap_err();
        assert_eq!(err.to_string(), "cannot resume while stopping");
    }
}
