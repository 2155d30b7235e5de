//! Playback control: the session state machine, the background controller
//! used by the interactive prompt, and the blocking one-shot adapter.

pub mod blocking;
pub mod controller;
pub mod events;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use blocking::BlockingSpeaker;
pub use controller::{ControlError, PlaybackControl, PlaybackController};
pub use events::{silent, PlaybackEvent, Reporter};
pub use state::{IllegalTransition, PlaybackState, SessionOutcome, Transition};
