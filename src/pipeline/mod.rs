//! Process pipeline: text → synthesis engine → audio artifact → player.
//!
//! # Architecture
//!
//! ```text
//! SpeechConfig ──▶ engine_args ──▶ Spawner ──▶ piper (stdin: text)
//!                                                   │
//!                                                   ▼
//!                                      Artifact (temp .wav or -o file)
//!                                                   │
//! PlatformResolver ──▶ player CommandSpec ──▶ Spawner ──▶ player <wav>
//! ```
//!
//! [`ProcessPipeline`] is stateless apart from the cached player command and
//! may be shared (`Arc`) between the playback controller and the blocking
//! adapter.

pub mod artifact;
pub mod command;
pub mod runner;
pub mod spawn;

#[cfg(all(test, unix))]
pub(crate) mod testing;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use artifact::Artifact;
pub use command::{engine_args, EngineCommand};
pub use runner::{OneShot, PipelineError, ProcessPipeline};
pub use spawn::{Spawner, SystemSpawner};
