//! Non-blocking playback controller.
//!
//! [`PlaybackController`] runs each session (engine → player) on a dedicated
//! worker thread and lets the interactive caller pause, resume and stop it.
//!
//! # Ownership
//!
//! ```text
//! caller thread                         worker thread ("reed-playback")
//! ─────────────                         ───────────────────────────────
//! play / pause / resume / stop          owns Artifact + both Child handles
//!        │                                         │
//!        └──── Mutex<Inner> ◀──── phase (pids), cancelled, outcome ─┘
//! ```
//!
//! Everything shared lives in one `Mutex<Inner>`.  The lock is never held
//! across a blocking process wait; the controller reaches a running process
//! only by PID, through [`SuspendResume`] or [`terminate`].  The worker
//! retires a PID from the session phase before reaping its process, so a
//! signal can never reach a recycled PID.
//!
//! A second `play` stops the live session and waits for its worker to exit
//! before starting the next one, so at most one session owns processes at
//! any time.

use std::io;
use std::process::{Child, ExitStatus};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::config::SpeechConfig;
use crate::pipeline::{PipelineError, ProcessPipeline};
use crate::platform::{force_kill, terminate, wait_exited, SuspendResume};

use super::events::{PlaybackEvent, Reporter};
use super::state::{IllegalTransition, PlaybackState, SessionOutcome, Transition};

/// How long `play` waits for a stopped session before killing it outright.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Exit polling interval where the platform cannot wait without reaping.
const REAP_POLL: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// ControlError
// ---------------------------------------------------------------------------

/// A control request that was not applied.  State is unchanged.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The request is not valid from the current state.
    #[error("{0}")]
    Illegal(#[from] IllegalTransition),

    /// The session is still synthesising; there is no player to pause yet.
    #[error("nothing is playing yet")]
    NotPlayingYet,

    /// Pause/resume is not available on this platform.
    #[error("pause/resume is not supported on this platform")]
    Unsupported,

    /// Delivering the signal failed.
    #[error("failed to signal the player: {0}")]
    Signal(#[source] io::Error),
}

// ---------------------------------------------------------------------------
// PlaybackControl
// ---------------------------------------------------------------------------

/// The control surface used by the interactive prompt.
pub trait PlaybackControl {
    fn play(&self, text: &str, config: &Arc<SpeechConfig>) -> Result<(), PipelineError>;
    fn pause(&self) -> Result<(), ControlError>;
    fn resume(&self) -> Result<(), ControlError>;
    fn stop(&self) -> Result<(), ControlError>;
    fn state(&self) -> PlaybackState;
    fn current_text(&self) -> Option<String>;
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// What the worker is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No process running (before synthesis, between phases).
    Pending,
    Synthesizing(u32),
    Playing(u32),
    Finishing,
}

impl Phase {
    fn pid(self) -> Option<u32> {
        match self {
            Phase::Synthesizing(pid) | Phase::Playing(pid) => Some(pid),
            Phase::Pending | Phase::Finishing => None,
        }
    }
}

#[derive(Debug)]
struct Session {
    id: u64,
    phase: Phase,
    cancelled: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: PlaybackState,
    last_text: Option<String>,
    session: Option<Session>,
    /// Handle of the most recent worker; joined by the next `play` or `wait`.
    worker: Option<JoinHandle<()>>,
    next_id: u64,
    last_outcome: Option<SessionOutcome>,
}

impl Inner {
    fn session_mut(&mut self, id: u64) -> Option<&mut Session> {
        self.session.as_mut().filter(|s| s.id == id)
    }

    fn player_pid(&self) -> Option<u32> {
        match self.session.as_ref()?.phase {
            Phase::Playing(pid) => Some(pid),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    inner: Mutex<Inner>,
    /// Notified whenever a session ends.
    ended: Condvar,
}

impl Shared {
    /// Lock, recovering from a poisoned mutex so a panicked worker cannot
    /// wedge the controller.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Move session `id` to `next`; returns whether it was cancelled (or is
/// already gone).
fn settle(inner: &mut Inner, id: u64, next: Phase) -> bool {
    match inner.session_mut(id) {
        Some(session) => {
            session.phase = next;
            session.cancelled
        }
        None => true,
    }
}

/// Wait for `child` to exit, moving session `id` to `next` before the
/// process is reaped and its PID handed back to the system.
///
/// Returns the exit status and whether the session was cancelled.
fn reap(shared: &Shared, id: u64, child: &mut Child, next: Phase) -> (io::Result<ExitStatus>, bool) {
    match wait_exited(child) {
        Ok(true) => {
            let cancelled = settle(&mut shared.lock(), id, next);
            return (child.wait(), cancelled);
        }
        Ok(false) => {}
        Err(e) => log::warn!("playback: cannot wait for {} without reaping: {e}", child.id()),
    }

    // Polled under the lock so the reap and the phase change are atomic.
    loop {
        {
            let mut inner = shared.lock();
            match child.try_wait() {
                Ok(None) => {}
                Ok(Some(status)) => return (Ok(status), settle(&mut inner, id, next)),
                Err(e) => return (Err(e), settle(&mut inner, id, next)),
            }
        }
        thread::sleep(REAP_POLL);
    }
}

fn join_worker(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::error!("playback: worker thread panicked");
    }
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

/// Plays one text at a time in the background.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use reed::config::SpeechConfig;
/// use reed::pipeline::{EngineCommand, ProcessPipeline};
/// use reed::platform::PlatformResolver;
/// use reed::playback::{PlaybackController, PlaybackEvent};
///
/// let resolver = Arc::new(PlatformResolver::default());
/// let pipeline = Arc::new(ProcessPipeline::new(EngineCommand::default(), resolver.clone()));
/// let controller = PlaybackController::new(
///     pipeline,
///     resolver.suspend_resume(),
///     Arc::new(|event: &PlaybackEvent| println!("{event}")),
/// );
///
/// let config = Arc::new(SpeechConfig::new("en_US-kristin-medium.onnx"));
/// controller.play("Hello there", config).unwrap();
/// controller.wait();
/// ```
pub struct PlaybackController {
    shared: Arc<Shared>,
    pipeline: Arc<ProcessPipeline>,
    suspend: Arc<dyn SuspendResume>,
    reporter: Reporter,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state())
            .field("suspend", &self.suspend)
            .finish_non_exhaustive()
    }
}

impl PlaybackController {
    pub fn new(
        pipeline: Arc<ProcessPipeline>,
        suspend: Arc<dyn SuspendResume>,
        reporter: Reporter,
    ) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            pipeline,
            suspend,
            reporter,
        }
    }

    // -----------------------------------------------------------------------
    // Control operations
    // -----------------------------------------------------------------------

    /// Start speaking `text` in the background and return immediately.
    ///
    /// A live session is stopped and drained first.  Configuration and
    /// backend problems are returned here, before any process is spawned.
    pub fn play(
        &self,
        text: impl Into<String>,
        config: Arc<SpeechConfig>,
    ) -> Result<(), PipelineError> {
        let text = text.into();
        config.validate()?;
        self.pipeline.player()?;

        let mut inner = self.shared.lock();
        loop {
            inner = self.drain(inner);
            match inner.worker.take() {
                Some(handle) => {
                    drop(inner);
                    join_worker(handle);
                    inner = self.shared.lock();
                }
                None => break,
            }
        }

        // Drained, so the state is Idle.
        let next = inner.state.apply(Transition::Play).unwrap_or(PlaybackState::Playing);

        let id = inner.next_id;
        inner.next_id += 1;

        let worker = Worker {
            shared: Arc::clone(&self.shared),
            pipeline: Arc::clone(&self.pipeline),
            reporter: Arc::clone(&self.reporter),
            id,
            text: text.clone(),
            config,
        };
        let handle = thread::Builder::new()
            .name("reed-playback".into())
            .spawn(move || worker.run())
            .map_err(PipelineError::Worker)?;

        log::debug!("playback: session {id} started");
        inner.session = Some(Session {
            id,
            phase: Phase::Pending,
            cancelled: false,
        });
        inner.worker = Some(handle);
        inner.state = next;
        inner.last_text = Some(text);
        inner.last_outcome = None;
        Ok(())
    }

    /// Suspend the player.  Only valid while `Playing`.
    pub fn pause(&self) -> Result<(), ControlError> {
        {
            let mut inner = self.shared.lock();
            let next = inner.state.apply(Transition::Pause)?;
            if !self.suspend.is_supported() {
                return Err(ControlError::Unsupported);
            }
            let pid = inner.player_pid().ok_or(ControlError::NotPlayingYet)?;
            self.suspend.suspend(pid).map_err(ControlError::Signal)?;
            inner.state = next;
        }
        (self.reporter)(&PlaybackEvent::Paused);
        Ok(())
    }

    /// Continue a paused player.  Only valid while `Paused`.
    pub fn resume(&self) -> Result<(), ControlError> {
        {
            let mut inner = self.shared.lock();
            let next = inner.state.apply(Transition::Resume)?;
            if !self.suspend.is_supported() {
                return Err(ControlError::Unsupported);
            }
            let pid = inner.player_pid().ok_or(ControlError::NotPlayingYet)?;
            self.suspend.resume(pid).map_err(ControlError::Signal)?;
            inner.state = next;
        }
        (self.reporter)(&PlaybackEvent::Resumed);
        Ok(())
    }

    /// Terminate whichever process is running and cancel the session.
    ///
    /// Returns as soon as the request is sent; the state moves to `Idle`
    /// once the worker has cleaned up (see [`wait`](Self::wait)).
    pub fn stop(&self) -> Result<(), ControlError> {
        let mut inner = self.shared.lock();
        self.stop_locked(&mut inner)
    }

    /// Block until the current session (if any) has ended.
    ///
    /// Returns how the most recent session ended, or `None` if nothing has
    /// been played yet.
    pub fn wait(&self) -> Option<SessionOutcome> {
        let mut inner = self.shared.lock();
        while inner.session.is_some() {
            inner = self
                .shared
                .ended
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let worker = inner.worker.take();
        let outcome = inner.last_outcome.clone();
        drop(inner);

        if let Some(handle) = worker {
            join_worker(handle);
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// `true` while a session is playing or paused.
    pub fn is_playing(&self) -> bool {
        self.shared.lock().state.is_active()
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.lock().state
    }

    /// The text of the most recent `play`, kept for replay.
    pub fn current_text(&self) -> Option<String> {
        self.shared.lock().last_text.clone()
    }

    /// How the last finished session ended; cleared by `play`.
    pub fn last_outcome(&self) -> Option<SessionOutcome> {
        self.shared.lock().last_outcome.clone()
    }

    /// PID of the running player process, if playback has started.
    pub fn player_pid(&self) -> Option<u32> {
        self.shared.lock().player_pid()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn stop_locked(&self, inner: &mut Inner) -> Result<(), ControlError> {
        let next = inner.state.apply(Transition::Stop)?;
        let was_paused = inner.state == PlaybackState::Paused;

        if let Some(session) = inner.session.as_mut() {
            session.cancelled = true;
            if let Some(pid) = session.phase.pid() {
                if let Err(e) = terminate(pid) {
                    log::warn!("playback: failed to terminate {pid}: {e}");
                }
                if was_paused {
                    // A stopped process only sees SIGTERM once continued.
                    if let Err(e) = self.suspend.resume(pid) {
                        log::warn!("playback: failed to continue {pid}: {e}");
                    }
                }
            }
        }

        inner.state = next;
        Ok(())
    }

    /// Stop the live session (if any) and wait for its worker to finish,
    /// escalating to a kill after [`DRAIN_GRACE`].
    fn drain<'a>(&'a self, mut inner: MutexGuard<'a, Inner>) -> MutexGuard<'a, Inner> {
        let Some(id) = inner.session.as_ref().map(|s| s.id) else {
            return inner;
        };

        log::debug!("playback: draining session {id}");
        if inner.state.is_active() {
            let _ = self.stop_locked(&mut inner);
        }

        let mut escalated = false;
        while inner.session.as_ref().is_some_and(|s| s.id == id) {
            let (guard, timeout) = self
                .shared
                .ended
                .wait_timeout(inner, DRAIN_GRACE)
                .unwrap_or_else(PoisonError::into_inner);
            inner = guard;

            if timeout.timed_out() && !escalated {
                escalated = true;
                if let Some(pid) = inner.session.as_ref().and_then(|s| s.phase.pid()) {
                    log::warn!("playback: session {id} ignored stop, killing {pid}");
                    if let Err(e) = force_kill(pid) {
                        log::warn!("playback: failed to kill {pid}: {e}");
                    }
                }
            }
        }
        inner
    }
}

impl PlaybackControl for PlaybackController {
    fn play(&self, text: &str, config: &Arc<SpeechConfig>) -> Result<(), PipelineError> {
        PlaybackController::play(self, text, Arc::clone(config))
    }

    fn pause(&self) -> Result<(), ControlError> {
        PlaybackController::pause(self)
    }

    fn resume(&self) -> Result<(), ControlError> {
        PlaybackController::resume(self)
    }

    fn stop(&self) -> Result<(), ControlError> {
        PlaybackController::stop(self)
    }

    fn state(&self) -> PlaybackState {
        PlaybackController::state(self)
    }

    fn current_text(&self) -> Option<String> {
        PlaybackController::current_text(self)
    }
}

impl Drop for PlaybackController {
    /// Stop any live session so no player outlives the controller.
    fn drop(&mut self) {
        let mut inner = self.drain(self.shared.lock());
        let worker = inner.worker.take();
        drop(inner);
        if let Some(handle) = worker {
            join_worker(handle);
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Everything one session's background thread needs.
struct Worker {
    shared: Arc<Shared>,
    pipeline: Arc<ProcessPipeline>,
    reporter: Reporter,
    id: u64,
    text: String,
    config: Arc<SpeechConfig>,
}

/// Ends the session on drop, so the controller returns to `Idle` even if
/// the worker panics.
struct SessionEnd {
    shared: Arc<Shared>,
    reporter: Reporter,
    id: u64,
    outcome: Option<SessionOutcome>,
}

impl Drop for SessionEnd {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or_else(|| SessionOutcome::Failed("playback worker crashed".into()));

        {
            let mut inner = self.shared.lock();
            if inner.session_mut(self.id).is_some() {
                inner.session = None;
                let transition = if inner.state == PlaybackState::Stopped {
                    Transition::TornDown
                } else {
                    Transition::Finished
                };
                inner.state = inner
                    .state
                    .apply(transition)
                    .unwrap_or(PlaybackState::Idle);
                inner.last_outcome = Some(outcome.clone());
            }
            self.shared.ended.notify_all();
        }

        log::debug!("playback: session {} ended: {outcome:?}", self.id);
        (self.reporter)(&PlaybackEvent::Finished(outcome));
    }
}

fn failed(error: &PipelineError) -> SessionOutcome {
    log::error!("playback: {error}");
    SessionOutcome::Failed(error.to_string())
}

impl Worker {
    fn run(self) {
        let mut end = SessionEnd {
            shared: Arc::clone(&self.shared),
            reporter: Arc::clone(&self.reporter),
            id: self.id,
            outcome: None,
        };
        (self.reporter)(&PlaybackEvent::Generating);
        end.outcome = Some(self.session());
    }

    /// Synthesis then playback.  The artifact is dropped (and the temp file
    /// removed) before this returns.
    fn session(&self) -> SessionOutcome {
        let artifact = match self.pipeline.create_artifact() {
            Ok(artifact) => artifact,
            Err(e) => return failed(&e),
        };

        // ── 1. Synthesis ─────────────────────────────────────────────────
        // Spawned under the lock so a concurrent stop() sees the pid.
        let mut engine = {
            let mut inner = self.shared.lock();
            let Some(session) = inner.session_mut(self.id) else {
                return SessionOutcome::Stopped;
            };
            if session.cancelled {
                return SessionOutcome::Stopped;
            }
            match self.pipeline.spawn_synthesis(&self.config, artifact.path()) {
                Ok(child) => {
                    session.phase = Phase::Synthesizing(child.id());
                    child
                }
                Err(e) => return failed(&e),
            }
        };

        let fed = self.pipeline.feed_synthesis(&mut engine, &self.text);
        let (exit, _) = reap(&self.shared, self.id, &mut engine, Phase::Pending);
        let synthesis = fed.and_then(|stderr| match exit {
            Ok(status) => self.pipeline.check_synthesis(status, stderr),
            Err(source) => Err(PipelineError::Io {
                program: "engine".into(),
                source,
            }),
        });

        // ── 2. Playback ──────────────────────────────────────────────────
        let mut player = {
            let mut inner = self.shared.lock();
            let Some(session) = inner.session_mut(self.id) else {
                return SessionOutcome::Stopped;
            };
            if session.cancelled {
                return SessionOutcome::Stopped;
            }
            if let Err(e) = synthesis {
                return failed(&e);
            }
            match self.pipeline.spawn_player(artifact.path()) {
                Ok(child) => {
                    session.phase = Phase::Playing(child.id());
                    child
                }
                Err(e) => return failed(&e),
            }
        };

        (self.reporter)(&PlaybackEvent::Playing);

        // ── 3. Outcome ───────────────────────────────────────────────────
        let (status, cancelled) = reap(&self.shared, self.id, &mut player, Phase::Finishing);

        if cancelled {
            return SessionOutcome::Stopped;
        }
        match status {
            Ok(status) if status.success() => SessionOutcome::Completed,
            Ok(status) => failed(&PipelineError::Playback { status }),
            Err(source) => failed(&PipelineError::Io {
                program: "player".into(),
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
