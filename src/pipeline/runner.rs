//! Process pipeline — engine process → audio artifact → player process.
//!
//! # Flow
//!
//! ```text
//! synthesize(text, config)
//!   ├─ save mode  → engine --output-file <config.output>   → Artifact::Saved
//!   └─ play mode  → engine --output-file <reed-XXXX.wav>    → Artifact::Temporary
//!
//! play_artifact(artifact)
//!   └─ <resolved player> [args] <artifact path>
//! ```
//!
//! The pipeline holds no per-session state.  The playback command is resolved
//! through the [`PlatformResolver`] on first use and cached for the rest of
//! the run.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::config::{ConfigError, SpeechConfig};
use crate::platform::{CommandSpec, PlatformError, PlatformResolver};

use super::artifact::Artifact;
use super::command::{engine_args, EngineCommand};
use super::spawn::{Spawner, SystemSpawner};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors raised synchronously by the process pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The executable could not be started at all.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O with a running process failed.
    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine exited non-zero or wrote to stderr.
    #[error("synthesis failed ({}){}", exit_label(.exit), stderr_suffix(.stderr))]
    Synthesis { exit: Option<i32>, stderr: String },

    /// The player exited non-zero.
    #[error("playback error: player {status}")]
    Playback { status: ExitStatus },

    /// The temporary audio file could not be created.
    #[error("cannot create temporary audio file: {0}")]
    Artifact(#[source] std::io::Error),

    /// The background playback thread could not be started.
    #[error("cannot start playback worker: {0}")]
    Worker(#[source] std::io::Error),
}

fn exit_label(exit: &Option<i32>) -> String {
    match exit {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".into(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

// ---------------------------------------------------------------------------
// OneShot
// ---------------------------------------------------------------------------

/// Result of a completed [`ProcessPipeline::run_one_shot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneShot {
    /// Audio was played and the temporary file removed.
    Played,
    /// Audio was written to this path; nothing was played.
    Saved(PathBuf),
}

// ---------------------------------------------------------------------------
// ProcessPipeline
// ---------------------------------------------------------------------------

/// Runs the synthesis engine and the audio player as child processes.
pub struct ProcessPipeline {
    engine: EngineCommand,
    resolver: Arc<PlatformResolver>,
    player: OnceLock<Result<CommandSpec, PlatformError>>,
    spawner: Arc<dyn Spawner>,
    artifact_dir: Option<PathBuf>,
}

impl std::fmt::Debug for ProcessPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessPipeline")
            .field("engine", &self.engine)
            .field("player", &self.player.get())
            .field("artifact_dir", &self.artifact_dir)
            .finish_non_exhaustive()
    }
}

impl ProcessPipeline {
    pub fn new(engine: EngineCommand, resolver: Arc<PlatformResolver>) -> Self {
        Self {
            engine,
            resolver,
            player: OnceLock::new(),
            spawner: Arc::new(SystemSpawner),
            artifact_dir: None,
        }
    }

    /// Use `player` instead of asking the platform resolver.
    pub fn with_player(self, player: CommandSpec) -> Self {
        Self {
            player: OnceLock::from(Ok(player)),
            ..self
        }
    }

    pub fn with_spawner(self, spawner: Arc<dyn Spawner>) -> Self {
        Self { spawner, ..self }
    }

    /// Create temporary artifacts in `dir` instead of the system temp dir.
    pub fn with_artifact_dir(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: Some(dir.into()),
            ..self
        }
    }

    /// The playback command, resolved once per pipeline.
    pub fn player(&self) -> Result<CommandSpec, PlatformError> {
        self.player
            .get_or_init(|| self.resolver.resolve_playback_command())
            .clone()
    }

    /// A fresh temporary artifact for one session.
    pub fn create_artifact(&self) -> Result<Artifact, PipelineError> {
        Artifact::temporary(self.artifact_dir.as_deref()).map_err(PipelineError::Artifact)
    }

    // -----------------------------------------------------------------------
    // Building blocks (also used by the playback controller)
    // -----------------------------------------------------------------------

    /// Start the engine writing to `output`; the caller feeds it with
    /// [`finish_synthesis`](Self::finish_synthesis).
    pub fn spawn_synthesis(
        &self,
        config: &SpeechConfig,
        output: &Path,
    ) -> Result<Child, PipelineError> {
        let mut command = self.engine.spec.to_command();
        command
            .args(engine_args(config, output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        log::debug!("pipeline: spawning engine {}", self.engine.spec);
        self.spawner
            .spawn(&mut command)
            .map_err(|source| PipelineError::Spawn {
                program: self.engine.spec.program.clone(),
                source,
            })
    }

    /// Feed `text` to a running engine and wait for it to exit.
    pub fn finish_synthesis(&self, mut child: Child, text: &str) -> Result<(), PipelineError> {
        let stderr = self.feed_synthesis(&mut child, text)?;
        let status = child.wait().map_err(|source| self.engine_io(source))?;
        self.check_synthesis(status, stderr)
    }

    /// Write `text` to the engine and collect its stderr until the pipe
    /// closes.  The process is not reaped.
    ///
    /// Stdin is written on a scoped thread while this thread drains stderr,
    /// so neither pipe can fill up and stall the engine.
    pub fn feed_synthesis(&self, child: &mut Child, text: &str) -> Result<String, PipelineError> {
        let stdin = child.stdin.take();
        let stderr = child.stderr.take();

        let (read, fed) = std::thread::scope(|scope| {
            let writer = stdin.map(|mut pipe| scope.spawn(move || pipe.write_all(text.as_bytes())));
            let mut buf = Vec::new();
            let read = match stderr {
                Some(mut pipe) => pipe.read_to_end(&mut buf).map(|_| buf),
                None => Ok(buf),
            };
            let fed = writer.map(|handle| handle.join());
            (read, fed)
        });

        if let Some(Ok(Err(e))) = fed {
            log::warn!("pipeline: engine did not accept all input: {e}");
        }

        let buf = read.map_err(|source| self.engine_io(source))?;
        Ok(String::from_utf8_lossy(&buf).trim().to_string())
    }

    /// Judge an exited engine by its status and what it wrote to stderr.
    pub fn check_synthesis(&self, status: ExitStatus, stderr: String) -> Result<(), PipelineError> {
        if !status.success() || (self.engine.fail_on_stderr && !stderr.is_empty()) {
            return Err(PipelineError::Synthesis {
                exit: status.code(),
                stderr,
            });
        }
        Ok(())
    }

    fn engine_io(&self, source: std::io::Error) -> PipelineError {
        PipelineError::Io {
            program: self.engine.spec.program.clone(),
            source,
        }
    }

    /// Start the player on `audio`.
    pub fn spawn_player(&self, audio: &Path) -> Result<Child, PipelineError> {
        let player = self.player()?;
        let mut command = player.to_command();
        command
            .arg(audio)
            .stdin(Stdio::null())
            .stdout(Stdio::null());

        log::debug!("pipeline: spawning player {player} {}", audio.display());
        self.spawner
            .spawn(&mut command)
            .map_err(|source| PipelineError::Spawn {
                program: player.program.clone(),
                source,
            })
    }

    // -----------------------------------------------------------------------
    // Blocking operations
    // -----------------------------------------------------------------------

    /// Run the engine to completion.
    ///
    /// In save mode the audio goes to `config.output`; otherwise to a new
    /// temporary artifact, which is deleted again if synthesis fails.
    pub fn synthesize(&self, text: &str, config: &SpeechConfig) -> Result<Artifact, PipelineError> {
        config.validate()?;

        let artifact = match &config.output {
            Some(path) => Artifact::Saved(path.clone()),
            None => self.create_artifact()?,
        };

        let child = self.spawn_synthesis(config, artifact.path())?;
        self.finish_synthesis(child, text)?;
        Ok(artifact)
    }

    /// Play `artifact` and wait for the player to exit.
    ///
    /// A non-zero player exit is a [`PipelineError::Playback`].
    pub fn play_artifact(&self, artifact: &Artifact) -> Result<(), PipelineError> {
        let mut child = self.spawn_player(artifact.path())?;
        let status = child.wait().map_err(|source| PipelineError::Io {
            program: "player".into(),
            source,
        })?;
        if !status.success() {
            return Err(PipelineError::Playback { status });
        }
        Ok(())
    }

    /// Synthesize, then either leave the file at `config.output` or play it.
    pub fn run_one_shot(&self, text: &str, config: &SpeechConfig) -> Result<OneShot, PipelineError> {
        if !config.is_save_mode() {
            // Fail before spawning the engine when there is nothing to play on.
            self.player()?;
        }

        let artifact = self.synthesize(text, config)?;
        match artifact {
            Artifact::Saved(path) => Ok(OneShot::Saved(path)),
            temporary => {
                self.play_artifact(&temporary)?;
                Ok(OneShot::Played)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
