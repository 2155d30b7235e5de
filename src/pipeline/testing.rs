//! Shared test fixtures: `sh` scripts standing in for piper and the player.
//!
//! Scripts receive piper's arguments, so the output path is the last one.
//! Long-running scripts `exec sleep` so a signal sent to the PID reaches the
//! sleeping process itself.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use crate::config::SpeechConfig;
use crate::platform::{CommandSpec, ExecutableProbe, Os, PlatformResolver};

use super::command::EngineCommand;
use super::runner::ProcessPipeline;

/// `$0` of every fake engine process.
pub const ENGINE_TAG: &str = "reed-test-engine";
/// `$0` of every fake player process.
pub const PLAYER_TAG: &str = "reed-test-player";

fn script(tag: &str, body: &str) -> CommandSpec {
    CommandSpec::new("sh", ["-c", body, tag])
}

fn engine(body: &str, fail_on_stderr: bool) -> EngineCommand {
    EngineCommand::new(script(ENGINE_TAG, body), fail_on_stderr)
}

/// Reads stdin, writes a 4-byte stub WAV.
pub fn engine_ok() -> EngineCommand {
    engine(
        r#"cat >/dev/null; for last; do :; done; printf RIFF > "$last""#,
        true,
    )
}

/// Copies stdin to the output file.
pub fn engine_echo() -> EngineCommand {
    engine(r#"for last; do :; done; cat > "$last""#, true)
}

/// Exits 1 without producing audio.
pub fn engine_failing() -> EngineCommand {
    engine("cat >/dev/null; exit 1", true)
}

/// Succeeds but logs to stderr.
pub fn engine_noisy(fail_on_stderr: bool) -> EngineCommand {
    engine(
        r#"cat >/dev/null; echo "warming up" >&2; for last; do :; done; printf RIFF > "$last""#,
        fail_on_stderr,
    )
}

/// Never finishes on its own.
pub fn engine_slow() -> EngineCommand {
    engine("cat >/dev/null; exec sleep 30", true)
}

/// Exits immediately with success.
pub fn player_ok() -> CommandSpec {
    script(PLAYER_TAG, "exit 0")
}

/// Exits 3.
pub fn player_failing() -> CommandSpec {
    script(PLAYER_TAG, "exit 3")
}

/// Plays "forever" until signalled.
pub fn player_slow() -> CommandSpec {
    script(PLAYER_TAG, "exec sleep 30")
}

struct NothingInstalled;

impl ExecutableProbe for NothingInstalled {
    fn is_installed(&self, _program: &str) -> bool {
        false
    }
}

/// Linux resolver that finds no tools at all.
pub fn no_backend_resolver() -> PlatformResolver {
    PlatformResolver::new(Os::Linux, NothingInstalled)
}

/// A temp directory with a model file and a separate artifact directory.
pub struct Fixture {
    pub dir: TempDir,
    pub artifacts: TempDir,
    pub config: SpeechConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let artifacts = tempfile::tempdir().expect("artifact dir");
        let model: PathBuf = dir.path().join("en_US-test-medium.onnx");
        std::fs::write(&model, b"onnx").expect("write model");
        Self {
            dir,
            artifacts,
            config: SpeechConfig::new(model),
        }
    }

    /// Pipeline writing artifacts into this fixture, with a fixed player.
    pub fn pipeline(&self, engine: EngineCommand, player: CommandSpec) -> ProcessPipeline {
        ProcessPipeline::new(engine, Arc::new(no_backend_resolver()))
            .with_player(player)
            .with_artifact_dir(self.artifacts.path())
    }

    /// Number of files currently in the artifact directory.
    pub fn artifact_count(&self) -> usize {
        std::fs::read_dir(self.artifacts.path())
            .expect("read artifact dir")
            .count()
    }
}
