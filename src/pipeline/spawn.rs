//! Process-spawn seam.
//!
//! Every engine and player process goes through a [`Spawner`], so tests can
//! count and inspect spawns without replacing the processes themselves.

use std::io;
use std::process::{Child, Command};

/// Starts a fully configured [`Command`].
pub trait Spawner: Send + Sync {
    fn spawn(&self, command: &mut Command) -> io::Result<Child>;
}

/// Spawns directly with [`Command::spawn`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSpawner;

impl Spawner for SystemSpawner {
    fn spawn(&self, command: &mut Command) -> io::Result<Child> {
        command.spawn()
    }
}

/// Test double that records each spawned command line.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSpawner {
    spawned: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingSpawner {
    pub fn spawned(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }

    /// Number of recorded command lines containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.spawned
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }
}

#[cfg(test)]
impl Spawner for RecordingSpawner {
    fn spawn(&self, command: &mut Command) -> io::Result<Child> {
        let line = std::iter::once(command.get_program())
            .chain(command.get_args())
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        self.spawned.lock().unwrap().push(line);
        command.spawn()
    }
}
