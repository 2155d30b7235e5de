//! Audio artifacts produced by synthesis.
//!
//! A temporary artifact is a [`tempfile::TempPath`]: the file is deleted when
//! the artifact is dropped, whichever way the session ends.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

/// Where synthesised audio lives.
#[derive(Debug)]
pub enum Artifact {
    /// Deleted on drop.
    Temporary(TempPath),
    /// The user's `-o` file; left in place.
    Saved(PathBuf),
}

impl Artifact {
    /// Create an empty `reed-*.wav` file in `dir` (or the system temp dir).
    pub fn temporary(dir: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("reed-").suffix(".wav");
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(Self::Temporary(file.into_temp_path()))
    }

    pub fn path(&self) -> &Path {
        match self {
            Artifact::Temporary(path) => path,
            Artifact::Saved(path) => path,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Artifact::Temporary(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_artifact_is_removed_on_drop() {
        let dir = tempfile::tempdir().expect("temp dir");
        let artifact = Artifact::temporary(Some(dir.path())).expect("artifact");
        let path = artifact.path().to_path_buf();

        assert!(path.exists());
        assert!(artifact.is_temporary());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn saved_artifact_survives_drop() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        drop(Artifact::Saved(path.clone()));
        assert!(path.exists());
    }
}
