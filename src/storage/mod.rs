//! Output artifact storage
//!
//! A run's edited text lands in a single well-known file,
//! `{output_dir}/edited.txt`. Runs write into a temporary file in the same
//! directory and rename it into place only once every chunk succeeded, so the
//! last good result survives a failed or cancelled run.

use crate::document::decode_text_lossy;
use crate::types::{AppError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// File name of the latest edited document
pub const ARTIFACT_FILE_NAME: &str = "edited.txt";

#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE_NAME)
    }

    pub fn has_artifact(&self) -> bool {
        self.artifact_path().is_file()
    }

    /// Start staging a new artifact.
    pub fn begin(&self) -> Result<StagedArtifact> {
        fs::create_dir_all(&self.dir)?;
        let file = tempfile::Builder::new()
            .prefix(".edited-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;

        debug!(path = ?file.path(), "Staging artifact");
        Ok(StagedArtifact {
            file,
            target: self.artifact_path(),
            bytes_written: 0,
        })
    }

    /// Read the latest artifact. Invalid UTF-8 sequences are dropped.
    pub fn read_latest(&self) -> Result<String> {
        let path = self.artifact_path();
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::NotFound("No edited document yet; run an edit first".to_string())
            }
            _ => AppError::Storage(format!("Failed to read {}: {}", path.display(), e)),
        })?;
        Ok(decode_text_lossy(&bytes))
    }
}

/// An artifact being written. Dropping it without [`commit`](Self::commit)
/// deletes the temporary file and leaves the previous artifact untouched.
pub struct StagedArtifact {
    file: NamedTempFile,
    target: PathBuf,
    bytes_written: usize,
}

impl StagedArtifact {
    /// Append text and flush it to disk.
    pub fn append(&mut self, text: &str) -> Result<()> {
        self.file.write_all(text.as_bytes())?;
        self.file.flush()?;
        self.bytes_written += text.len();
        Ok(())
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Atomically replace the artifact with the staged content.
    pub fn commit(self) -> Result<PathBuf> {
        self.file.as_file().sync_all()?;
        self.file
            .persist(&self.target)
            .map_err(|e| AppError::Storage(format!("Failed to publish artifact: {}", e.error)))?;
        Ok(self.target)
    }
}
