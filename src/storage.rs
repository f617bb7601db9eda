use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Durable home of the one in-flight command snapshot.
///
/// `read` returns the whole stored blob; an empty blob means "idle, nothing
/// to resume". `write` replaces the blob wholesale. The interpreter assumes
/// each write is atomic (it either fully lands or the prior blob survives)
/// and builds its crash-recovery guarantee on top of that.
pub trait Storage {
    fn read(&mut self) -> Result<Vec<u8>>;

    fn write(&mut self, blob: &[u8]) -> Result<()>;
}

/// Snapshot storage backed by a single file.
///
/// A missing file reads as the empty blob. Writes go to a sibling temp file
/// first and are moved into place with a rename, so a crash mid-write leaves
/// the previous snapshot intact.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Storage for FileStorage {
    fn read(&mut self) -> Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(blob) => Ok(blob),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err).with_context(|| {
                format!("can't read the state file {}", self.path.display())
            }),
        }
    }

    fn write(&mut self, blob: &[u8]) -> Result<()> {
        let tmp = PathBuf::from(format!("{}.tmp", self.path.display()));
        fs::write(&tmp, blob)
            .with_context(|| format!("can't write the state file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| {
            format!("can't move the state file into {}", self.path.display())
        })?;
        debug!(bytes = blob.len(), "snapshot persisted");
        Ok(())
    }
}
