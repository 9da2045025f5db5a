//! File and in-memory readers and writers.

use crate::error::Result;
use crate::store::{Reader, Writer};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Reads a whole store file. A missing file reads as an empty payload.
#[derive(Debug, Clone)]
pub struct FileReader {
    path: PathBuf,
}

impl FileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Reader for FileReader {
    fn read(&mut self) -> Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(data) => {
                debug!(path = %self.path.display(), bytes = data.len(), "read store file");
                Ok(data)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file missing, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Replaces a store file atomically: data goes to a sibling temp file that is
/// then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileWriter {
    path: PathBuf,
}

impl FileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Writer for FileWriter {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;

        // Set secure permissions on temp file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o600))?;
        }

        temp.write_all(data)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), bytes = data.len(), "wrote store file");
        Ok(())
    }
}

/// An in-memory payload usable as both reader and writer.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    data: Vec<u8>,
    writes: usize,
}

impl MemoryBuffer {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            writes: 0,
        }
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Number of `write` calls received.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Reader for MemoryBuffer {
    fn read(&mut self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

impl Writer for MemoryBuffer {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.data = data.to_vec();
        self.writes += 1;
        Ok(())
    }
}
