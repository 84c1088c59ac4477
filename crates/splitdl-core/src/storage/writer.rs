//! Resume-aware open and concurrent offset writer for the destination file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

use crate::error::DownloadError;

use super::naming::claim_unique;

/// Result of opening the destination: where it lives and how much is already there.
pub struct OpenedStore {
    pub writer: StorageWriter,
    /// Final destination path (may differ from the requested one in fresh mode).
    pub path: PathBuf,
    /// Bytes already present on disk; 0 unless resuming an existing file.
    pub resume_offset: u64,
}

/// Writer for the destination file. Safe to clone and use from multiple threads;
/// each `write_at` is independent (pwrite-style) and callers never overlap.
#[derive(Clone)]
pub struct StorageWriter {
    file: Arc<File>,
    path: PathBuf,
}

impl StorageWriter {
    /// Open `path` for a download.
    ///
    /// Resume mode reopens an existing file read+write without truncation and
    /// reports its length as the resume offset, or creates it if missing.
    /// Fresh mode atomically claims a free name via [`claim_unique`].
    pub fn open(path: &Path, resume: bool, max_unique_attempts: u32) -> Result<OpenedStore, DownloadError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DownloadError::io(format!("cannot create directory {}", parent.display()), e)
                })?;
            }
        }

        if resume && path.exists() {
            let file = File::options()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|e| DownloadError::io(format!("cannot open file {}", path.display()), e))?;
            let resume_offset = file
                .metadata()
                .map_err(|e| DownloadError::io(format!("cannot stat file {}", path.display()), e))?
                .len();
            tracing::debug!(path = %path.display(), resume_offset, "reopened existing file");
            return Ok(OpenedStore {
                writer: StorageWriter::from_file(file, path.to_path_buf()),
                path: path.to_path_buf(),
                resume_offset,
            });
        }

        let (file, path) = if resume {
            let file = File::options()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .map_err(|e| DownloadError::io(format!("cannot create file {}", path.display()), e))?;
            (file, path.to_path_buf())
        } else {
            claim_unique(path, max_unique_attempts)
                .map_err(|e| DownloadError::io(format!("cannot create file {}", path.display()), e))?
        };
        tracing::debug!(path = %path.display(), "created destination file");
        Ok(OpenedStore {
            writer: StorageWriter::from_file(file, path.clone()),
            path,
            resume_offset: 0,
        })
    }

    fn from_file(file: File, path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            path,
        }
    }

    /// Write all of `data` at `offset`. Does not touch the file cursor; safe for concurrent use.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        self.file.write_all_at(data, offset)
    }

    /// Windows: `seek_write` is positioned and does not share a cursor between callers.
    #[cfg(windows)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        let mut written = 0usize;
        while written < data.len() {
            let n = self
                .file
                .seek_write(&data[written..], offset + written as u64)?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "short write"));
            }
            written += n;
        }
        Ok(())
    }

    /// Sync file data to disk.
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writer on a handle opened without write access; every write fails.
    #[cfg(test)]
    pub(crate) fn read_only(path: &Path) -> io::Result<Self> {
        Ok(Self::from_file(File::open(path)?, path.to_path_buf()))
    }
}
