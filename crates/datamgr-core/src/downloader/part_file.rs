//! Temp file a download streams into before it gets its final name.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Temporary file suffix used before atomic rename.
pub(crate) const TEMP_SUFFIX: &str = ".part";

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Sequentially written `.part` file in the cache directory.
///
/// Removed on drop unless [`PartFile::finish`] renamed it into place, so a
/// failed transfer never leaves content behind under a real name.
pub(crate) struct PartFile {
    file: Option<File>,
    path: PathBuf,
    bytes: u64,
}

impl PartFile {
    /// Create a fresh, uniquely named temp file in `dir`.
    pub(crate) fn create(dir: &Path) -> io::Result<Self> {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!(".datamgr-{}-{}{}", std::process::id(), id, TEMP_SUFFIX));
        let file = File::options().write(true).create_new(true).open(&path)?;
        Ok(PartFile {
            file: Some(file),
            path,
            bytes: 0,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Sync to disk, close, and rename onto `final_path`.
    pub(crate) fn finish(mut self, final_path: &Path) -> io::Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        std::fs::rename(&self.path, final_path)?;
        // Renamed away; nothing left for Drop to clean up.
        self.path = PathBuf::new();
        Ok(())
    }
}

impl Write for PartFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("part file already closed"))?;
        let n = file.write(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(f) => f.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if self.path.as_os_str().is_empty() {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "could not remove temp file: {}", e);
            }
        }
    }
}
