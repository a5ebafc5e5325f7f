//! Recording test double for [`Downloader`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use super::{DownloadError, Downloader};

/// Returns a fixed path for every URL and records each call. Discarded
/// paths are recorded too, never deleted.
///
/// URLs registered with [`failing_on`](Self::failing_on) answer HTTP 404
/// instead. An optional delay widens race windows in concurrency tests.
#[derive(Debug)]
pub struct RecordingDownloader {
    path: PathBuf,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    discarded: Mutex<Vec<PathBuf>>,
}

impl RecordingDownloader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            failing: HashSet::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
            discarded: Mutex::new(Vec::new()),
        }
    }

    /// Make downloads of `url` fail with HTTP 404.
    pub fn failing_on(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    /// Sleep this long inside every `download` call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of `download` calls so far, failed ones included.
    pub fn times_called(&self) -> usize {
        self.urls().len()
    }

    /// URLs requested so far, in call order.
    pub fn urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Paths handed to `discard`, in call order.
    pub fn discarded(&self) -> Vec<PathBuf> {
        self.discarded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Downloader for RecordingDownloader {
    fn download(&self, url: &str) -> Result<PathBuf, DownloadError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.failing.contains(url) {
            return Err(DownloadError::Http {
                url: url.to_string(),
                status: 404,
            });
        }
        Ok(self.path.clone())
    }

    fn discard(&self, path: &Path) {
        self.discarded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_path_buf());
    }
}
