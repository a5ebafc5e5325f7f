//! Errors raised by the data manager.

use std::path::PathBuf;

use crate::downloader::DownloadError;

/// `DataManager::get` was called where no resolved path is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// Not inside any function wrapped by this manager (on this thread).
    #[error("no data files are available outside a function that requires them")]
    OutsideContext,
    /// Inside a wrapped function, but none of the active ones require this name.
    #[error("data file `{0}` is not required by the running function")]
    NotRequired(String),
}

/// Resolution failure; the wrapped function is not run.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("no candidate URLs for data file `{0}`")]
    NoCandidateUrls(String),
    /// Passed through from the downloader.
    #[error(transparent)]
    Download(#[from] DownloadError),
    /// Content did not hash to the declared value; storage was not touched.
    #[error("hash mismatch for data file `{name}`: expected {expected}, got {actual}")]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("could not hash {}: {:#}", .path.display(), .error)]
    Checksum { path: PathBuf, error: anyhow::Error },
    #[error("storage backend failed: {:#}", .0)]
    Storage(anyhow::Error),
}
