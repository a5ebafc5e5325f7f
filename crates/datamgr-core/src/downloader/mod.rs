//! Downloader capability: URL in, local file path out.
//!
//! The data manager only depends on [`Downloader`]. [`CurlDownloader`] is the
//! production implementation; [`RecordingDownloader`] is a test double that
//! counts calls.

mod http;
mod part_file;
mod recording;

use std::path::{Path, PathBuf};

pub use http::CurlDownloader;
pub use recording::RecordingDownloader;

/// Fetches the content at a URL into a local file.
pub trait Downloader: Send + Sync {
    /// Download `url` and return the path of the local copy.
    fn download(&self, url: &str) -> Result<PathBuf, DownloadError>;

    /// Hand back a file from an earlier `download` that the caller will not
    /// keep. Implementations delete only files they own.
    fn discard(&self, _path: &Path) {}
}

/// Why a download did not produce a local file.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// libcurl rejected the URL.
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: curl::Error,
    },
    /// Connection, TLS, timeout or protocol failure.
    #[error("GET {url} failed: {source}")]
    Transfer {
        url: String,
        #[source]
        source: curl::Error,
    },
    /// Server answered with a non-2xx status.
    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u32 },
    /// Local write, sync or rename failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Every candidate URL of a requirement failed, in the order tried.
    #[error("all {} candidate URLs failed; last: {}", .0.len(), last_failure(.0))]
    AllCandidatesFailed(Vec<(String, DownloadError)>),
}

fn last_failure(failures: &[(String, DownloadError)]) -> String {
    failures
        .last()
        .map(|(_, e)| e.to_string())
        .unwrap_or_default()
}

impl DownloadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Io {
            path: path.into(),
            source,
        }
    }
}
