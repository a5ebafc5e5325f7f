//! libcurl-backed downloader.
//!
//! One GET per call, redirects followed, body streamed to a `.part` file in
//! the cache directory and renamed into place once the server answered 2xx.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::str;
use std::sync::Mutex;

use super::part_file::PartFile;
use super::{DownloadError, Downloader};
use crate::config::{DatamgrConfig, DownloadConfig};
use crate::url_model;

/// Production [`Downloader`] writing into a cache directory.
pub struct CurlDownloader {
    cache_dir: PathBuf,
    cfg: DownloadConfig,
    /// Serializes picking a free destination name and renaming onto it.
    place_lock: Mutex<()>,
}

impl CurlDownloader {
    pub fn new(cache_dir: impl Into<PathBuf>, cfg: DownloadConfig) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            cfg,
            place_lock: Mutex::new(()),
        }
    }

    /// Downloader for the configured (or default XDG) cache directory.
    pub fn from_config(cfg: &DatamgrConfig) -> Result<Self> {
        Ok(Self::new(cfg.resolved_cache_dir()?, cfg.download.clone()))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn easy_for(&self, url: &str) -> Result<curl::easy::Easy, DownloadError> {
        let transfer_err = |source| DownloadError::Transfer {
            url: url.to_string(),
            source,
        };
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(|source| DownloadError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        easy.follow_location(true).map_err(transfer_err)?;
        easy.max_redirections(self.cfg.max_redirections)
            .map_err(transfer_err)?;
        easy.connect_timeout(self.cfg.connect_timeout())
            .map_err(transfer_err)?;
        easy.timeout(self.cfg.timeout()).map_err(transfer_err)?;
        easy.low_speed_limit(self.cfg.low_speed_limit_bytes)
            .map_err(transfer_err)?;
        easy.low_speed_time(self.cfg.low_speed_time())
            .map_err(transfer_err)?;
        Ok(easy)
    }

    /// Move the finished temp file to a free name derived from the response.
    fn place(
        &self,
        part: PartFile,
        url: &str,
        headers: &[String],
    ) -> Result<PathBuf, DownloadError> {
        let disposition = last_header(headers, "content-disposition");
        let filename = url_model::filename_for(url, disposition.as_deref());
        let _guard = self
            .place_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let dest = url_model::unique_destination(&self.cache_dir, &filename);
        part.finish(&dest)
            .map_err(|source| DownloadError::io(&dest, source))?;
        Ok(dest)
    }
}

impl Downloader for CurlDownloader {
    fn download(&self, url: &str) -> Result<PathBuf, DownloadError> {
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|source| DownloadError::io(&self.cache_dir, source))?;

        let mut easy = self.easy_for(url)?;
        let mut part = PartFile::create(&self.cache_dir)
            .map_err(|source| DownloadError::io(&self.cache_dir, source))?;
        let mut headers: Vec<String> = Vec::new();
        let mut write_error: Option<std::io::Error> = None;
        let transfer_err = |source| DownloadError::Transfer {
            url: url.to_string(),
            source,
        };

        tracing::debug!(url, temp = %part.path().display(), "starting download");
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        headers.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(transfer_err)?;
            transfer
                .write_function(|data| {
                    use std::io::Write;
                    match part.write_all(data) {
                        Ok(()) => Ok(data.len()),
                        Err(e) => {
                            write_error = Some(e);
                            Ok(0) // abort transfer
                        }
                    }
                })
                .map_err(transfer_err)?;
            transfer.perform()
        };

        if let Some(source) = write_error {
            return Err(DownloadError::io(part.path(), source));
        }
        performed.map_err(transfer_err)?;

        // file:// transfers report 0.
        let status = easy.response_code().map_err(transfer_err)?;
        if status != 0 && !(200..300).contains(&status) {
            return Err(DownloadError::Http {
                url: url.to_string(),
                status,
            });
        }

        let bytes = part.bytes_written();
        let dest = self.place(part, url, &headers)?;
        tracing::info!(url, path = %dest.display(), bytes, "download complete");
        Ok(dest)
    }

    fn discard(&self, path: &Path) {
        let in_cache = path.parent().is_some_and(|dir| {
            dir == self.cache_dir
                || std::env::current_dir().is_ok_and(|cwd| cwd.join(&self.cache_dir) == dir)
        });
        if !in_cache {
            tracing::debug!(path = %path.display(), "not in cache dir, keeping");
            return;
        }
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "discarded download"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), "failed to discard download: {}", e),
        }
    }
}

/// Value of the last `name:` header line (case-insensitive). With redirects
/// libcurl reports every hop's headers; the final response comes last.
fn last_header(lines: &[String], name: &str) -> Option<String> {
    lines
        .iter()
        .filter_map(|line| line.split_once(':'))
        .filter(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim().to_string())
        .last()
}
