//! Data manager: make sure required data files are downloaded, verified and
//! cached before the code that needs them runs.
//!
//! A function is wrapped with one or more [`Requirement`]s via
//! [`DataManager::require`]. Every call of the wrapper resolves each
//! requirement (cache hit, or download + SHA-256 check + store), then runs
//! the function with the resolved paths visible through
//! [`DataManager::get`].
//!
//! Resolution of one logical name is serialized across threads, so a name
//! is downloaded at most once per storage even under concurrent first use.

mod context;
mod error;
mod locks;
mod required;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::checksum;
use crate::config::ManagerConfig;
use crate::downloader::{DownloadError, Downloader};
use crate::storage::{CacheEntry, Storage};

pub use error::{ContextError, ManagerError};
pub use required::Required;

use context::Override;
use locks::NameLocks;

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// A data file a function needs: logical name, candidate URLs in preference
/// order, and the expected SHA-256 (hex) of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: String,
    urls: Vec<String>,
    expected_hash: String,
}

impl Requirement {
    pub fn new<I, U>(name: impl Into<String>, urls: I, expected_hash: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        Self {
            name: name.into(),
            urls: urls.into_iter().map(Into::into).collect(),
            expected_hash: expected_hash.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn expected_hash(&self) -> &str {
        &self.expected_hash
    }
}

struct Inner {
    id: u64,
    downloader: Arc<dyn Downloader>,
    storage: Arc<dyn Storage>,
    locks: NameLocks,
    url_fallback: bool,
}

/// Resolves [`Requirement`]s through a [`Downloader`] into a [`Storage`].
///
/// Cloning is cheap and clones share the same state. Separate instances
/// are fully independent, including their call-scoped paths.
#[derive(Clone)]
pub struct DataManager {
    inner: Arc<Inner>,
}

impl DataManager {
    /// Manager with the default policy (ordered URL fallback enabled).
    pub fn new(downloader: Arc<dyn Downloader>, storage: Arc<dyn Storage>) -> Self {
        Self::with_config(downloader, storage, &ManagerConfig::default())
    }

    pub fn with_config(
        downloader: Arc<dyn Downloader>,
        storage: Arc<dyn Storage>,
        cfg: &ManagerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
                downloader,
                storage,
                locks: NameLocks::default(),
                url_fallback: cfg.url_fallback,
            }),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// Wrap `f` so every call first resolves `requirement`.
    /// Add more requirements with [`Required::and_require`].
    pub fn require<F>(&self, requirement: Requirement, f: F) -> Required<F> {
        Required::new(self.clone(), vec![requirement], f)
    }

    /// Resolve `requirement`, then run `f` with its path available via [`get`](Self::get).
    pub fn with_requirement<R>(
        &self,
        requirement: &Requirement,
        f: impl FnOnce() -> R,
    ) -> Result<R, ManagerError> {
        self.with_requirements(std::slice::from_ref(requirement), f)
    }

    /// Resolve every requirement in order, then run `f`. If any fails, `f`
    /// does not run and the error is returned.
    pub fn with_requirements<R>(
        &self,
        requirements: &[Requirement],
        f: impl FnOnce() -> R,
    ) -> Result<R, ManagerError> {
        let mut resolved = Vec::with_capacity(requirements.len());
        for req in requirements {
            resolved.push((req.name(), self.resolve(req)?));
        }
        let _frames: Vec<_> = resolved
            .into_iter()
            .map(|(name, path)| context::enter(self.inner.id, name, path))
            .collect();
        Ok(f())
    }

    /// Path for `name` resolved by a wrapper of this manager that is
    /// currently running on this thread.
    pub fn get(&self, name: &str) -> Result<PathBuf, ContextError> {
        context::lookup(self.inner.id, name)
    }

    /// Run `f` with hash checking disabled for this manager on this thread:
    /// requirements are downloaded again even if cached, and stored with the
    /// hash computed from what was downloaded.
    pub fn skip_hash_check<R>(&self, f: impl FnOnce() -> R) -> R {
        let _skip = context::skip_hash(self.inner.id);
        f()
    }

    /// Run `f` with requirement `name` served from `uri` instead of its
    /// declared URLs. `uri` may be a local path, a `file://` URL, or a remote
    /// URL handed to the downloader. When `expected_hash` is given the content
    /// must match it. Overridden files bypass storage entirely.
    pub fn override_file<R>(
        &self,
        name: &str,
        uri: &str,
        expected_hash: Option<&str>,
        f: impl FnOnce() -> R,
    ) -> R {
        let _override = context::override_source(self.inner.id, name, uri, expected_hash);
        f()
    }

    /// Make sure `requirement` is cached and return its local path.
    pub fn resolve(&self, requirement: &Requirement) -> Result<PathBuf, ManagerError> {
        let id = self.inner.id;
        let name = requirement.name();
        if let Some(ov) = context::active_override(id, name) {
            return self.resolve_override(name, ov);
        }
        let skip_hash = context::hash_check_skipped(id);

        let lock = self.inner.locks.lock_for(name);
        let _held = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let previous = self
            .inner
            .storage
            .get(name)
            .map_err(ManagerError::Storage)?;
        if !skip_hash {
            if let Some(entry) = previous.as_ref().filter(|e| usable(requirement, e)) {
                tracing::debug!(name, path = %entry.file_path.display(), "cache hit");
                return Ok(entry.file_path.clone());
            }
        }

        let (url, path) = self.fetch(requirement)?;
        let actual = match hash_file(&path) {
            Ok(actual) => actual,
            Err(e) => {
                self.inner.downloader.discard(&path);
                return Err(e);
            }
        };
        if !skip_hash && !checksum::hash_matches(requirement.expected_hash(), &actual) {
            tracing::warn!(
                name,
                url = %url,
                expected = requirement.expected_hash(),
                actual = %actual,
                "hash mismatch, not caching"
            );
            self.inner.downloader.discard(&path);
            return Err(ManagerError::HashMismatch {
                name: name.to_string(),
                expected: checksum::normalize_hash(requirement.expected_hash()),
                actual,
            });
        }

        let entry = CacheEntry {
            logical_name: name.to_string(),
            file_path: absolute(path),
            source_url: url,
            hash: actual,
        };
        self.inner
            .storage
            .put(entry.clone())
            .map_err(ManagerError::Storage)?;
        tracing::info!(
            name,
            path = %entry.file_path.display(),
            url = %entry.source_url,
            "cached data file"
        );
        // The replaced file is no longer referenced by storage.
        if let Some(old) = previous.filter(|old| old.file_path != entry.file_path) {
            self.inner.downloader.discard(&old.file_path);
        }
        Ok(entry.file_path)
    }

    /// Download from the first candidate URL that works. Without URL
    /// fallback only the first candidate is tried.
    fn fetch(&self, requirement: &Requirement) -> Result<(String, PathBuf), ManagerError> {
        let name = requirement.name();
        if requirement.urls().is_empty() {
            return Err(ManagerError::NoCandidateUrls(name.to_string()));
        }

        let mut failures: Vec<(String, DownloadError)> = Vec::new();
        for url in requirement.urls() {
            tracing::info!(name, url = %url, "downloading data file");
            match self.inner.downloader.download(url) {
                Ok(path) => return Ok((url.clone(), path)),
                Err(e) => {
                    tracing::warn!(name, url = %url, "download failed: {}", e);
                    failures.push((url.clone(), e));
                    if !self.inner.url_fallback {
                        break;
                    }
                }
            }
        }

        let err = if failures.len() == 1 {
            failures.remove(0).1
        } else {
            DownloadError::AllCandidatesFailed(failures)
        };
        Err(err.into())
    }

    fn resolve_override(&self, name: &str, ov: Override) -> Result<PathBuf, ManagerError> {
        let path = match local_path(&ov.uri) {
            Some(path) => path,
            None => self.inner.downloader.download(&ov.uri)?,
        };
        if let Some(expected) = ov.hash.as_deref() {
            let actual = hash_file(&path)?;
            if !checksum::hash_matches(expected, &actual) {
                return Err(ManagerError::HashMismatch {
                    name: name.to_string(),
                    expected: checksum::normalize_hash(expected),
                    actual,
                });
            }
        }
        tracing::debug!(name, path = %path.display(), "using overridden data file");
        Ok(absolute(path))
    }
}

/// A stored entry is usable when it has the declared hash and its file is
/// still on disk. Content is not re-hashed.
fn usable(requirement: &Requirement, entry: &CacheEntry) -> bool {
    let ok = checksum::hash_matches(requirement.expected_hash(), &entry.hash)
        && entry.file_path.is_file();
    if !ok {
        tracing::debug!(
            name = requirement.name(),
            path = %entry.file_path.display(),
            "stale cache entry, downloading again"
        );
    }
    ok
}

fn hash_file(path: &Path) -> Result<String, ManagerError> {
    checksum::sha256_path(path).map_err(|error| ManagerError::Checksum {
        path: path.to_path_buf(),
        error,
    })
}

/// Local path for a `file://` URL or a bare path; `None` for other schemes.
fn local_path(uri: &str) -> Option<PathBuf> {
    if uri.starts_with("file://") {
        return url::Url::parse(uri).ok()?.to_file_path().ok();
    }
    if uri.contains("://") {
        return None;
    }
    Some(PathBuf::from(uri))
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|dir| dir.join(&path))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests;
