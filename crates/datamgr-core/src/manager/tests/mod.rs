//! DataManager tests (split by topic).

use super::{DataManager, Requirement};
use crate::checksum::sha256_path;
use crate::downloader::RecordingDownloader;
use crate::storage::InMemStorage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

mod concurrency;

/// A data file on disk plus the manager pieces pointing at it.
pub(super) struct Fixture {
    pub(super) _dir: TempDir,
    pub(super) file: PathBuf,
    pub(super) hash: String,
    pub(super) downloader: Arc<RecordingDownloader>,
    pub(super) storage: Arc<InMemStorage>,
    pub(super) manager: DataManager,
}

pub(super) fn write_file(dir: &Path, name: &str, content: &[u8]) -> (PathBuf, String) {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    let hash = sha256_path(&path).unwrap();
    (path, hash)
}

pub(super) fn fixture_with(make: impl FnOnce(PathBuf) -> RecordingDownloader) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let (file, hash) = write_file(dir.path(), "lol", b"SIMPLE  =                    T");
    let downloader = Arc::new(make(file.clone()));
    let storage = Arc::new(InMemStorage::new());
    let manager = DataManager::new(downloader.clone(), storage.clone());
    Fixture {
        _dir: dir,
        file,
        hash,
        downloader,
        storage,
        manager,
    }
}

pub(super) fn fixture() -> Fixture {
    fixture_with(|path| RecordingDownloader::new(path))
}

pub(super) fn requirement(fx: &Fixture) -> Requirement {
    Requirement::new("test_file", ["url1", "url2"], fx.hash.clone())
}
