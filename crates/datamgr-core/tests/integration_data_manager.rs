//! Integration test: DataManager + CurlDownloader + SqliteStorage against a
//! local HTTP server.

mod common;

use common::http_server::{self, Route};
use datamgr_core::checksum::sha256_path;
use datamgr_core::config::DownloadConfig;
use datamgr_core::{
    CurlDownloader, DataManager, DownloadError, Downloader, ManagerError, Requirement,
    SqliteStorage, Storage,
};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::tempdir;

const BODY: &[u8] = b"SIMPLE  =                    T / conforms to FITS standard";

fn body_hash() -> String {
    let dir = tempdir().unwrap();
    let p = dir.path().join("body");
    std::fs::write(&p, BODY).unwrap();
    sha256_path(&p).unwrap()
}

fn routes() -> HashMap<String, Route> {
    let mut routes = HashMap::new();
    routes.insert("/data/aia_lev1.fits".to_string(), Route::body(BODY));
    routes.insert(
        "/get".to_string(),
        Route {
            body: BODY.to_vec(),
            disposition: Some("attachment; filename=\"eit_195.fits\"".to_string()),
        },
    );
    routes
}

#[test]
fn downloads_verifies_and_persists() {
    let server = http_server::start(routes());
    let cache = tempdir().unwrap();
    let state = tempdir().unwrap();
    let db_path = state.path().join("cache.db");
    let req = Requirement::new(
        "aia_lev1",
        [server.url("/data/aia_lev1.fits")],
        body_hash(),
    );

    {
        let storage = Arc::new(SqliteStorage::open_at(&db_path).unwrap());
        let downloader = Arc::new(CurlDownloader::new(cache.path(), DownloadConfig::default()));
        let manager = DataManager::new(downloader, storage.clone());
        let m = manager.clone();
        let content = manager
            .require(req.clone(), move || {
                std::fs::read(m.get("aia_lev1").unwrap()).unwrap()
            })
            .call()
            .unwrap();
        assert_eq!(content, BODY);

        let entry = storage.get("aia_lev1").unwrap().expect("entry stored");
        assert_eq!(entry.file_path, cache.path().join("aia_lev1.fits"));
        assert_eq!(entry.source_url, server.url("/data/aia_lev1.fits"));
    }
    assert_eq!(server.hits("/data/aia_lev1.fits"), 1);

    // A fresh manager over the same index reuses the file.
    let storage = Arc::new(SqliteStorage::open_at(&db_path).unwrap());
    let downloader = Arc::new(CurlDownloader::new(cache.path(), DownloadConfig::default()));
    let manager = DataManager::new(downloader, storage);
    let path = manager.resolve(&req).unwrap();
    assert_eq!(path, cache.path().join("aia_lev1.fits"));
    assert_eq!(server.hits("/data/aia_lev1.fits"), 1);
}

#[test]
fn content_disposition_names_file() {
    let server = http_server::start(routes());
    let cache = tempdir().unwrap();
    let downloader = CurlDownloader::new(cache.path(), DownloadConfig::default());
    let path = downloader.download(&server.url("/get")).unwrap();
    assert_eq!(path, cache.path().join("eit_195.fits"));
    assert_eq!(std::fs::read(&path).unwrap(), BODY);
}

#[test]
fn not_found_is_http_error() {
    let server = http_server::start(routes());
    let cache = tempdir().unwrap();
    let downloader = CurlDownloader::new(cache.path(), DownloadConfig::default());
    let err = downloader.download(&server.url("/missing.fits")).unwrap_err();
    assert!(
        matches!(err, DownloadError::Http { status: 404, .. }),
        "unexpected error: {err:?}"
    );
    // No temp file left behind.
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[test]
fn falls_back_past_missing_mirror() {
    let server = http_server::start(routes());
    let cache = tempdir().unwrap();
    let state = tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::open_at(state.path().join("cache.db")).unwrap());
    let downloader = Arc::new(CurlDownloader::new(cache.path(), DownloadConfig::default()));
    let manager = DataManager::new(downloader, storage.clone());

    let req = Requirement::new(
        "aia_lev1",
        [
            server.url("/mirror/aia_lev1.fits"),
            server.url("/data/aia_lev1.fits"),
        ],
        body_hash(),
    );
    manager.resolve(&req).unwrap();
    assert_eq!(server.hits("/mirror/aia_lev1.fits"), 1);
    assert_eq!(
        storage.get("aia_lev1").unwrap().unwrap().source_url,
        server.url("/data/aia_lev1.fits")
    );
}

#[test]
fn wrong_hash_not_stored() {
    let server = http_server::start(routes());
    let cache = tempdir().unwrap();
    let state = tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::open_at(state.path().join("cache.db")).unwrap());
    let downloader = Arc::new(CurlDownloader::new(cache.path(), DownloadConfig::default()));
    let manager = DataManager::new(downloader, storage.clone());

    let req = Requirement::new(
        "aia_lev1",
        [server.url("/data/aia_lev1.fits")],
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    );
    let err = manager.with_requirement(&req, || ()).unwrap_err();
    assert!(matches!(err, ManagerError::HashMismatch { .. }));
    assert!(storage.all().unwrap().is_empty());
}

#[test]
fn rejected_downloads_do_not_pile_up() {
    let mut routes = routes();
    routes.insert("/aia.fits".to_string(), Route::body(b"updated upstream"));
    let server = http_server::start(routes);
    let cache = tempdir().unwrap();
    let state = tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::open_at(state.path().join("cache.db")).unwrap());
    let downloader = Arc::new(CurlDownloader::new(cache.path(), DownloadConfig::default()));
    let manager = DataManager::new(downloader, storage.clone());

    let req = Requirement::new(
        "aia",
        [server.url("/aia.fits")],
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    );
    for _ in 0..5 {
        let err = manager.with_requirement(&req, || ()).unwrap_err();
        assert!(matches!(err, ManagerError::HashMismatch { .. }), "{err:?}");
    }
    assert_eq!(server.hits("/aia.fits"), 5);
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
    assert!(storage.all().unwrap().is_empty());
}

#[test]
fn refetch_replaces_previous_file() {
    let server = http_server::start(routes());
    let cache = tempdir().unwrap();
    let state = tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::open_at(state.path().join("cache.db")).unwrap());
    let downloader = Arc::new(CurlDownloader::new(cache.path(), DownloadConfig::default()));
    let manager = DataManager::new(downloader, storage.clone());
    let req = Requirement::new(
        "aia_lev1",
        [server.url("/data/aia_lev1.fits")],
        body_hash(),
    );

    let first = manager.resolve(&req).unwrap();
    let second = manager.skip_hash_check(|| manager.resolve(&req)).unwrap();

    assert_eq!(server.hits("/data/aia_lev1.fits"), 2);
    assert_ne!(first, second);
    assert!(!first.exists());
    assert_eq!(std::fs::read(&second).unwrap(), BODY);
    assert_eq!(storage.get("aia_lev1").unwrap().unwrap().file_path, second);
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 1);
}
