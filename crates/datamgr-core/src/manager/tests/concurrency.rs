//! Concurrent callers: at-most-one fetch per name, isolated contexts.

use super::{fixture_with, requirement, write_file};
use crate::downloader::RecordingDownloader;
use crate::manager::{DataManager, Requirement};
use crate::storage::{InMemStorage, Storage};
use std::sync::{Arc, Barrier};
use std::time::Duration;

#[test]
fn concurrent_first_use_downloads_once() {
    let fx = fixture_with(|path| {
        RecordingDownloader::new(path).with_delay(Duration::from_millis(50))
    });
    let m = fx.manager.clone();
    let foo = fx
        .manager
        .require(requirement(&fx), move || m.get("test_file").unwrap());
    let barrier = Barrier::new(8);

    let seen: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    foo.call().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(fx.downloader.times_called(), 1);
    assert_eq!(fx.storage.len(), 1);
    assert!(seen.iter().all(|p| *p == fx.file));
}

#[test]
fn different_names_on_different_threads_do_not_clobber() {
    let dir = tempfile::tempdir().unwrap();
    let names = ["aia_171", "eit_195", "lasco_c2", "hmi_mag"];
    let files: Vec<_> = names
        .iter()
        .map(|n| write_file(dir.path(), n, n.as_bytes()))
        .collect();

    // One shared manager; each name has its own cached file.
    let storage = Arc::new(InMemStorage::new());
    for (name, (path, hash)) in names.iter().zip(&files) {
        storage
            .put(crate::storage::CacheEntry {
                logical_name: name.to_string(),
                file_path: path.clone(),
                source_url: format!("https://data.example.org/{name}"),
                hash: hash.clone(),
            })
            .unwrap();
    }
    let downloader = Arc::new(RecordingDownloader::new("/unused"));
    let manager = DataManager::new(downloader.clone(), storage);
    let barrier = Barrier::new(names.len());

    std::thread::scope(|s| {
        for (name, (path, hash)) in names.iter().zip(&files) {
            let manager = &manager;
            let barrier = &barrier;
            s.spawn(move || {
                let req = Requirement::new(*name, ["unused"], hash.clone());
                for _ in 0..20 {
                    let seen = manager
                        .with_requirement(&req, || {
                            barrier.wait();
                            manager.get(name).unwrap()
                        })
                        .unwrap();
                    assert_eq!(&seen, path);
                }
            });
        }
    });
    assert_eq!(downloader.times_called(), 0);
}

#[test]
fn same_name_cached_under_concurrent_resolve_calls() {
    let dir = tempfile::tempdir().unwrap();
    let (file, hash) = write_file(dir.path(), "cube.fits", b"cube");
    let downloader = Arc::new(
        RecordingDownloader::new(file).with_delay(Duration::from_millis(20)),
    );
    let storage = Arc::new(InMemStorage::new());
    let manager = DataManager::new(downloader.clone(), storage.clone());
    let req = Requirement::new("cube", ["url1"], hash);

    std::thread::scope(|s| {
        for _ in 0..16 {
            s.spawn(|| manager.resolve(&req).unwrap());
        }
    });
    assert_eq!(downloader.times_called(), 1);
    assert_eq!(storage.all().unwrap().len(), 1);
}
