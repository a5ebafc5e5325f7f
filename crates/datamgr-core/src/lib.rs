//! datamgr core: guarantee that named data files are downloaded, verified by
//! SHA-256 and cached locally before the code that needs them runs.

pub mod checksum;
pub mod config;
pub mod downloader;
pub mod logging;
pub mod manager;
pub mod storage;
pub mod url_model;

pub use downloader::{CurlDownloader, DownloadError, Downloader, RecordingDownloader};
pub use manager::{ContextError, DataManager, ManagerError, Requirement, Required};
pub use storage::{CacheEntry, InMemStorage, SqliteStorage, Storage};
