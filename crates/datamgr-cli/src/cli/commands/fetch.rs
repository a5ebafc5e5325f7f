//! `datamgr fetch <name> --url <URL>... --hash <SHA256>`.

use anyhow::Result;
use datamgr_core::config::DatamgrConfig;
use datamgr_core::{CurlDownloader, DataManager, Requirement, SqliteStorage};
use std::sync::Arc;

/// Resolve one requirement into the durable cache and print its path.
pub fn run_fetch(
    storage: SqliteStorage,
    cfg: &DatamgrConfig,
    name: &str,
    urls: Vec<String>,
    hash: &str,
) -> Result<()> {
    let downloader = Arc::new(CurlDownloader::from_config(cfg)?);
    tracing::debug!(cache_dir = %downloader.cache_dir().display(), "fetch");
    let manager = DataManager::with_config(downloader, Arc::new(storage), &cfg.manager);

    let requirement = Requirement::new(name, urls, hash);
    let path = manager.resolve(&requirement)?;
    println!("{}", path.display());
    Ok(())
}
