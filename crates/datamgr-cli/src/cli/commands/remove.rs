//! `datamgr remove <name>` – forget an entry; optionally delete its file.

use anyhow::Result;
use datamgr_core::{SqliteStorage, Storage};

pub fn run_remove(storage: &SqliteStorage, name: &str, delete_file: bool) -> Result<()> {
    let entry = storage.get(name)?;
    if delete_file {
        if let Some(ref e) = entry {
            match std::fs::remove_file(&e.file_path) {
                Ok(()) => tracing::debug!(path = %e.file_path.display(), "deleted file"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(path = %e.file_path.display(), "could not delete file: {}", err)
                }
            }
        }
    }

    if storage.remove(name)? {
        println!("Removed {name}");
    } else {
        println!("No cached data file named {name}");
    }
    Ok(())
}
