//! `datamgr list` – show cached entries.

use anyhow::Result;
use datamgr_core::SqliteStorage;

pub fn run_list(storage: &SqliteStorage, json: bool) -> Result<()> {
    let records = storage.records()?;
    if json {
        let entries: Vec<_> = records.iter().map(|r| &r.entry).collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No cached data files.");
        return Ok(());
    }
    println!("{:<24} {:<12} {:<14} {}", "NAME", "UPDATED", "HASH", "PATH");
    for r in records {
        let short_hash = r.entry.hash.get(..12).unwrap_or(&r.entry.hash);
        println!(
            "{:<24} {:<12} {:<14} {}",
            r.entry.logical_name,
            r.updated_at,
            short_hash,
            r.entry.file_path.display()
        );
    }
    Ok(())
}
