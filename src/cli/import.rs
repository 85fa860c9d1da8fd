use crate::core::config::AppConfig;
use crate::core::ledger::load_postings_csv;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Replaces the stored posting set with the contents of a CSV export.
pub fn run(config: &AppConfig, file: &Path) -> Result<()> {
    let postings = load_postings_csv(file)?;
    let stores = super::open_stores(config)?;
    let count = stores.postings.replace_all(&postings)?;

    info!(file = %file.display(), count, "Imported postings");
    println!("Imported {count} postings from {}", file.display());
    Ok(())
}
