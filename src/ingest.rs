//! Catalog ingestion.
//!
//! Reads a JSON array of catalog entries and upserts each into the
//! store, keyed by `external_id`. Re-importing the same file is
//! harmless; existing items are refreshed in place and their derived
//! keyword fields recomputed.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::db;
use crate::models::NewContentItem;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

pub async fn run_import(
    config: &Config,
    file: &Path,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let mut entries: Vec<NewContentItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse import file: {}", file.display()))?;

    if let Some(lim) = limit {
        entries.truncate(lim);
    }

    if dry_run {
        println!("import {} (dry-run)", file.display());
        println!("  entries found: {}", entries.len());
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool);

    let mut upserted = 0u64;
    for entry in &entries {
        store
            .upsert_item(entry)
            .await
            .with_context(|| format!("Failed to upsert item '{}'", entry.external_id))?;
        upserted += 1;
    }

    let total = store.count_items().await?;

    println!("import {}", file.display());
    println!("  items upserted: {}", upserted);
    println!("  items in catalog: {}", total);

    Ok(())
}
