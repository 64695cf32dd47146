use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create items table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT '',
            price INTEGER NOT NULL DEFAULT 0,
            tags TEXT NOT NULL DEFAULT '[]',
            description TEXT NOT NULL DEFAULT '',
            thumbnail_url TEXT NOT NULL DEFAULT '',
            sample_image_urls TEXT NOT NULL DEFAULT '[]',
            product_url TEXT NOT NULL DEFAULT '',
            preview_url TEXT NOT NULL DEFAULT '',
            rating REAL,
            popularity REAL,
            search_keywords TEXT NOT NULL DEFAULT '[]',
            combinations TEXT NOT NULL DEFAULT '[]',
            title_norm TEXT NOT NULL DEFAULT '',
            author_norm TEXT NOT NULL DEFAULT '',
            tags_norm TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    // The composite index backs the canonical keyset order.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_items_updated_at_id ON items(updated_at DESC, id DESC)",
    )
    .execute(&pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_author ON items(author)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
