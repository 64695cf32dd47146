//! SQLite-backed [`Store`] implementation.
//!
//! Items live in a single `items` table with the tag and keyword sets
//! stored as JSON arrays, queried through `json_each`. Filter
//! translation must agree with [`Filter::matches`], the reference
//! semantics used by the in-memory store.
//!
//! Case-insensitive term matching runs against Rust-lowercased shadow
//! columns (`title_norm`, `author_norm`, `tags_norm`) written at upsert
//! time. SQLite's `lower()` folds ASCII only, so folding in SQL would
//! leave non-ASCII cased text unmatched.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::keywords;
use crate::models::{ContentItem, Cursor, NewContentItem, TagCount};
use crate::query::{Filter, GenreMode};

use super::Store;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Escape LIKE metacharacters so user terms match literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn row_to_item(row: &SqliteRow) -> Result<ContentItem> {
    let tags_json: String = row.try_get("tags")?;
    let images_json: String = row.try_get("sample_image_urls")?;
    let keywords_json: String = row.try_get("search_keywords")?;
    let combos_json: String = row.try_get("combinations")?;

    Ok(ContentItem {
        id: row.try_get("id")?,
        external_id: row.try_get("external_id")?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        price: row.try_get("price")?,
        tags: serde_json::from_str(&tags_json).context("malformed tags column")?,
        description: row.try_get("description")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        sample_image_urls: serde_json::from_str(&images_json)
            .context("malformed sample_image_urls column")?,
        product_url: row.try_get("product_url")?,
        preview_url: row.try_get("preview_url")?,
        rating: row.try_get("rating")?,
        popularity: row.try_get("popularity")?,
        search_keywords: serde_json::from_str(&keywords_json)
            .context("malformed search_keywords column")?,
        combinations: serde_json::from_str(&combos_json)
            .context("malformed combinations column")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Append the WHERE clauses for `filter` and `after` to a query that
/// already ends in `WHERE 1=1`.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter, after: Option<&Cursor>) {
    if !filter.terms.is_empty() {
        qb.push(" AND (");
        for (i, term) in filter.terms.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            let pattern = like_pattern(term);
            qb.push("(title_norm LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR author_norm LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(
                " ESCAPE '\\' OR EXISTS (SELECT 1 FROM json_each(items.tags_norm) je \
                 WHERE je.value LIKE ",
            );
            qb.push_bind(pattern);
            qb.push(" ESCAPE '\\'))");
        }
        qb.push(")");
    }

    if !filter.genres.is_empty() {
        match filter.genre_mode {
            GenreMode::Any => {
                qb.push(" AND EXISTS (SELECT 1 FROM json_each(items.tags) je WHERE je.value IN (");
                let mut sep = qb.separated(", ");
                for genre in &filter.genres {
                    sep.push_bind(genre.clone());
                }
                sep.push_unseparated("))");
            }
            GenreMode::All => {
                for genre in &filter.genres {
                    qb.push(
                        " AND EXISTS (SELECT 1 FROM json_each(items.tags) je WHERE je.value = ",
                    );
                    qb.push_bind(genre.clone());
                    qb.push(")");
                }
            }
        }
    }

    if let Some(any_of) = &filter.any_of {
        if !any_of.is_empty() {
            qb.push(" AND (0=1");
            for pool in [&any_of.genres, &any_of.tags] {
                if !pool.is_empty() {
                    qb.push(
                        " OR EXISTS (SELECT 1 FROM json_each(items.tags) je WHERE je.value IN (",
                    );
                    let mut sep = qb.separated(", ");
                    for value in pool {
                        sep.push_bind(value.clone());
                    }
                    sep.push_unseparated("))");
                }
            }
            if !any_of.authors.is_empty() {
                qb.push(" OR author IN (");
                let mut sep = qb.separated(", ");
                for author in &any_of.authors {
                    sep.push_bind(author.clone());
                }
                sep.push_unseparated(")");
            }
            qb.push(")");
        }
    }

    if !filter.exclude_ids.is_empty() {
        qb.push(" AND external_id NOT IN (");
        let mut sep = qb.separated(", ");
        for id in &filter.exclude_ids {
            sep.push_bind(id.clone());
        }
        sep.push_unseparated(")");
    }

    if let Some(cursor) = after {
        qb.push(" AND (updated_at < ");
        qb.push_bind(cursor.last_updated_at);
        qb.push(" OR (updated_at = ");
        qb.push_bind(cursor.last_updated_at);
        qb.push(" AND id < ");
        qb.push_bind(cursor.last_id);
        qb.push("))");
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_item(&self, item: &NewContentItem) -> Result<i64> {
        let (search_keywords, combinations) = keywords::derive(item);
        let tags_norm: Vec<String> = item.tags.iter().map(|t| t.to_lowercase()).collect();
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO items (external_id, title, author, price, tags, description,
                               thumbnail_url, sample_image_urls, product_url, preview_url,
                               rating, popularity, search_keywords, combinations,
                               title_norm, author_norm, tags_norm,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                price = excluded.price,
                tags = excluded.tags,
                description = excluded.description,
                thumbnail_url = excluded.thumbnail_url,
                sample_image_urls = excluded.sample_image_urls,
                product_url = excluded.product_url,
                preview_url = excluded.preview_url,
                rating = excluded.rating,
                popularity = excluded.popularity,
                search_keywords = excluded.search_keywords,
                combinations = excluded.combinations,
                title_norm = excluded.title_norm,
                author_norm = excluded.author_norm,
                tags_norm = excluded.tags_norm,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&item.external_id)
        .bind(&item.title)
        .bind(&item.author)
        .bind(item.price)
        .bind(serde_json::to_string(&item.tags)?)
        .bind(&item.description)
        .bind(&item.thumbnail_url)
        .bind(serde_json::to_string(&item.sample_image_urls)?)
        .bind(&item.product_url)
        .bind(&item.preview_url)
        .bind(item.rating)
        .bind(item.popularity)
        .bind(serde_json::to_string(&search_keywords)?)
        .bind(serde_json::to_string(&combinations)?)
        .bind(item.title.to_lowercase())
        .bind(item.author.to_lowercase())
        .bind(serde_json::to_string(&tags_norm)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM items WHERE external_id = ?")
            .bind(&item.external_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn get_item(&self, external_id: &str) -> Result<Option<ContentItem>> {
        let row = sqlx::query("SELECT * FROM items WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_item).transpose()
    }

    async fn query_items(
        &self,
        filter: &Filter,
        after: Option<&Cursor>,
        limit: i64,
    ) -> Result<Vec<ContentItem>> {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new("SELECT * FROM items WHERE 1=1");
        push_filter(&mut qb, filter, after);
        qb.push(" ORDER BY updated_at DESC, id DESC LIMIT ");
        qb.push_bind(limit.max(0));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_item).collect()
    }

    async fn tag_counts(&self, limit: i64) -> Result<Vec<TagCount>> {
        let rows = sqlx::query(
            r#"
            SELECT je.value AS tag, COUNT(*) AS count
            FROM items, json_each(items.tags) je
            GROUP BY je.value
            ORDER BY count DESC, tag ASC
            LIMIT ?
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TagCount {
                    tag: row.try_get("tag")?,
                    count: row.try_get("count")?,
                })
            })
            .collect()
    }

    async fn count_items(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DbConfig, PagingConfig, ServerConfig};
    use crate::query::build_filter;
    use crate::store::memory::InMemoryStore;

    fn new_item(external_id: &str, title: &str, author: &str, tags: &[&str]) -> NewContentItem {
        NewContentItem {
            external_id: external_id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            price: 0,
            tags: tags.iter().map(|s| s.to_string()).collect(),
            description: String::new(),
            thumbnail_url: String::new(),
            sample_image_urls: Vec::new(),
            product_url: String::new(),
            preview_url: String::new(),
            rating: None,
            popularity: None,
        }
    }

    async fn open_store(tmp: &tempfile::TempDir) -> SqliteStore {
        let config = Config {
            db: DbConfig {
                path: tmp.path().join("catalog.db"),
            },
            paging: PagingConfig::default(),
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
            },
        };
        crate::migrate::run_migrations(&config).await.unwrap();
        let pool = crate::db::connect(&config).await.unwrap();
        SqliteStore::new(pool)
    }

    #[test]
    fn like_patterns_escape_metacharacters() {
        assert_eq!(like_pattern("dog"), "%dog%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[tokio::test]
    async fn unicode_terms_fold_like_the_reference_semantics() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        let memory = InMemoryStore::new();

        // Cased non-ASCII text in every searched field. SQLite's own
        // lower() would leave all three unmatched.
        let item = new_item("a", "CAFÉ STORY", "ÅSA", &["KOMÖDIE"]);
        store.upsert_item(&item).await.unwrap();
        memory.upsert_item(&item).await.unwrap();

        for term in ["café", "åsa", "komödie"] {
            let filter = build_filter(Some(term), &[], GenreMode::Any);
            let sql = store.query_items(&filter, None, 10).await.unwrap();
            let mem = memory.query_items(&filter, None, 10).await.unwrap();
            assert_eq!(sql.len(), 1, "term={term}");
            assert_eq!(sql.len(), mem.len(), "term={term}");
        }
    }

    #[tokio::test]
    async fn upsert_refreshes_the_normalized_columns() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = open_store(&tmp).await;

        store
            .upsert_item(&new_item("a", "OLD TITLE", "x", &["ÉTÉ"]))
            .await
            .unwrap();
        store
            .upsert_item(&new_item("a", "NEW TITLE", "x", &["HIVER"]))
            .await
            .unwrap();
        assert_eq!(store.count_items().await.unwrap(), 1);

        for (term, expected) in [("new", 1), ("hiver", 1), ("old title", 0), ("été", 0)] {
            let filter = build_filter(Some(term), &[], GenreMode::Any);
            let rows = store.query_items(&filter, None, 10).await.unwrap();
            assert_eq!(rows.len(), expected, "term={term}");
        }
    }
}
