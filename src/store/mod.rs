//! Storage abstraction for Hondana.
//!
//! The [`Store`] trait defines the collection operations the query,
//! pagination, and ranking engine needs, enabling pluggable backends
//! (SQLite for the process, in-memory for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes,
//! and must uphold two contracts the read path depends on:
//!
//! - `upsert_item` is keyed by `external_id` with last-write-wins
//!   semantics and refreshes `updated_at` on every write, so
//!   `(updated_at, id)` stays a strict total order.
//! - `query_items` returns rows in `(updated_at desc, id desc)` order
//!   with the keyset boundary
//!   `updated_at < last OR (updated_at == last AND id < last_id)`
//!   applied when a cursor is given.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`upsert_item`](Store::upsert_item) | Insert or update by `external_id` |
//! | [`get_item`](Store::get_item) | Lookup by `external_id` |
//! | [`query_items`](Store::query_items) | Filtered, cursor-bounded, ordered fetch |
//! | [`tag_counts`](Store::tag_counts) | Tag aggregation for the genre list |
//! | [`count_items`](Store::count_items) | Collection size |

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ContentItem, Cursor, NewContentItem, TagCount};
use crate::query::Filter;

/// Abstract storage backend.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or update an item, keyed by `external_id`.
    ///
    /// Recomputes the derived keyword fields, refreshes `updated_at`,
    /// and returns the store-assigned internal id.
    async fn upsert_item(&self, item: &NewContentItem) -> Result<i64>;

    /// Retrieve an item by its external id.
    async fn get_item(&self, external_id: &str) -> Result<Option<ContentItem>>;

    /// Fetch up to `limit` items matching `filter`, strictly after
    /// `after` in the canonical `(updated_at desc, id desc)` order.
    async fn query_items(
        &self,
        filter: &Filter,
        after: Option<&Cursor>,
        limit: i64,
    ) -> Result<Vec<ContentItem>>;

    /// Tags with their item counts, most frequent first.
    async fn tag_counts(&self, limit: i64) -> Result<Vec<TagCount>>;

    /// Total number of items in the collection.
    async fn count_items(&self) -> Result<i64>;
}
