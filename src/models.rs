//! Core data models used throughout Hondana.
//!
//! These types represent the catalog items, cursors, and result pages
//! that flow through the ingestion and query pipeline.

use serde::{Deserialize, Serialize};

/// A catalog entry as stored and served.
///
/// `external_id` is the stable identity across re-ingestion; `id` is
/// store-assigned and monotonic, used only for tie-breaking within the
/// canonical `(updated_at desc, id desc)` sort order. `updated_at` is
/// refreshed by the store on every write, so `(updated_at, id)` is a
/// strict total order over the collection.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub price: i64,
    pub tags: Vec<String>,
    pub description: String,
    pub thumbnail_url: String,
    pub sample_image_urls: Vec<String>,
    pub product_url: String,
    pub preview_url: String,
    pub rating: Option<f64>,
    pub popularity: Option<f64>,
    /// Derived at write time; read-only to the query layer.
    pub search_keywords: Vec<String>,
    /// Derived at write time; lexicographically sorted pairs.
    pub combinations: Vec<(String, String)>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A catalog entry as produced by the ingestion job, before the store
/// assigns `id`, timestamps, and the derived keyword fields.
///
/// Every field except `external_id` and `title` is defaultable — a
/// missing `author` or empty `tags` yields smaller but valid derived
/// sets, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContentItem {
    pub external_id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub sample_image_urls: Vec<String>,
    #[serde(default)]
    pub product_url: String,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

/// A keyset traversal position: "everything already seen, strictly
/// after this point in `(updated_at desc, id desc)` order."
///
/// Opaque to clients beyond round-tripping — see [`crate::cursor`] for
/// the wire encoding. Serializes as the encoded opaque string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub last_updated_at: i64,
    pub last_id: i64,
}

impl Cursor {
    /// The cursor pointing just past `item` in the canonical order.
    pub fn after(item: &ContentItem) -> Self {
        Self {
            last_updated_at: item.updated_at,
            last_id: item.id,
        }
    }
}

/// One page of a paginated listing.
///
/// Invariant: `next_cursor.is_some() == has_more`.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// An empty final page.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }

    /// Trim an over-fetched row set (`limit + 1` rows requested) down
    /// to `limit`, computing `has_more` and `next_cursor` from the
    /// last item of the trimmed page.
    pub fn from_overfetch(mut rows: Vec<T>, limit: i64, cursor_of: impl Fn(&T) -> Cursor) -> Self {
        let has_more = rows.len() as i64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        let next_cursor = if has_more {
            rows.last().map(&cursor_of)
        } else {
            None
        };
        Self {
            data: rows,
            next_cursor,
            has_more,
        }
    }
}

/// A tag with the number of items carrying it; feeds the genre list.
#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}
