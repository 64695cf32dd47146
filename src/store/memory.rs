//! In-memory [`Store`] implementation for tests.
//!
//! Items live in a `Vec` behind `std::sync::RwLock`; filters are
//! evaluated with [`Filter::matches`], which is the reference
//! semantics the SQLite translation must agree with. Internal ids are
//! assigned from a monotonic counter and `updated_at` never moves
//! backwards, so the `(updated_at, id)` total-order contract holds
//! even when many writes land in the same second.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::keywords;
use crate::models::{ContentItem, Cursor, NewContentItem, TagCount};
use crate::query::Filter;

use super::Store;

#[derive(Default)]
struct Inner {
    items: Vec<ContentItem>,
    next_id: i64,
    last_ts: i64,
}

/// In-memory store for unit and state-machine tests.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert with an explicit `updated_at`, for tests that need a
    /// controlled timeline. Clamped to never move the clock backwards.
    pub fn upsert_item_at(&self, item: &NewContentItem, updated_at: i64) -> i64 {
        let mut inner = self.inner.write().unwrap();
        let ts = updated_at.max(inner.last_ts);
        inner.last_ts = ts;
        upsert_locked(&mut inner, item, ts)
    }
}

fn upsert_locked(inner: &mut Inner, item: &NewContentItem, updated_at: i64) -> i64 {
    let (search_keywords, combinations) = keywords::derive(item);

    if let Some(existing) = inner
        .items
        .iter_mut()
        .find(|e| e.external_id == item.external_id)
    {
        existing.title = item.title.clone();
        existing.author = item.author.clone();
        existing.price = item.price;
        existing.tags = item.tags.clone();
        existing.description = item.description.clone();
        existing.thumbnail_url = item.thumbnail_url.clone();
        existing.sample_image_urls = item.sample_image_urls.clone();
        existing.product_url = item.product_url.clone();
        existing.preview_url = item.preview_url.clone();
        existing.rating = item.rating;
        existing.popularity = item.popularity;
        existing.search_keywords = search_keywords;
        existing.combinations = combinations;
        existing.updated_at = updated_at;
        return existing.id;
    }

    inner.next_id += 1;
    let id = inner.next_id;
    inner.items.push(ContentItem {
        id,
        external_id: item.external_id.clone(),
        title: item.title.clone(),
        author: item.author.clone(),
        price: item.price,
        tags: item.tags.clone(),
        description: item.description.clone(),
        thumbnail_url: item.thumbnail_url.clone(),
        sample_image_urls: item.sample_image_urls.clone(),
        product_url: item.product_url.clone(),
        preview_url: item.preview_url.clone(),
        rating: item.rating,
        popularity: item.popularity,
        search_keywords,
        combinations,
        created_at: updated_at,
        updated_at,
    });
    id
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_item(&self, item: &NewContentItem) -> Result<i64> {
        let mut inner = self.inner.write().unwrap();
        let ts = chrono::Utc::now().timestamp().max(inner.last_ts);
        inner.last_ts = ts;
        Ok(upsert_locked(&mut inner, item, ts))
    }

    async fn get_item(&self, external_id: &str) -> Result<Option<ContentItem>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .items
            .iter()
            .find(|e| e.external_id == external_id)
            .cloned())
    }

    async fn query_items(
        &self,
        filter: &Filter,
        after: Option<&Cursor>,
        limit: i64,
    ) -> Result<Vec<ContentItem>> {
        let inner = self.inner.read().unwrap();
        let mut rows: Vec<ContentItem> = inner
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .filter(|item| match after {
                Some(c) => {
                    item.updated_at < c.last_updated_at
                        || (item.updated_at == c.last_updated_at && item.id < c.last_id)
                }
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by_key(|item| (Reverse(item.updated_at), Reverse(item.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn tag_counts(&self, limit: i64) -> Result<Vec<TagCount>> {
        let inner = self.inner.read().unwrap();
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for item in &inner.items {
            for tag in &item.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        let mut out: Vec<TagCount> = counts
            .into_iter()
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(&b.tag)));
        out.truncate(limit.max(0) as usize);
        Ok(out)
    }

    async fn count_items(&self) -> Result<i64> {
        let inner = self.inner.read().unwrap();
        Ok(inner.items.len() as i64)
    }
}
