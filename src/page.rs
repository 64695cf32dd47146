//! Keyset paginator.
//!
//! Walks a filtered listing in the canonical `(updated_at desc,
//! id desc)` order using a stable cursor instead of an offset. The
//! boundary predicate `updated_at < last OR (updated_at == last AND
//! id < last_id)` makes forward iteration exactly-once even while the
//! ingestion job inserts items with fresh `updated_at` ahead of the
//! cursor: new inserts sort before the cursor and never duplicate or
//! skip items behind it.
//!
//! Backward navigation is not a server primitive — clients reconstruct
//! prior pages from a history of previously issued cursors
//! ([`crate::feed`]); the server only ever walks forward.

use anyhow::Result;

use crate::models::{ContentItem, Cursor, Page};
use crate::query::Filter;
use crate::store::Store;

/// Fetch one page past `cursor`.
///
/// Queries the store for `limit + 1` rows; a full over-fetch means
/// `has_more`, and the page is trimmed back to `limit` with
/// `next_cursor` taken from the last item of the trimmed page. Zero
/// matches is a normal empty page, never an error.
pub async fn fetch_page<S: Store + ?Sized>(
    store: &S,
    filter: &Filter,
    cursor: Option<Cursor>,
    limit: i64,
) -> Result<Page<ContentItem>> {
    let limit = limit.max(1);
    let rows = store
        .query_items(filter, cursor.as_ref(), limit + 1)
        .await?;
    Ok(Page::from_overfetch(rows, limit, Cursor::after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewContentItem;
    use crate::store::memory::InMemoryStore;

    fn new_item(n: i64) -> NewContentItem {
        NewContentItem {
            external_id: format!("ext-{n:03}"),
            title: format!("Item {n}"),
            author: "author".to_string(),
            price: 0,
            tags: Vec::new(),
            description: String::new(),
            thumbnail_url: String::new(),
            sample_image_urls: Vec::new(),
            product_url: String::new(),
            preview_url: String::new(),
            rating: None,
            popularity: None,
        }
    }

    fn seeded(n: i64) -> InMemoryStore {
        let store = InMemoryStore::new();
        for i in 1..=n {
            // Half the items share a timestamp so the id tie-break is
            // exercised, not just the timestamp ordering.
            store.upsert_item_at(&new_item(i), 1000 + i / 2);
        }
        store
    }

    #[tokio::test]
    async fn twenty_five_items_two_pages() {
        let store = seeded(25);
        let filter = Filter::all();

        let first = fetch_page(&store, &filter, None, 20).await.unwrap();
        assert_eq!(first.data.len(), 20);
        assert!(first.has_more);
        let cursor = first.next_cursor.expect("cursor on a non-final page");
        assert_eq!(cursor, Cursor::after(&first.data[19]));

        let second = fetch_page(&store, &filter, Some(cursor), 20).await.unwrap();
        assert_eq!(second.data.len(), 5);
        assert!(!second.has_more);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn traversal_is_exactly_once_for_any_page_size() {
        let store = seeded(23);
        let filter = Filter::all();

        for page_size in [1_i64, 2, 5, 7, 23, 50] {
            let mut seen: Vec<i64> = Vec::new();
            let mut cursor = None;
            loop {
                let page = fetch_page(&store, &filter, cursor, page_size).await.unwrap();
                seen.extend(page.data.iter().map(|i| i.id));
                if !page.has_more {
                    assert!(page.next_cursor.is_none());
                    break;
                }
                cursor = page.next_cursor;
            }
            // Timestamps ascend with the ids here, so the canonical
            // (updated_at desc, id desc) order is exactly id 23..=1,
            // with the id tie-break deciding inside each shared
            // timestamp.
            let expected: Vec<i64> = (1..=23).rev().collect();
            assert_eq!(seen, expected, "page_size={page_size}");
        }
    }

    #[tokio::test]
    async fn insertion_ahead_of_cursor_does_not_disturb_traversal() {
        let store = seeded(10);
        let filter = Filter::all();

        let first = fetch_page(&store, &filter, None, 4).await.unwrap();
        let cursor = first.next_cursor.unwrap();
        let already_seen: Vec<String> =
            first.data.iter().map(|i| i.external_id.clone()).collect();

        // Fresh insert sorts ahead of the cursor.
        store.upsert_item_at(&new_item(99), 9999);

        let mut rest: Vec<String> = Vec::new();
        let mut cursor = Some(cursor);
        while let Some(c) = cursor {
            let page = fetch_page(&store, &filter, Some(c), 4).await.unwrap();
            rest.extend(page.data.iter().map(|i| i.external_id.clone()));
            cursor = page.next_cursor;
        }

        // Nothing behind the cursor is skipped or repeated, and the
        // new item never appears behind it.
        assert_eq!(rest.len(), 6);
        assert!(!rest.iter().any(|id| already_seen.contains(id)));
        assert!(!rest.contains(&"ext-099".to_string()));
    }

    #[tokio::test]
    async fn zero_matches_is_an_empty_page() {
        let store = seeded(3);
        let filter = crate::query::build_filter(
            Some("no such thing"),
            &[],
            crate::query::GenreMode::Any,
        );
        let page = fetch_page(&store, &filter, None, 20).await.unwrap();
        assert!(page.data.is_empty());
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }
}
