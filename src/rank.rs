//! "More like this" relevance ranking.
//!
//! Given seed tags/authors/genres from an item the user is viewing,
//! scores a bounded candidate pool and serves score-ranked pages with
//! the same cursor mechanism as every other listing.
//!
//! The cursor only carries `(updated_at, id)` — the score is an
//! implicit leading sort key that is *not* encoded in it. A ranked
//! page sequence is therefore only stable while the scores of
//! not-yet-seen candidates don't change between fetches. That is an
//! accepted approximation, not a correctness guarantee; the
//! exactly-once contract of [`crate::page`] applies to the underlying
//! candidate order, not to the score order.

use anyhow::Result;

use crate::models::{ContentItem, Cursor, Page};
use crate::query::{AnyOf, Filter, GenreMode};
use crate::store::Store;

/// Seed material for a recommendation request.
///
/// Genres are tags here — the genre list shown in the UI is built from
/// tag counts — so the genre component scores against the item's tags,
/// independently of the per-tag overlap component which uses `tags`.
#[derive(Debug, Clone, Default)]
pub struct RecommendRequest {
    pub seed_genres: Vec<String>,
    pub seed_tags: Vec<String>,
    pub seed_authors: Vec<String>,
    /// External ids never returned (typically the seed item itself and
    /// anything already shown).
    pub exclude_ids: Vec<String>,
}

/// Composite relevance score.
///
/// `5` for a genre hit, `2` per overlapping tag, `3` for an author
/// hit, plus `0.5 × rating` and `0.3 × popularity`; absent rating or
/// popularity contribute zero rather than poisoning the sum.
pub fn score(item: &ContentItem, req: &RecommendRequest) -> f64 {
    let genre_hit = item.tags.iter().any(|t| req.seed_genres.contains(t));
    let tag_overlap = item
        .tags
        .iter()
        .filter(|t| req.seed_tags.contains(*t))
        .count();
    let author_hit = req.seed_authors.contains(&item.author);

    (if genre_hit { 5.0 } else { 0.0 })
        + 2.0 * tag_overlap as f64
        + (if author_hit { 3.0 } else { 0.0 })
        + 0.5 * item.rating.unwrap_or(0.0)
        + 0.3 * item.popularity.unwrap_or(0.0)
}

/// Fetch one ranked page of recommendations.
///
/// The candidate pool is pre-filtered in the store (any seed genre or
/// tag among the item's tags, or a seed author match — the same OR
/// semantics as a plain genre browse), bounded by `candidate_k`, and
/// keyset-bounded by `cursor` *before* scoring. Candidates are then
/// scored in process and ordered by score descending, falling back to
/// the canonical `(updated_at desc, id desc)` order on ties, so the
/// page trim and `next_cursor` computation are identical to every
/// other listing.
///
/// An empty request skips the pre-filter entirely: the pool is the
/// whole catalog and the score reduces to rating and popularity.
pub async fn recommend<S: Store + ?Sized>(
    store: &S,
    req: &RecommendRequest,
    cursor: Option<Cursor>,
    limit: i64,
    candidate_k: i64,
) -> Result<Page<ContentItem>> {
    let limit = limit.max(1);

    let any_of = AnyOf {
        genres: req.seed_genres.clone(),
        tags: req.seed_tags.clone(),
        authors: req.seed_authors.clone(),
    };
    let filter = Filter {
        terms: Vec::new(),
        genres: Vec::new(),
        genre_mode: GenreMode::Any,
        any_of: if any_of.is_empty() {
            None
        } else {
            Some(any_of)
        },
        exclude_ids: req.exclude_ids.clone(),
    };

    let pool_size = candidate_k.max(limit + 1);
    let mut candidates = store
        .query_items(&filter, cursor.as_ref(), pool_size)
        .await?;

    candidates.sort_by(|a, b| {
        score(b, req)
            .partial_cmp(&score(a, req))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.updated_at.cmp(&a.updated_at))
            .then(b.id.cmp(&a.id))
    });

    Ok(Page::from_overfetch(candidates, limit, Cursor::after))
}
