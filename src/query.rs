//! Request → filter construction.
//!
//! Turns a free-text query and/or a genre selection into a structured
//! [`Filter`] that any [`Store`](crate::store::Store) backend can
//! execute: the in-memory store evaluates it as a Rust predicate, the
//! SQLite store translates it to SQL. No store access happens here.
//!
//! Keyword search is "match any token": all per-term predicates are
//! OR'ed, and each term is a case-insensitive substring match against
//! title, author, and every tag.

use crate::models::ContentItem;

/// How a multi-genre selection combines.
///
/// The two modes deliberately differ: a plain genre browse with several
/// genres returns items carrying *any* of them, while a combined
/// keyword+genre search requires *all* of them. The asymmetry matches
/// the two call sites' shipped behavior and is kept explicit so neither
/// can drift silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreMode {
    /// Item must carry at least one of the selected genres.
    Any,
    /// Item must carry every selected genre.
    All,
}

/// Exact-membership pre-filter used to bound a recommendation pool:
/// an item qualifies if any of its tags is in `genres`, any of its
/// tags is in `tags`, or its author is in `authors` (OR across the
/// three clauses).
#[derive(Debug, Clone, Default)]
pub struct AnyOf {
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub authors: Vec<String>,
}

impl AnyOf {
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty() && self.tags.is_empty() && self.authors.is_empty()
    }
}

/// A structured query filter. All present clauses are AND'ed together;
/// the pagination boundary is applied separately by the store.
#[derive(Debug, Clone)]
pub struct Filter {
    /// OR'd case-insensitive substring terms (already lowercased).
    pub terms: Vec<String>,
    /// Selected genres, matched exactly against item tags.
    pub genres: Vec<String>,
    pub genre_mode: GenreMode,
    /// Recommendation pool pre-filter, OR'd internally.
    pub any_of: Option<AnyOf>,
    /// External ids excluded from the result set.
    pub exclude_ids: Vec<String>,
}

impl Filter {
    /// A filter matching the whole collection.
    pub fn all() -> Self {
        Self {
            terms: Vec::new(),
            genres: Vec::new(),
            genre_mode: GenreMode::Any,
            any_of: None,
            exclude_ids: Vec::new(),
        }
    }

    /// Evaluate the filter against one item. This is the reference
    /// semantics; the SQLite translation must agree with it.
    pub fn matches(&self, item: &ContentItem) -> bool {
        if self.exclude_ids.iter().any(|id| *id == item.external_id) {
            return false;
        }

        if !self.terms.is_empty() {
            let title = item.title.to_lowercase();
            let author = item.author.to_lowercase();
            let tags: Vec<String> = item.tags.iter().map(|t| t.to_lowercase()).collect();
            let hit = self.terms.iter().any(|term| {
                title.contains(term)
                    || author.contains(term)
                    || tags.iter().any(|t| t.contains(term))
            });
            if !hit {
                return false;
            }
        }

        if !self.genres.is_empty() {
            let ok = match self.genre_mode {
                GenreMode::Any => self.genres.iter().any(|g| item.tags.contains(g)),
                GenreMode::All => self.genres.iter().all(|g| item.tags.contains(g)),
            };
            if !ok {
                return false;
            }
        }

        if let Some(any_of) = &self.any_of {
            if !any_of.is_empty() {
                let hit = item.tags.iter().any(|t| any_of.genres.contains(t))
                    || item.tags.iter().any(|t| any_of.tags.contains(t))
                    || any_of.authors.contains(&item.author);
                if !hit {
                    return false;
                }
            }
        }

        true
    }
}

/// Split a raw query into candidate search terms.
///
/// A query containing `+` splits on `+` (the upstream "site+work"
/// format); otherwise it splits on whitespace. Tokens shorter than two
/// characters are dropped from the expansion, but the full original
/// query is always kept as one extra verbatim term so a multi-word
/// exact phrase is still tried even when its tokens would only match
/// individually. All terms are lowercased.
pub fn extract_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = if query.contains('+') {
        query
            .split('+')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    } else {
        query.split_whitespace().map(str::to_lowercase).collect()
    };

    terms.retain(|t| t.chars().count() >= 2);

    let full = query.to_lowercase();
    if !full.is_empty() && !terms.contains(&full) {
        terms.push(full);
    }
    terms
}

/// Build the filter for a search, browse, or combined request.
///
/// `query` contributes OR'd substring terms; `genres` contributes the
/// genre clause under the given mode. Both absent means "whole
/// collection" (the default listing).
pub fn build_filter(query: Option<&str>, genres: &[String], mode: GenreMode) -> Filter {
    let terms = match query {
        Some(q) if !q.trim().is_empty() => extract_terms(q),
        _ => Vec::new(),
    };
    Filter {
        terms,
        genres: genres.to_vec(),
        genre_mode: mode,
        any_of: None,
        exclude_ids: Vec::new(),
    }
}
