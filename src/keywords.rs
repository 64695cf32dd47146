//! Write-time denormalized keyword derivation.
//!
//! Every upsert recomputes two derived fields on the item before the
//! write: a lowercase keyword set (title tokens, author, tags) and a
//! combination set (author×tag and sorted tag-pair combinations).
//! Both are pure functions of the item's mutable fields, so repeated
//! derivation is deterministic and an update can never leave stale
//! keywords behind.

use std::collections::BTreeSet;

use crate::models::NewContentItem;

/// Lowercase keyword set: title split on whitespace, plus the author,
/// plus each tag. Duplicates collapse; output is sorted for stable
/// storage.
pub fn derive_keywords(title: &str, author: &str, tags: &[String]) -> Vec<String> {
    let mut set: BTreeSet<String> = title
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();
    if !author.is_empty() {
        set.insert(author.to_lowercase());
    }
    for tag in tags {
        if !tag.is_empty() {
            set.insert(tag.to_lowercase());
        }
    }
    set.into_iter().collect()
}

/// Combination set: `(author, tag)` for every tag, plus every unordered
/// pair of distinct tags as a lexicographically sorted pair, so `(a, b)`
/// and `(b, a)` collapse to one entry regardless of input order.
///
/// Empty `tags` yields an empty set, not an error.
pub fn derive_combinations(author: &str, tags: &[String]) -> Vec<(String, String)> {
    let mut set: BTreeSet<(String, String)> = BTreeSet::new();

    for tag in tags {
        if tag.is_empty() {
            continue;
        }
        if !author.is_empty() {
            set.insert((author.to_string(), tag.clone()));
        }
    }

    let mut sorted: Vec<&String> = tags.iter().filter(|t| !t.is_empty()).collect();
    sorted.sort();
    sorted.dedup();
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            set.insert(((*a).clone(), (*b).clone()));
        }
    }

    set.into_iter().collect()
}

/// Derive both fields for an incoming item.
pub fn derive(item: &NewContentItem) -> (Vec<String>, Vec<(String, String)>) {
    (
        derive_keywords(&item.title, &item.author, &item.tags),
        derive_combinations(&item.author, &item.tags),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keywords_lowercase_and_dedup() {
        let kw = derive_keywords("Wild Dog Dog", "Tarou", &tags(&["Comedy", "dog"]));
        assert_eq!(kw, vec!["comedy", "dog", "tarou", "wild"]);
    }

    #[test]
    fn keywords_missing_author_and_tags_still_valid() {
        let kw = derive_keywords("Solo Title", "", &[]);
        assert_eq!(kw, vec!["solo", "title"]);
    }

    #[test]
    fn combinations_symmetric_under_tag_order() {
        let a = derive_combinations("tarou", &tags(&["comedy", "action", "drama"]));
        let b = derive_combinations("tarou", &tags(&["drama", "comedy", "action"]));
        assert_eq!(a, b);
    }

    #[test]
    fn combinations_pairs_are_sorted() {
        let combos = derive_combinations("", &tags(&["zeta", "alpha"]));
        assert_eq!(combos, vec![("alpha".to_string(), "zeta".to_string())]);
    }

    #[test]
    fn combinations_include_author_tag_pairs() {
        let combos = derive_combinations("tarou", &tags(&["comedy"]));
        assert_eq!(combos, vec![("tarou".to_string(), "comedy".to_string())]);
    }

    #[test]
    fn empty_tags_yield_empty_combinations() {
        assert!(derive_combinations("tarou", &[]).is_empty());
    }
}
