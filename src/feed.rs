//! Client-side pagination state machine.
//!
//! Models the viewer that renders one item at a time with
//! forward/backward navigation over cursor-paginated fetches. The
//! machine is sans-IO: navigation calls return a [`FetchPlan`] when a
//! page fetch is required, the caller executes it against whatever
//! transport it has, and feeds the result back through
//! [`Feed::complete_fetch`].
//!
//! Invariants the machine enforces:
//!
//! - at most one fetch in flight — navigation while `Loading` is
//!   rejected as [`Nav::Busy`];
//! - a new query invalidates every in-flight fetch of the previous one
//!   via a generation counter (a stale response is discarded, never
//!   applied to a list that has moved on);
//! - a failed fetch rolls back to the pre-fetch state — the cursor
//!   history and `next_cursor` are never corrupted — with one
//!   automatic retry offered for the very first page of a query only;
//! - forward pages are de-duplicated by `external_id` against
//!   everything already shown this session, tolerating store-level
//!   near-duplicate upserts.
//!
//! Backward navigation re-fetches the page recorded on the cursor
//! history stack and lands on its *last* item, so a visual "previous"
//! ends up adjacent to where the user just was.

use std::collections::HashSet;

use crate::models::{ContentItem, Cursor, Page};

/// Which way the user is navigating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Externally observable machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading(Direction),
    Error,
}

/// A fetch the caller must execute: "fetch one page past `cursor`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    pub generation: u64,
    pub direction: Direction,
    pub cursor: Option<Cursor>,
}

/// Outcome of a navigation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    /// Moved within the loaded page; [`Feed::current`] has the item.
    Shown,
    /// A fetch is required; execute the plan and report back.
    Fetch(FetchPlan),
    /// Nothing beyond this edge of the collection.
    Edge,
    /// A fetch is already in flight; input ignored.
    Busy,
}

/// Outcome of [`Feed::complete_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was applied and the machine is `Idle` again.
    Applied,
    /// The response belonged to a superseded query or no fetch was
    /// pending; it was discarded without touching any state.
    Stale,
    /// First-page load failed; one automatic retry is offered.
    Retry(FetchPlan),
    /// The fetch failed; state rolled back and the machine is `Error`.
    Failed,
}

struct Inflight {
    plan: FetchPlan,
    /// Cursor popped off the history for a backward fetch, restored on
    /// failure.
    popped: Option<Option<Cursor>>,
    first_page: bool,
}

/// The pagination state machine for one logical "current query".
#[derive(Default)]
pub struct Feed {
    items: Vec<ContentItem>,
    index: usize,
    /// Cursor that produced the currently displayed page.
    current_cursor: Option<Cursor>,
    next_cursor: Option<Cursor>,
    has_more: bool,
    /// Cursors that produced each page before the current one.
    cursor_history: Vec<Option<Cursor>>,
    /// External ids shown this session, for forward-page dedup.
    seen: HashSet<String>,
    phase: Phase,
    generation: u64,
    inflight: Option<Inflight>,
    first_page_retried: bool,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Idle
    }
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The item currently shown, if any page is loaded.
    pub fn current(&self) -> Option<&ContentItem> {
        self.items.get(self.index)
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Begin a fresh query. Clears the displayed list, the cursor
    /// history, and the pending cursor — no stale cursor ever carries
    /// over between distinct queries — and returns the first-page
    /// fetch plan. Any response still in flight for the previous query
    /// will be discarded as stale.
    pub fn start_query(&mut self) -> FetchPlan {
        self.generation += 1;
        self.items.clear();
        self.index = 0;
        self.current_cursor = None;
        self.next_cursor = None;
        self.has_more = false;
        self.cursor_history.clear();
        self.seen.clear();
        self.first_page_retried = false;

        let plan = FetchPlan {
            generation: self.generation,
            direction: Direction::Forward,
            cursor: None,
        };
        self.phase = Phase::Loading(Direction::Forward);
        self.inflight = Some(Inflight {
            plan,
            popped: None,
            first_page: true,
        });
        plan
    }

    /// Navigate to the next item, fetching the next page when the
    /// current one is exhausted.
    pub fn advance(&mut self) -> Nav {
        if matches!(self.phase, Phase::Loading(_)) {
            return Nav::Busy;
        }
        if self.index + 1 < self.items.len() {
            self.index += 1;
            return Nav::Shown;
        }
        match (self.has_more, self.next_cursor) {
            (true, Some(cursor)) => {
                let plan = FetchPlan {
                    generation: self.generation,
                    direction: Direction::Forward,
                    cursor: Some(cursor),
                };
                self.phase = Phase::Loading(Direction::Forward);
                self.inflight = Some(Inflight {
                    plan,
                    popped: None,
                    first_page: false,
                });
                Nav::Fetch(plan)
            }
            _ => Nav::Edge,
        }
    }

    /// Navigate to the previous item, re-fetching the prior page from
    /// the cursor history when the current one is exhausted.
    pub fn retreat(&mut self) -> Nav {
        if matches!(self.phase, Phase::Loading(_)) {
            return Nav::Busy;
        }
        if self.index > 0 {
            self.index -= 1;
            return Nav::Shown;
        }
        match self.cursor_history.pop() {
            Some(popped) => {
                let plan = FetchPlan {
                    generation: self.generation,
                    direction: Direction::Backward,
                    cursor: popped,
                };
                self.phase = Phase::Loading(Direction::Backward);
                self.inflight = Some(Inflight {
                    plan,
                    popped: Some(popped),
                    first_page: false,
                });
                Nav::Fetch(plan)
            }
            None => Nav::Edge,
        }
    }

    /// Feed back the result of an executed [`FetchPlan`].
    pub fn complete_fetch(
        &mut self,
        plan: FetchPlan,
        result: anyhow::Result<Page<ContentItem>>,
    ) -> FetchOutcome {
        // A response from a superseded query, or one nobody is waiting
        // for, must never touch the current list.
        if plan.generation != self.generation {
            return FetchOutcome::Stale;
        }
        let inflight = match self.inflight.take() {
            Some(inflight) if inflight.plan == plan => inflight,
            other => {
                self.inflight = other;
                return FetchOutcome::Stale;
            }
        };

        match result {
            Ok(page) => {
                match plan.direction {
                    Direction::Forward => {
                        if !inflight.first_page {
                            self.cursor_history.push(self.current_cursor);
                        }
                        let mut data: Vec<ContentItem> = page
                            .data
                            .into_iter()
                            .filter(|item| !self.seen.contains(&item.external_id))
                            .collect();
                        for item in &data {
                            self.seen.insert(item.external_id.clone());
                        }
                        self.items = std::mem::take(&mut data);
                        self.index = 0;
                    }
                    Direction::Backward => {
                        // A re-fetched prior page was seen already; no
                        // dedup, and "previous" lands on its end.
                        self.items = page.data;
                        self.index = self.items.len().saturating_sub(1);
                    }
                }
                self.current_cursor = plan.cursor;
                self.next_cursor = page.next_cursor;
                self.has_more = page.has_more;
                self.phase = Phase::Idle;
                FetchOutcome::Applied
            }
            Err(_) => {
                if inflight.first_page && !self.first_page_retried {
                    self.first_page_retried = true;
                    self.inflight = Some(inflight);
                    return FetchOutcome::Retry(plan);
                }
                // Roll back to the pre-fetch state; history and
                // next_cursor stay intact.
                if let Some(popped) = inflight.popped {
                    self.cursor_history.push(popped);
                }
                self.phase = Phase::Error;
                FetchOutcome::Failed
            }
        }
    }

    /// Acknowledge an error so navigation can be attempted again.
    pub fn clear_error(&mut self) {
        if self.phase == Phase::Error {
            self.phase = Phase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn item(id: i64, external_id: &str) -> ContentItem {
        ContentItem {
            id,
            external_id: external_id.to_string(),
            title: format!("Title {external_id}"),
            author: String::new(),
            price: 0,
            tags: Vec::new(),
            description: String::new(),
            thumbnail_url: String::new(),
            sample_image_urls: Vec::new(),
            product_url: String::new(),
            preview_url: String::new(),
            rating: None,
            popularity: None,
            search_keywords: Vec::new(),
            combinations: Vec::new(),
            created_at: 0,
            updated_at: 1000 - id,
        }
    }

    fn page(ids: &[i64], more: bool) -> Page<ContentItem> {
        let data: Vec<ContentItem> = ids
            .iter()
            .map(|id| item(*id, &format!("ext-{id}")))
            .collect();
        let next_cursor = if more {
            data.last().map(Cursor::after)
        } else {
            None
        };
        Page {
            data,
            next_cursor,
            has_more: more,
        }
    }

    #[test]
    fn first_page_load_and_within_page_navigation() {
        let mut feed = Feed::new();
        let plan = feed.start_query();
        assert_eq!(feed.phase(), Phase::Loading(Direction::Forward));

        let outcome = feed.complete_fetch(plan, Ok(page(&[1, 2, 3], false)));
        assert_eq!(outcome, FetchOutcome::Applied);
        assert_eq!(feed.phase(), Phase::Idle);
        assert_eq!(feed.current().unwrap().external_id, "ext-1");

        assert_eq!(feed.advance(), Nav::Shown);
        assert_eq!(feed.current().unwrap().external_id, "ext-2");
        assert_eq!(feed.retreat(), Nav::Shown);
        assert_eq!(feed.current().unwrap().external_id, "ext-1");
    }

    #[test]
    fn edges_without_more_pages() {
        let mut feed = Feed::new();
        let plan = feed.start_query();
        feed.complete_fetch(plan, Ok(page(&[1], false)));

        assert_eq!(feed.advance(), Nav::Edge);
        assert_eq!(feed.retreat(), Nav::Edge);
    }

    #[test]
    fn forward_fetch_pushes_history_and_backward_pops_it() {
        let mut feed = Feed::new();
        let plan = feed.start_query();
        feed.complete_fetch(plan, Ok(page(&[1, 2], true)));

        feed.advance(); // to ext-2
        let plan2 = match feed.advance() {
            Nav::Fetch(plan) => plan,
            other => panic!("expected fetch, got {other:?}"),
        };
        assert_eq!(plan2.direction, Direction::Forward);
        assert!(plan2.cursor.is_some());
        feed.complete_fetch(plan2, Ok(page(&[3, 4], false)));
        assert_eq!(feed.current().unwrap().external_id, "ext-3");

        // Backward past the start of page 2 re-fetches page 1 (cursor
        // None) and lands on its last item.
        let back = match feed.retreat() {
            Nav::Fetch(plan) => plan,
            other => panic!("expected fetch, got {other:?}"),
        };
        assert_eq!(back.direction, Direction::Backward);
        assert_eq!(back.cursor, None);
        feed.complete_fetch(back, Ok(page(&[1, 2], true)));
        assert_eq!(feed.current().unwrap().external_id, "ext-2");

        // No further history: page 1 is the first page.
        feed.retreat(); // to ext-1
        assert_eq!(feed.retreat(), Nav::Edge);
    }

    #[test]
    fn navigation_is_ignored_while_loading() {
        let mut feed = Feed::new();
        let plan = feed.start_query();
        assert_eq!(feed.advance(), Nav::Busy);
        assert_eq!(feed.retreat(), Nav::Busy);
        feed.complete_fetch(plan, Ok(page(&[1], false)));
        assert_eq!(feed.phase(), Phase::Idle);
    }

    #[test]
    fn forward_pages_are_deduplicated_by_external_id() {
        let mut feed = Feed::new();
        let plan = feed.start_query();
        feed.complete_fetch(plan, Ok(page(&[1, 2], true)));
        feed.advance();

        let plan2 = match feed.advance() {
            Nav::Fetch(plan) => plan,
            other => panic!("expected fetch, got {other:?}"),
        };
        // The store surfaced a near-duplicate of ext-2 on page 2.
        feed.complete_fetch(plan2, Ok(page(&[2, 3], false)));
        let ids: Vec<&str> = feed
            .items()
            .iter()
            .map(|i| i.external_id.as_str())
            .collect();
        assert_eq!(ids, vec!["ext-3"]);
    }

    #[test]
    fn stale_responses_from_superseded_queries_are_discarded() {
        let mut feed = Feed::new();
        let old_plan = feed.start_query();
        let new_plan = feed.start_query();

        // The old query's response resolves after the new query began.
        let outcome = feed.complete_fetch(old_plan, Ok(page(&[9], false)));
        assert_eq!(outcome, FetchOutcome::Stale);
        assert!(feed.items().is_empty());
        assert_eq!(feed.phase(), Phase::Loading(Direction::Forward));

        let outcome = feed.complete_fetch(new_plan, Ok(page(&[1], false)));
        assert_eq!(outcome, FetchOutcome::Applied);
        assert_eq!(feed.current().unwrap().external_id, "ext-1");
    }

    #[test]
    fn first_page_failure_offers_one_retry() {
        let mut feed = Feed::new();
        let plan = feed.start_query();

        let outcome = feed.complete_fetch(plan, Err(anyhow!("store timeout")));
        let retry = match outcome {
            FetchOutcome::Retry(plan) => plan,
            other => panic!("expected retry, got {other:?}"),
        };
        assert_eq!(retry, plan);
        assert_eq!(feed.phase(), Phase::Loading(Direction::Forward));

        // Second failure is final.
        let outcome = feed.complete_fetch(retry, Err(anyhow!("store timeout")));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(feed.phase(), Phase::Error);
    }

    #[test]
    fn later_page_failure_rolls_back_without_retry() {
        let mut feed = Feed::new();
        let plan = feed.start_query();
        feed.complete_fetch(plan, Ok(page(&[1, 2], true)));
        feed.advance();

        let plan2 = match feed.advance() {
            Nav::Fetch(plan) => plan,
            other => panic!("expected fetch, got {other:?}"),
        };
        let outcome = feed.complete_fetch(plan2, Err(anyhow!("store timeout")));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(feed.phase(), Phase::Error);

        // Pre-fetch state intact: still on ext-2, history untouched,
        // and the next-page cursor still usable after acknowledging.
        assert_eq!(feed.current().unwrap().external_id, "ext-2");
        feed.clear_error();
        assert!(matches!(feed.advance(), Nav::Fetch(_)));
    }

    #[test]
    fn backward_failure_restores_the_popped_cursor() {
        let mut feed = Feed::new();
        let plan = feed.start_query();
        feed.complete_fetch(plan, Ok(page(&[1, 2], true)));
        feed.advance();
        let plan2 = match feed.advance() {
            Nav::Fetch(plan) => plan,
            other => panic!("expected fetch, got {other:?}"),
        };
        feed.complete_fetch(plan2, Ok(page(&[3], false)));

        let back = match feed.retreat() {
            Nav::Fetch(plan) => plan,
            other => panic!("expected fetch, got {other:?}"),
        };
        feed.complete_fetch(back, Err(anyhow!("store timeout")));
        assert_eq!(feed.phase(), Phase::Error);

        // The popped history entry was restored, so backward
        // navigation is still possible after the error clears.
        feed.clear_error();
        assert!(matches!(feed.retreat(), Nav::Fetch(_)));
    }

    #[test]
    fn new_query_clears_history_list_and_cursor() {
        let mut feed = Feed::new();
        let plan = feed.start_query();
        feed.complete_fetch(plan, Ok(page(&[1, 2], true)));
        feed.advance();
        let plan2 = match feed.advance() {
            Nav::Fetch(plan) => plan,
            other => panic!("expected fetch, got {other:?}"),
        };
        feed.complete_fetch(plan2, Ok(page(&[3], true)));

        let fresh = feed.start_query();
        assert_eq!(fresh.cursor, None);
        assert!(feed.items().is_empty());
        feed.complete_fetch(fresh, Ok(page(&[2], false)));
        // Dedup state was cleared too: ext-2 shows again in the new
        // query even though the previous session displayed it.
        assert_eq!(feed.current().unwrap().external_id, "ext-2");
        // History from the old query is gone.
        assert_eq!(feed.retreat(), Nav::Edge);
    }
}
