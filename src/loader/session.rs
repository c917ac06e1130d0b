//! The pagination state machine, free of any I/O.
//!
//! ```text
//! Idle(empty) -> FetchingFirstPage -> Idle(more) <-> FetchingMore -> Idle(more) | Idle(exhausted)
//! ```
//!
//! Any reset jumps back to `FetchingFirstPage` from every state. Each fetch is
//! identified by a [`Ticket`]; only the ticket currently in flight may complete,
//! so a page requested before a reset can never land in the list that
//! replaced it.

use super::source::{PageRequest, ScrollMetrics};
use color_eyre::eyre::Result;

/// Distance from the bottom, in container units, below which scrolling loads
/// the next page.
pub const DEFAULT_SCROLL_THRESHOLD: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    FirstPage,
    More,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub seq: u64,
    pub kind: FetchKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan<F, C> {
    pub ticket: Ticket,
    pub request: PageRequest<F, C>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Non-empty page appended; carries the number of new items.
    Appended(usize),
    /// Empty page: no further automatic fetches until the next reset.
    Exhausted,
    Failed,
    /// Response for a ticket that is no longer in flight; dropped unseen.
    Stale,
}

/// Observable state of one list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub data: Vec<T>,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub exhausted: bool,
    pub generation: u64,
    /// Failure of the last first-page fetch, cleared by the next reset.
    pub error: Option<String>,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            is_loading: false,
            is_loading_more: false,
            exhausted: false,
            generation: 0,
            error: None,
        }
    }
}

#[derive(Debug)]
pub struct ListSession<T, F> {
    limit: usize,
    threshold: u32,
    filter: F,
    data: Vec<T>,
    generation: u64,
    seq: u64,
    in_flight: Option<Ticket>,
    exhausted: bool,
    error: Option<String>,
}

impl<T: Clone, F: Clone + PartialEq> ListSession<T, F> {
    pub fn new(filter: F, limit: usize) -> Self {
        Self {
            limit,
            threshold: DEFAULT_SCROLL_THRESHOLD,
            filter,
            data: Vec::new(),
            generation: 0,
            seq: 0,
            in_flight: None,
            exhausted: false,
            error: None,
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight(&self) -> Option<Ticket> {
        self.in_flight
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Page size only affects future requests; it is not part of the list's
    /// identity, so changing it never resets.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    /// Resets when `filter` differs from the current one.
    pub fn set_filter<C>(&mut self, filter: F) -> Option<FetchPlan<F, C>> {
        if filter == self.filter {
            return None;
        }
        self.filter = filter;
        Some(self.reset())
    }

    /// Drops everything loaded so far and requests the first page again.
    /// Whatever was in flight becomes stale.
    pub fn reset<C>(&mut self) -> FetchPlan<F, C> {
        self.generation += 1;
        self.data.clear();
        self.exhausted = false;
        self.error = None;
        tracing::debug!(generation = self.generation, "list reset");
        self.issue(FetchKind::FirstPage, None)
    }

    /// Next page after the last loaded item. `None` while a fetch is in flight
    /// or once the list is exhausted.
    pub fn load_more<C>(
        &mut self,
        cursor_after: impl FnOnce(&T) -> C,
    ) -> Option<FetchPlan<F, C>> {
        if self.in_flight.is_some() || self.exhausted {
            return None;
        }
        let cursor = self.data.last().map(cursor_after);
        Some(self.issue(FetchKind::More, cursor))
    }

    /// Scroll trigger: loads more once the bottom is within the threshold.
    pub fn on_scroll<C>(
        &mut self,
        metrics: ScrollMetrics,
        cursor_after: impl FnOnce(&T) -> C,
    ) -> Option<FetchPlan<F, C>> {
        if metrics.distance_from_bottom() >= self.threshold {
            return None;
        }
        self.load_more(cursor_after)
    }

    /// Viewport-fill trigger: loads more while the content cannot scroll.
    pub fn fill_viewport<C>(
        &mut self,
        metrics: ScrollMetrics,
        cursor_after: impl FnOnce(&T) -> C,
    ) -> Option<FetchPlan<F, C>> {
        if metrics.overflows() {
            return None;
        }
        self.load_more(cursor_after)
    }

    pub fn complete(&mut self, ticket: Ticket, result: Result<Vec<T>>) -> Completion {
        if self.in_flight != Some(ticket) {
            tracing::debug!(
                generation = ticket.generation,
                seq = ticket.seq,
                current = self.generation,
                "discarding stale page"
            );
            return Completion::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) if page.is_empty() => {
                self.exhausted = true;
                Completion::Exhausted
            }
            Ok(page) => {
                let n = page.len();
                self.data.extend(page);
                Completion::Appended(n)
            }
            Err(e) => {
                match ticket.kind {
                    FetchKind::FirstPage => {
                        tracing::error!("first page fetch failed: {e:#}");
                        self.error = Some(format!("{e:#}"));
                    }
                    FetchKind::More => tracing::warn!("load more failed: {e:#}"),
                }
                Completion::Failed
            }
        }
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        let fetching = self.in_flight.is_some();
        ListSnapshot {
            data: self.data.clone(),
            is_loading: fetching && self.data.is_empty(),
            is_loading_more: fetching && !self.data.is_empty(),
            exhausted: self.exhausted,
            generation: self.generation,
            error: self.error.clone(),
        }
    }

    fn issue<C>(&mut self, kind: FetchKind, cursor: Option<C>) -> FetchPlan<F, C> {
        self.seq += 1;
        let ticket = Ticket {
            generation: self.generation,
            seq: self.seq,
            kind,
        };
        self.in_flight = Some(ticket);
        FetchPlan {
            ticket,
            request: PageRequest {
                limit: self.limit,
                filter: self.filter.clone(),
                cursor,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::eyre;
    use pretty_assertions::assert_eq;

    type Session = ListSession<&'static str, u32>;

    /// Cursor is the last item itself.
    fn after(last: &&'static str) -> &'static str {
        *last
    }

    fn scrolled(distance: u32) -> ScrollMetrics {
        ScrollMetrics {
            scroll_height: 1000 + distance,
            client_height: 500,
            scroll_top: 500,
        }
    }

    const SHORT: ScrollMetrics = ScrollMetrics {
        scroll_height: 100,
        client_height: 500,
        scroll_top: 0,
    };

    const TALL: ScrollMetrics = ScrollMetrics {
        scroll_height: 5000,
        client_height: 500,
        scroll_top: 0,
    };

    #[test]
    fn new_session_is_idle() {
        let s = Session::new(1, 2);
        let snap = s.snapshot();
        assert!(!snap.is_loading);
        assert!(!snap.is_loading_more);
        assert_eq!(snap.generation, 0);
        assert!(s.in_flight().is_none());
    }

    #[test]
    fn reset_issues_first_page_without_cursor() {
        let mut s = Session::new(1, 2);
        let plan: FetchPlan<u32, &str> = s.reset();
        assert_eq!(plan.ticket.kind, FetchKind::FirstPage);
        assert_eq!(plan.request.limit, 2);
        assert_eq!(plan.request.filter, 1);
        assert_eq!(plan.request.cursor, None);
        assert!(s.snapshot().is_loading);
    }

    #[test]
    fn pages_accumulate_then_exhaust() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        assert_eq!(s.complete(first.ticket, Ok(vec!["a", "b"])), Completion::Appended(2));

        let second = s.load_more(after).unwrap();
        assert_eq!(second.request.cursor, Some("b"));
        assert!(s.snapshot().is_loading_more);
        assert_eq!(s.complete(second.ticket, Ok(vec!["c"])), Completion::Appended(1));

        let third = s.load_more(after).unwrap();
        assert_eq!(third.request.cursor, Some("c"));
        assert_eq!(s.complete(third.ticket, Ok(vec![])), Completion::Exhausted);

        let snap = s.snapshot();
        assert_eq!(snap.data, vec!["a", "b", "c"]);
        assert!(snap.exhausted);
        assert!(s.load_more(after).is_none());
        assert!(s.on_scroll(scrolled(0), after).is_none());
        assert!(s.fill_viewport(SHORT, after).is_none());
    }

    #[test]
    fn in_flight_blocks_more() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a"]));
        assert!(s.load_more(after).is_some());
        assert!(s.load_more(after).is_none());
        assert!(s.on_scroll(scrolled(0), after).is_none());
        assert!(s.fill_viewport(SHORT, after).is_none());
    }

    #[test]
    fn first_page_in_flight_blocks_more() {
        let mut s = Session::new(1, 2);
        let _first: FetchPlan<u32, &str> = s.reset();
        assert!(s.load_more(after).is_none());
    }

    #[test]
    fn same_filter_does_not_reset() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a"]));
        assert!(s.set_filter::<&str>(1).is_none());
        assert_eq!(s.data(), &["a"]);
    }

    #[test]
    fn limit_change_does_not_reset() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a"]));
        s.set_limit(50);
        let more = s.load_more(after).unwrap();
        assert_eq!(more.request.limit, 50);
        assert_eq!(s.generation(), 1);
    }

    #[test]
    fn filter_change_clears_and_refetches() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a", "b"]));
        let more = s.load_more(after).unwrap();
        s.complete(more.ticket, Ok(vec![]));
        assert!(s.is_exhausted());

        let plan = s.set_filter(2).unwrap();
        assert_eq!(plan.request.filter, 2);
        assert_eq!(plan.request.cursor, None::<&str>);
        assert!(s.is_empty());
        assert!(!s.is_exhausted());
        assert_eq!(s.generation(), 2);
    }

    #[test]
    fn page_requested_before_reset_is_discarded() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a", "b"]));
        let stale = s.load_more(after).unwrap();

        let fresh = s.set_filter::<&str>(2).unwrap();
        assert!(s.snapshot().data.is_empty());
        assert!(s.snapshot().is_loading);

        assert_eq!(s.complete(stale.ticket, Ok(vec!["c"])), Completion::Stale);
        assert!(s.is_empty());
        assert_eq!(s.in_flight(), Some(fresh.ticket));

        assert_eq!(s.complete(fresh.ticket, Ok(vec!["x"])), Completion::Appended(1));
        assert_eq!(s.data(), &["x"]);
    }

    #[test]
    fn stale_empty_page_does_not_exhaust() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a"]));
        let stale = s.load_more(after).unwrap();
        let _fresh = s.reset::<&str>();
        assert_eq!(s.complete(stale.ticket, Ok(vec![])), Completion::Stale);
        assert!(!s.is_exhausted());
    }

    #[test]
    fn failed_more_keeps_data_and_allows_retry() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a"]));
        let more = s.load_more(after).unwrap();
        assert_eq!(s.complete(more.ticket, Err(eyre!("boom"))), Completion::Failed);

        let snap = s.snapshot();
        assert_eq!(snap.data, vec!["a"]);
        assert!(!snap.exhausted);
        assert!(!snap.is_loading_more);
        assert_eq!(snap.error, None);
        assert!(s.load_more(after).is_some());
    }

    #[test]
    fn failed_first_page_records_error_until_reset() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        assert_eq!(s.complete(first.ticket, Err(eyre!("503"))), Completion::Failed);
        assert_eq!(s.snapshot().error.as_deref(), Some("503"));
        assert!(!s.snapshot().is_loading);

        let _again = s.reset::<&str>();
        assert_eq!(s.snapshot().error, None);
    }

    #[test]
    fn load_more_on_empty_list_has_no_cursor() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Err(eyre!("offline")));
        let retry = s.load_more(after).unwrap();
        assert_eq!(retry.request.cursor, None);
    }

    #[test]
    fn scroll_threshold() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a"]));
        assert!(s.on_scroll(scrolled(400), after).is_none());
        assert!(s.on_scroll(scrolled(399), after).is_some());
    }

    #[test]
    fn custom_threshold() {
        let mut s = Session::new(1, 2).with_threshold(10);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a"]));
        assert!(s.on_scroll(scrolled(10), after).is_none());
        assert!(s.on_scroll(scrolled(9), after).is_some());
    }

    #[test]
    fn viewport_fill_only_when_short() {
        let mut s = Session::new(1, 2);
        let first = s.reset::<&str>();
        s.complete(first.ticket, Ok(vec!["a"]));
        assert!(s.fill_viewport(TALL, after).is_none());
        assert!(s.fill_viewport(SHORT, after).is_some());
    }

    #[test]
    fn tickets_are_unique_across_resets() {
        let mut s = Session::new(1, 2);
        let a = s.reset::<&str>().ticket;
        let b = s.reset::<&str>().ticket;
        assert_ne!(a, b);
        assert!(b.generation > a.generation);
        assert!(b.seq > a.seq);
    }
}
