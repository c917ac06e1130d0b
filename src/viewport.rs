//! Terminal list pane as a scroll container. Units are terminal lines: the
//! pane reports its geometry after every draw, and each change is a scroll
//! event for the loader behind it.

use crate::loader::{ScrollContainer, ScrollMetrics};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

pub struct TerminalViewport {
    tx: watch::Sender<ScrollMetrics>,
    /// Loaded items behind the last reported lines.
    items: AtomicUsize,
}

impl Default for TerminalViewport {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalViewport {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ScrollMetrics::default());
        Self {
            tx,
            items: AtomicUsize::new(0),
        }
    }

    /// Publishes the geometry of the last draw. Returns `true` if it was
    /// published.
    ///
    /// `items` is the number of loaded items and `lines` what the pane drew
    /// from them after client-side filtering. A pane that is still short
    /// publishes again whenever `items` changes, even with identical
    /// geometry, so a filter that hides a whole page keeps the list loading.
    pub fn report(&self, items: usize, lines: usize, visible_rows: u16, offset: usize) -> bool {
        let metrics = ScrollMetrics {
            scroll_height: to_u32(lines),
            client_height: u32::from(visible_rows),
            scroll_top: to_u32(offset),
        };
        let short_and_reloaded =
            self.items.swap(items, Ordering::Relaxed) != items && !metrics.overflows();
        self.tx.send_if_modified(|current| {
            if *current == metrics && !short_and_reloaded {
                false
            } else {
                *current = metrics;
                true
            }
        })
    }

    pub fn metrics(&self) -> ScrollMetrics {
        *self.tx.borrow()
    }
}

impl ScrollContainer for TerminalViewport {
    fn subscribe(&self) -> watch::Receiver<ScrollMetrics> {
        self.tx.subscribe()
    }

    /// Every shown item takes at least one line, so `rows` bounds the content
    /// height from below when nothing is filtered out. Filtered panes catch
    /// up through [`TerminalViewport::report`].
    fn layout(&self, rows: usize) -> ScrollMetrics {
        ScrollMetrics {
            scroll_height: to_u32(rows),
            ..self.metrics()
        }
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_publishes_only_changes() {
        let vp = TerminalViewport::new();
        let mut rx = vp.subscribe();
        assert!(vp.report(30, 30, 10, 0));
        assert!(rx.has_changed().unwrap());
        let seen = *rx.borrow_and_update();
        assert_eq!(seen.scroll_height, 30);
        assert_eq!(seen.client_height, 10);

        assert!(!vp.report(30, 30, 10, 0));
        assert!(!rx.has_changed().unwrap());

        assert!(vp.report(30, 30, 10, 5));
        assert_eq!(rx.borrow_and_update().distance_from_bottom(), 15);
    }

    #[test]
    fn short_pane_republishes_when_items_arrive() {
        let vp = TerminalViewport::new();
        let mut rx = vp.subscribe();
        assert!(vp.report(0, 0, 10, 0));
        let _ = rx.borrow_and_update();

        // a page arrived but the filter hid all of it
        assert!(vp.report(12, 0, 10, 0));
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();
        assert!(!vp.report(12, 0, 10, 0));

        // once the pane overflows, unchanged geometry stays quiet
        assert!(vp.report(24, 30, 10, 0));
        assert!(!vp.report(36, 30, 10, 0));
    }

    #[test]
    fn layout_keeps_visible_height() {
        let vp = TerminalViewport::new();
        vp.report(3, 3, 20, 0);
        let m = vp.layout(12);
        assert_eq!(m.scroll_height, 12);
        assert_eq!(m.client_height, 20);
        assert!(!m.overflows());
        assert!(vp.layout(25).overflows());
    }
}
