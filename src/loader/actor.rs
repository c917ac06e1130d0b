//! Async driver for a [`ListSession`].
//!
//! One task per list owns the session. Commands arrive from any number of
//! [`LoaderHandle`]s, scroll events from the injected [`ScrollContainer`], and
//! page results from the fetch tasks it spawns, each tagged with its ticket.
//! Because every mutation happens on this one task, the in-flight guard needs
//! no locking, and the ticket check is enough to drop pages that a reset made
//! obsolete. The task exits once every handle is dropped.

use super::session::{Completion, FetchPlan, ListSession, ListSnapshot, Ticket};
use super::source::{PageSource, ScrollContainer};
use color_eyre::eyre::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub limit: usize,
    pub scroll_threshold: u32,
}

#[derive(Debug)]
pub enum LoaderCommand<F> {
    /// Resets only if the filter differs from the current one.
    SetFilter(F),
    SetLimit(usize),
    /// Unconditional reset with the current filter.
    Refresh,
    LoadMore,
}

type PageResult<S> = (Ticket, Result<Vec<<S as PageSource>::Item>>);

pub struct LoaderHandle<S: PageSource> {
    tx: mpsc::UnboundedSender<LoaderCommand<S::Filter>>,
    snapshots: watch::Receiver<ListSnapshot<S::Item>>,
}

impl<S: PageSource> Clone for LoaderHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<S: PageSource> LoaderHandle<S> {
    /// Returns `false` if the loader task has stopped.
    pub fn set_filter(&self, filter: S::Filter) -> bool {
        self.send(LoaderCommand::SetFilter(filter))
    }

    pub fn set_limit(&self, limit: usize) -> bool {
        self.send(LoaderCommand::SetLimit(limit))
    }

    pub fn refresh(&self) -> bool {
        self.send(LoaderCommand::Refresh)
    }

    pub fn load_more(&self) -> bool {
        self.send(LoaderCommand::LoadMore)
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<S::Item>> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> ListSnapshot<S::Item> {
        self.snapshots.borrow().clone()
    }

    fn send(&self, cmd: LoaderCommand<S::Filter>) -> bool {
        if self.tx.send(cmd).is_err() {
            tracing::warn!("loader command dropped: task stopped");
            return false;
        }
        true
    }
}

pub struct InfiniteLoader<S: PageSource> {
    source: Arc<S>,
    container: Arc<dyn ScrollContainer>,
    session: ListSession<S::Item, S::Filter>,
    commands: mpsc::UnboundedReceiver<LoaderCommand<S::Filter>>,
    snapshots: watch::Sender<ListSnapshot<S::Item>>,
    done_tx: mpsc::UnboundedSender<PageResult<S>>,
    done_rx: mpsc::UnboundedReceiver<PageResult<S>>,
}

impl<S: PageSource> InfiniteLoader<S> {
    pub fn new(
        source: Arc<S>,
        container: Arc<dyn ScrollContainer>,
        filter: S::Filter,
        config: LoaderConfig,
    ) -> (Self, LoaderHandle<S>) {
        let (tx, commands) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(ListSnapshot::default());
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let session =
            ListSession::new(filter, config.limit).with_threshold(config.scroll_threshold);
        let loader = Self {
            source,
            container,
            session,
            commands,
            snapshots,
            done_tx,
            done_rx,
        };
        let handle = LoaderHandle {
            tx,
            snapshots: snapshot_rx,
        };
        (loader, handle)
    }

    /// Spawns the loader on the current runtime and returns its handle.
    pub fn spawn(
        source: Arc<S>,
        container: Arc<dyn ScrollContainer>,
        filter: S::Filter,
        config: LoaderConfig,
    ) -> LoaderHandle<S> {
        let (loader, handle) = Self::new(source, container, filter, config);
        tokio::spawn(loader.run());
        handle
    }

    pub async fn run(mut self) {
        let mut scroll = self.container.subscribe();
        let mut scroll_open = true;

        let plan = self.session.reset();
        self.dispatch(plan);
        self.publish();

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        tracing::debug!("all loader handles dropped, stopping");
                        return;
                    }
                },
                Some((ticket, result)) = self.done_rx.recv() => {
                    self.handle_page(ticket, result);
                }
                changed = scroll.changed(), if scroll_open => {
                    if changed.is_err() {
                        tracing::debug!("scroll container closed");
                        scroll_open = false;
                        continue;
                    }
                    let metrics = *scroll.borrow_and_update();
                    let source = &self.source;
                    if let Some(plan) = self
                        .session
                        .on_scroll(metrics, |last| source.cursor_after(last))
                    {
                        self.dispatch(plan);
                        self.publish();
                    }
                }
            }
        }
    }

    fn handle_command(&mut self, cmd: LoaderCommand<S::Filter>) {
        let source = &self.source;
        let plan = match cmd {
            LoaderCommand::SetFilter(filter) => self.session.set_filter(filter),
            LoaderCommand::SetLimit(limit) => {
                self.session.set_limit(limit);
                None
            }
            LoaderCommand::Refresh => Some(self.session.reset()),
            LoaderCommand::LoadMore => self.session.load_more(|last| source.cursor_after(last)),
        };
        if let Some(plan) = plan {
            self.dispatch(plan);
            self.publish();
        }
    }

    fn handle_page(&mut self, ticket: Ticket, result: Result<Vec<S::Item>>) {
        match self.session.complete(ticket, result) {
            Completion::Stale => {}
            Completion::Appended(n) => {
                tracing::debug!(appended = n, total = self.session.len(), "page loaded");
                // Keep loading while the list is too short to scroll.
                let metrics = self.container.layout(self.session.len());
                let source = &self.source;
                if let Some(plan) = self
                    .session
                    .fill_viewport(metrics, |last| source.cursor_after(last))
                {
                    self.dispatch(plan);
                }
                self.publish();
            }
            Completion::Exhausted => {
                tracing::debug!(total = self.session.len(), "list exhausted");
                self.publish();
            }
            Completion::Failed => self.publish(),
        }
    }

    fn dispatch(&self, plan: FetchPlan<S::Filter, S::Cursor>) {
        let source = Arc::clone(&self.source);
        let done = self.done_tx.clone();
        let FetchPlan { ticket, request } = plan;
        tokio::spawn(async move {
            let result = source.fetch_page(request).await;
            if done.send((ticket, result)).is_err() {
                tracing::debug!("loader stopped before page arrived");
            }
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.session.snapshot());
    }
}
