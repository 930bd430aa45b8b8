//! Simulated infinite scroll over the already-loaded task list.
//!
//! Reaching the bottom of the scroll container starts a delayed "fetch more"
//! that appends the next page-size chunk of the derived collection. Nothing
//! is fetched remotely; the delay only models latency.

use std::sync::mpsc::Sender;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::pipeline::{DisplayMode, ViewState};

pub const DEFAULT_SCROLL_THRESHOLD: usize = 10;
pub const DEFAULT_LOAD_MORE_DELAY: Duration = Duration::from_millis(1500);

/// Scroll geometry of the list container, in rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    pub scroll_top: usize,
    pub client_height: usize,
    pub scroll_height: usize,
}

impl ScrollMetrics {
    pub fn near_bottom(&self, threshold: usize) -> bool {
        self.scroll_top + self.client_height + threshold >= self.scroll_height
    }
}

/// Claim on one pending chunk. Only the ticket from the current generation
/// may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub page: usize,
}

#[derive(Debug, Default)]
pub struct ScrollLoader {
    loading: bool,
    generation: u64,
}

impl ScrollLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a fetch-more if the container is near its bottom. Suppressed
    /// while a load is pending or a filter is active, outside scrolling mode,
    /// and when every match is already shown.
    pub fn begin(
        &mut self,
        state: &ViewState,
        metrics: ScrollMetrics,
        matched: usize,
        threshold: usize,
    ) -> Option<LoadTicket> {
        if state.mode != DisplayMode::Scrolling || self.loading || state.filter_active() {
            return None;
        }
        if !metrics.near_bottom(threshold) {
            return None;
        }
        if state.scroll_loaded >= matched {
            return None;
        }
        self.loading = true;
        let ticket = LoadTicket {
            generation: self.generation,
            page: state.page + 1,
        };
        tracing::debug!(page = ticket.page, generation = ticket.generation, "load more started");
        Some(ticket)
    }

    /// Append the chunk promised by `ticket`. Stale tickets are ignored.
    pub fn complete(&mut self, ticket: LoadTicket, state: &mut ViewState) -> bool {
        if !self.loading || ticket.generation != self.generation {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "ignoring stale load ticket"
            );
            return false;
        }
        self.loading = false;
        if state.mode != DisplayMode::Scrolling {
            return false;
        }
        state.page = ticket.page;
        state.scroll_loaded = ticket.page.saturating_mul(state.page_size);
        true
    }

    /// Forget any pending load; its ticket becomes stale.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.loading = false;
    }
}

/// Delivers a [`LoadTicket`] after a delay. At most one delivery is pending;
/// scheduling again or cancelling aborts the previous one.
pub struct LoadMoreTimer<M: Send + 'static> {
    handle: Handle,
    delay: Duration,
    tx: Sender<M>,
    pending: Option<JoinHandle<()>>,
}

impl<M: Send + 'static> LoadMoreTimer<M> {
    pub fn new(handle: Handle, delay: Duration, tx: Sender<M>) -> Self {
        Self {
            handle,
            delay,
            tx,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F>(&mut self, ticket: LoadTicket, wrap: F)
    where
        F: FnOnce(LoadTicket) -> M + Send + 'static,
    {
        self.cancel();
        let tx = self.tx.clone();
        let delay = self.delay;
        self.pending = Some(self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(wrap(ticket));
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            if !task.is_finished() {
                tracing::debug!("load more cancelled");
            }
            task.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl<M: Send + 'static> Drop for LoadMoreTimer<M> {
    fn drop(&mut self) {
        self.cancel();
    }
}
