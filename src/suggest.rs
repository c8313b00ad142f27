//! Asset-name suggestions for the search box.
//!
//! Keystrokes go through a trailing-edge [`Debouncer`]: only the last call
//! within the delay window fires. When it fires the app reads the input as
//! it is *then* and asks [`SuggestionTracker::begin`] for a ticket. Results
//! are tagged with the ticket's generation; anything older than the latest
//! ticket (or than a clear) is discarded.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::types::AssetBundle;

/// Trailing-edge debounce over tokio timers.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action` after the delay, replacing any scheduled call.
    pub fn call<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(h) = self.pending.take() {
            h.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuggestStatus {
    Idle,
    Loading,
    Ready,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestTicket {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug)]
pub struct SuggestionTracker {
    generation: u64,
    status: SuggestStatus,
    query: Option<String>,
    suggestions: Vec<AssetBundle>,
    selected: usize,
}

impl Default for SuggestionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionTracker {
    pub fn new() -> Self {
        Self {
            generation: 0,
            status: SuggestStatus::Idle,
            query: None,
            suggestions: Vec::new(),
            selected: 0,
        }
    }

    pub fn status(&self) -> SuggestStatus {
        self.status
    }

    pub fn suggestions(&self) -> &[AssetBundle] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<&AssetBundle> {
        self.suggestions.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Debounce fired: start a fetch for `input` unless it is blank.
    pub fn begin(&mut self, input: &str) -> Option<SuggestTicket> {
        let query = input.trim();
        if query.is_empty() {
            return None;
        }
        self.generation += 1;
        self.status = SuggestStatus::Loading;
        self.query = Some(query.to_string());
        Some(SuggestTicket {
            generation: self.generation,
            query: query.to_string(),
        })
    }

    /// Store results for `generation`. Returns false when superseded.
    pub fn complete(&mut self, generation: u64, results: Vec<AssetBundle>) -> bool {
        if generation != self.generation || self.status != SuggestStatus::Loading {
            log::debug!("[suggest] drop stale results #{generation} (active #{})", self.generation);
            return false;
        }
        self.status = SuggestStatus::Ready;
        self.suggestions = results;
        self.selected = 0;
        true
    }

    pub fn fail(&mut self, generation: u64, err: &str) {
        if generation != self.generation {
            return;
        }
        log::warn!("[suggest] asset search failed: {err}");
        self.status = SuggestStatus::Idle;
    }

    /// Drop the list and supersede any in-flight fetch.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.status = SuggestStatus::Idle;
        self.query = None;
        self.suggestions.clear();
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = (self.selected + 1) % self.suggestions.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.suggestions.len() - 1);
        }
    }
}
