//! Runs a search session's lookups against the indexer.
//!
//! Each lookup is a one-shot fetcher whose observer evaluates the response
//! and posts a generation-tagged [`LookupResolution`] into the app's event
//! channel. The coordinator decides whether that resolution still matters.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::api::{ApiError, Fetched, IndexerApi};
use crate::fetcher::{spawn_fetch, FetchHandle, FetchObserver, FetchSpec};
use crate::router::Route;
use crate::search::{
    evaluate, LookupKind, LookupOutcome, LookupResolution, SearchCoordinator, SearchEffect,
    SessionTicket, TieBreak,
};
use crate::types::AppEvent;

struct LookupObserver {
    generation: u64,
    kind: LookupKind,
    key: String,
    events: UnboundedSender<AppEvent>,
}

impl LookupObserver {
    fn post(&self, outcome: LookupOutcome) {
        let _ = self.events.send(AppEvent::Lookup(LookupResolution {
            generation: self.generation,
            kind: self.kind,
            outcome,
        }));
    }
}

impl FetchObserver for LookupObserver {
    fn on_result(&self, body: Value) {
        self.post(evaluate(self.kind, &self.key, Ok(Fetched::Found(body))));
    }
    fn on_not_found(&self) {
        self.post(LookupOutcome::NotFound);
    }
    fn on_error(&self, err: &ApiError) {
        self.post(LookupOutcome::Errored(err.to_string()));
    }
}

/// Owns the in-flight lookups of the current session.
pub struct LookupDispatcher {
    api: Arc<dyn IndexerApi>,
    events: UnboundedSender<AppEvent>,
    generation: Option<u64>,
    handles: Vec<FetchHandle>,
}

impl LookupDispatcher {
    pub fn new(api: Arc<dyn IndexerApi>, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            api,
            events,
            generation: None,
            handles: Vec::new(),
        }
    }

    /// Start every lookup of `ticket`. Lookups of an earlier session are
    /// unmounted first.
    pub fn dispatch(&mut self, ticket: &SessionTicket) {
        self.cancel_all();
        self.generation = Some(ticket.generation);
        self.handles = ticket
            .lookups
            .iter()
            .map(|(kind, key)| {
                let observer = LookupObserver {
                    generation: ticket.generation,
                    kind: *kind,
                    key: key.clone(),
                    events: self.events.clone(),
                };
                spawn_fetch(self.api.clone(), FetchSpec::once(kind.path(key)), observer)
            })
            .collect();
        log::debug!(
            "[dispatch] #{} started {} lookups",
            ticket.generation,
            self.handles.len()
        );
    }

    /// Unmount the current session's lookups.
    pub fn cancel_all(&mut self) {
        if let Some(g) = self.generation.take() {
            log::debug!("[dispatch] #{g} cancelling {} lookups", self.handles.len());
        }
        // dropping a handle cancels it
        self.handles.clear();
    }

    pub fn in_flight(&self) -> usize {
        self.handles.iter().filter(|h| h.is_active()).count()
    }
}

/// Resolve one query end to end without a UI. Returns the winning route, or
/// `None` when every lookup came back negative (or the query was blank).
pub async fn resolve_query(
    api: Arc<dyn IndexerApi>,
    query: &str,
    tie_break: TieBreak,
) -> Option<Route> {
    let (tx, mut rx) = unbounded_channel();
    let mut coordinator = SearchCoordinator::new(tie_break);
    let mut dispatcher = LookupDispatcher::new(api, tx);

    let ticket = coordinator.submit(query, &[])?;
    dispatcher.dispatch(&ticket);

    while let Some(ev) = rx.recv().await {
        let AppEvent::Lookup(res) = ev else { continue };
        match coordinator.resolve(res) {
            Some(SearchEffect::Navigate(route)) => {
                dispatcher.cancel_all();
                return Some(route);
            }
            Some(SearchEffect::ShowNoResults) => return None,
            None => {}
        }
    }
    None
}
