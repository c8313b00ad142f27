//! Speculative multi-endpoint search coordinator.
//!
//! One submitted string fans out into one lookup per [`LookupKind`]. The
//! first positive answer decides where to navigate; if every lookup comes
//! back negative the user gets a "no results" popover.
//!
//! The coordinator is a synchronous state machine. Lookups run elsewhere
//! (see [`crate::dispatch`]) and report back with the session generation
//! they were dispatched under. Results whose generation is not the active
//! one, or that arrive after the session closed, are dropped without
//! touching any state.
//!
//! ```text
//! Idle ──submit──▶ Searching ──first positive──▶ Resolved(route) ──navigated──▶ Idle
//!                      │
//!                      └──all negative──▶ NotFound ──submit──▶ Searching
//! ```

use serde_json::Value;

use crate::api::{paths, ApiError, Fetched};
use crate::router::Route;
use crate::types::AssetBundle;

/// Resource kinds probed for every query, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Block,
    Transaction,
    AssetScheme,
    Account,
    AddressTransactions,
}

impl LookupKind {
    pub const ALL: [LookupKind; 5] = [
        LookupKind::Block,
        LookupKind::Transaction,
        LookupKind::AssetScheme,
        LookupKind::Account,
        LookupKind::AddressTransactions,
    ];

    /// Indexer path probed for `key`.
    pub fn path(self, key: &str) -> String {
        match self {
            LookupKind::Block => paths::block(key),
            LookupKind::Transaction => paths::tx(key),
            LookupKind::AssetScheme => paths::asset_scheme(key),
            LookupKind::Account => paths::account(key),
            LookupKind::AddressTransactions => paths::asset_address_transactions(key, 1, 1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LookupKind::Block => "block",
            LookupKind::Transaction => "transaction",
            LookupKind::AssetScheme => "asset-scheme",
            LookupKind::Account => "account",
            LookupKind::AddressTransactions => "address-transactions",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(Route),
    NotFound,
    Errored(String),
}

impl LookupOutcome {
    pub fn is_positive(&self) -> bool {
        matches!(self, LookupOutcome::Found(_))
    }
}

/// Decide what one lookup's response means for the search.
///
/// The destination is derived from the kind: blocks and transactions take
/// their identity from the returned document, the rest from the key. An
/// address-transactions answer only counts when its list is non-empty.
pub fn evaluate(
    kind: LookupKind,
    key: &str,
    res: Result<Fetched<Value>, ApiError>,
) -> LookupOutcome {
    let body = match res {
        Ok(Fetched::Found(body)) => body,
        Ok(Fetched::NotFound) => return LookupOutcome::NotFound,
        Err(e) => return LookupOutcome::Errored(e.to_string()),
    };

    match kind {
        LookupKind::Block => match body.get("number").and_then(Value::as_u64) {
            Some(number) => LookupOutcome::Found(Route::Block { number }),
            None => LookupOutcome::Errored("block without number".into()),
        },
        LookupKind::Transaction => match body.get("hash").and_then(Value::as_str) {
            Some(hash) => LookupOutcome::Found(Route::Tx {
                hash: paths::strip_0x(hash).to_string(),
            }),
            None => LookupOutcome::Errored("transaction without hash".into()),
        },
        LookupKind::AssetScheme => LookupOutcome::Found(Route::Asset {
            asset_type: key.to_string(),
        }),
        LookupKind::Account => LookupOutcome::Found(Route::PlatformAddress {
            address: key.to_string(),
        }),
        LookupKind::AddressTransactions => match body.as_array() {
            Some(list) if !list.is_empty() => LookupOutcome::Found(Route::AssetAddress {
                address: key.to_string(),
            }),
            Some(_) => LookupOutcome::NotFound,
            None => LookupOutcome::Errored("address transactions not a list".into()),
        },
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupStatus {
    Pending,
    Resolved,
    NotFound,
    Errored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupRequest {
    pub kind: LookupKind,
    pub key: String,
    pub status: LookupStatus,
    found: Option<Route>,
}

/// How to pick a winner when several lookups are positive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Whichever positive answer arrives first.
    #[default]
    FirstResponse,
    /// Highest-priority kind in [`LookupKind::ALL`] order; a positive answer
    /// waits until every higher-priority lookup has come back negative.
    KindPriority,
}

impl std::str::FromStr for TieBreak {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "first-response" => Ok(TieBreak::FirstResponse),
            "priority" | "kind-priority" => Ok(TieBreak::KindPriority),
            _ => Err(anyhow::anyhow!(
                "Invalid tie-break '{s}'. Valid options: first, priority"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchSession {
    generation: u64,
    query: String,
    requests: Vec<LookupRequest>,
    outstanding: usize,
    winner: Option<Route>,
    closed: bool,
}

impl SearchSession {
    pub fn generation(&self) -> u64 {
        self.generation
    }
    pub fn query(&self) -> &str {
        &self.query
    }
    pub fn requests(&self) -> &[LookupRequest] {
        &self.requests
    }
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
    pub fn winner(&self) -> Option<&Route> {
        self.winner.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    Resolved(Route),
    NotFound,
}

/// Work order for the dispatcher: what to look up under which generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionTicket {
    pub generation: u64,
    pub lookups: Vec<(LookupKind, String)>,
}

/// A lookup's answer as delivered back to the coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupResolution {
    pub generation: u64,
    pub kind: LookupKind,
    pub outcome: LookupOutcome,
}

/// Side effect requested by a state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchEffect {
    Navigate(Route),
    ShowNoResults,
}

#[derive(Debug)]
pub struct SearchCoordinator {
    tie_break: TieBreak,
    next_generation: u64,
    session: Option<SearchSession>,
    state: SearchState,
    no_results_visible: bool,
}

impl Default for SearchCoordinator {
    fn default() -> Self {
        Self::new(TieBreak::default())
    }
}

impl SearchCoordinator {
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            tie_break,
            next_generation: 1,
            session: None,
            state: SearchState::Idle,
            no_results_visible: false,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn session(&self) -> Option<&SearchSession> {
        self.session.as_ref()
    }

    /// Generation currently accepting resolutions, if any.
    pub fn active_generation(&self) -> Option<u64> {
        self.session
            .as_ref()
            .filter(|s| !s.closed)
            .map(|s| s.generation)
    }

    pub fn no_results_visible(&self) -> bool {
        self.no_results_visible
    }

    pub fn dismiss_no_results(&mut self) {
        self.no_results_visible = false;
    }

    /// Start a session for `raw`. When suggestions are on screen the first
    /// one's asset type is searched instead. Any previous session is
    /// superseded. Blank input is ignored, suggestions or not.
    pub fn submit(&mut self, raw: &str, suggestions: &[AssetBundle]) -> Option<SessionTicket> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let query = match suggestions.first() {
            Some(s) => s.asset_type.trim().to_string(),
            None => raw.to_string(),
        };
        if query.is_empty() {
            return None;
        }

        self.supersede();
        let generation = self.next_generation;
        self.next_generation += 1;

        let requests: Vec<LookupRequest> = LookupKind::ALL
            .iter()
            .map(|&kind| LookupRequest {
                kind,
                key: query.clone(),
                status: LookupStatus::Pending,
                found: None,
            })
            .collect();
        let lookups = requests.iter().map(|r| (r.kind, r.key.clone())).collect();

        log::info!("[search] #{generation} submit {query:?}");
        self.session = Some(SearchSession {
            generation,
            query,
            outstanding: requests.len(),
            requests,
            winner: None,
            closed: false,
        });
        self.state = SearchState::Searching;
        self.no_results_visible = false;

        Some(SessionTicket {
            generation,
            lookups,
        })
    }

    /// Fold one lookup result into the active session.
    ///
    /// Stale or duplicate resolutions leave every field untouched and
    /// return `None`.
    pub fn resolve(&mut self, res: LookupResolution) -> Option<SearchEffect> {
        let tie_break = self.tie_break;
        let Some(session) = self.session.as_mut() else {
            log::debug!("[search] drop {:?} #{}: no session", res.kind, res.generation);
            return None;
        };
        if session.closed || session.generation != res.generation {
            log::debug!(
                "[search] drop stale {} #{} (active #{}, closed={})",
                res.kind.name(),
                res.generation,
                session.generation,
                session.closed
            );
            return None;
        }
        let Some(req) = session
            .requests
            .iter_mut()
            .find(|r| r.kind == res.kind && r.status == LookupStatus::Pending)
        else {
            log::debug!("[search] duplicate {} #{}", res.kind.name(), res.generation);
            return None;
        };

        match res.outcome {
            LookupOutcome::Found(route) => {
                log::info!("[search] #{} {} -> {route}", res.generation, res.kind.name());
                req.status = LookupStatus::Resolved;
                req.found = Some(route);
            }
            LookupOutcome::NotFound => {
                req.status = LookupStatus::NotFound;
            }
            LookupOutcome::Errored(e) => {
                log::warn!("[search] #{} {} errored: {e}", res.generation, res.kind.name());
                req.status = LookupStatus::Errored;
            }
        }
        session.outstanding = session.outstanding.saturating_sub(1);

        if let Some(route) = pick_winner(&session.requests, tie_break) {
            session.winner = Some(route.clone());
            session.closed = true;
            self.state = SearchState::Resolved(route.clone());
            return Some(SearchEffect::Navigate(route));
        }

        if session.outstanding == 0 {
            session.closed = true;
            // Under KindPriority a held positive is committed by pick_winner
            // above before we get here, so reaching zero means no winner.
            log::info!("[search] #{} no results for {:?}", res.generation, session.query);
            self.state = SearchState::NotFound;
            self.no_results_visible = true;
            return Some(SearchEffect::ShowNoResults);
        }
        None
    }

    /// The navigation requested by `Resolved` has happened.
    pub fn navigated(&mut self) {
        if matches!(self.state, SearchState::Resolved(_)) {
            self.state = SearchState::Idle;
        }
    }

    /// Context changed under the search box (e.g. a new page): drop the
    /// session and return to `Idle`.
    pub fn reset(&mut self) {
        self.supersede();
        self.session = None;
        self.state = SearchState::Idle;
        self.no_results_visible = false;
    }

    fn supersede(&mut self) {
        if let Some(s) = self.session.as_mut() {
            if !s.closed {
                log::debug!("[search] #{} superseded", s.generation);
            }
            s.closed = true;
        }
    }
}

fn pick_winner(requests: &[LookupRequest], tie_break: TieBreak) -> Option<Route> {
    match tie_break {
        TieBreak::FirstResponse => requests.iter().find_map(|r| r.found.clone()),
        TieBreak::KindPriority => {
            for r in requests {
                match r.status {
                    LookupStatus::Pending => return None,
                    LookupStatus::Resolved => return r.found.clone(),
                    LookupStatus::NotFound | LookupStatus::Errored => continue,
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn res(generation: u64, kind: LookupKind, outcome: LookupOutcome) -> LookupResolution {
        LookupResolution {
            generation,
            kind,
            outcome,
        }
    }

    fn submit(c: &mut SearchCoordinator, q: &str) -> u64 {
        c.submit(q, &[]).expect("ticket").generation
    }

    #[test]
    fn submit_fans_out_one_lookup_per_kind() {
        let mut c = SearchCoordinator::default();
        let t = c.submit("  1000 ", &[]).unwrap();
        assert_eq!(t.lookups.len(), 5);
        assert!(t.lookups.iter().all(|(_, k)| k == "1000"));
        assert_eq!(c.state(), &SearchState::Searching);
        assert_eq!(c.session().unwrap().outstanding(), 5);
    }

    #[test]
    fn blank_submit_is_ignored() {
        let mut c = SearchCoordinator::default();
        assert!(c.submit("   ", &[]).is_none());
        assert_eq!(c.state(), &SearchState::Idle);
    }

    fn bundle(asset_type: &str) -> AssetBundle {
        serde_json::from_value(json!({
            "assetType": asset_type,
            "assetScheme": { "metadata": "{\"name\":\"Gold\"}" }
        }))
        .unwrap()
    }

    #[test]
    fn blank_submit_with_suggestions_is_ignored() {
        let mut c = SearchCoordinator::default();
        assert!(c.submit("   ", &[bundle("5300abcd")]).is_none());
        assert!(c.submit("", &[bundle("5300abcd")]).is_none());
        assert_eq!(c.state(), &SearchState::Idle);
        assert!(c.session().is_none());
    }

    #[test]
    fn first_suggestion_replaces_query() {
        let mut c = SearchCoordinator::default();
        let t = c.submit("gol", &[bundle("5300abcd")]).unwrap();
        assert_eq!(c.session().unwrap().query(), "5300abcd");
        assert!(t.lookups.iter().all(|(_, k)| k == "5300abcd"));
    }

    #[test]
    fn single_positive_navigates_once_in_any_order() {
        let target = Route::Block { number: 1000 };
        // every position for the positive among the five arrivals
        for pos in 0..5 {
            let mut c = SearchCoordinator::default();
            let g = submit(&mut c, "1000");
            let mut navigations = 0;
            let mut negatives = LookupKind::ALL[1..].iter();
            for i in 0..5 {
                let r = if i == pos {
                    res(g, LookupKind::Block, LookupOutcome::Found(target.clone()))
                } else {
                    let kind = *negatives.next().unwrap();
                    res(g, kind, LookupOutcome::NotFound)
                };
                match c.resolve(r) {
                    Some(SearchEffect::Navigate(route)) => {
                        assert_eq!(route, target);
                        navigations += 1;
                    }
                    Some(SearchEffect::ShowNoResults) => panic!("unexpected not-found"),
                    None => {}
                }
            }
            assert_eq!(navigations, 1, "positive at position {pos}");
            assert_eq!(c.state(), &SearchState::Resolved(target.clone()));
            assert!(!c.no_results_visible());
        }
    }

    #[test]
    fn all_negative_reaches_not_found_once() {
        let mut c = SearchCoordinator::default();
        let g = submit(&mut c, "0123456789abcdef0123456789abcd");
        let mut shown = 0;
        for (i, kind) in LookupKind::ALL.iter().enumerate() {
            let outcome = if i % 2 == 0 {
                LookupOutcome::NotFound
            } else {
                LookupOutcome::Errored("timeout".into())
            };
            if let Some(SearchEffect::ShowNoResults) = c.resolve(res(g, *kind, outcome)) {
                shown += 1;
            }
        }
        assert_eq!(shown, 1);
        assert_eq!(c.state(), &SearchState::NotFound);
        assert_eq!(c.session().unwrap().outstanding(), 0);
        assert!(c.no_results_visible());

        // late duplicate after not-found changes nothing
        let before = c.session().cloned();
        assert!(c.resolve(res(g, LookupKind::Block, LookupOutcome::NotFound)).is_none());
        assert_eq!(c.session().cloned(), before);
    }

    #[test]
    fn results_after_winner_are_ignored() {
        let mut c = SearchCoordinator::default();
        let g = submit(&mut c, "abc");
        let tx = Route::Tx { hash: "abc".into() };
        assert_eq!(
            c.resolve(res(g, LookupKind::Transaction, LookupOutcome::Found(tx.clone()))),
            Some(SearchEffect::Navigate(tx.clone()))
        );
        let snapshot = c.session().cloned();
        let asset = Route::Asset { asset_type: "abc".into() };
        assert!(c
            .resolve(res(g, LookupKind::AssetScheme, LookupOutcome::Found(asset)))
            .is_none());
        assert_eq!(c.session().cloned(), snapshot);
        assert_eq!(c.state(), &SearchState::Resolved(tx));
    }

    #[test]
    fn stale_generation_leaves_state_untouched() {
        let mut c = SearchCoordinator::default();
        let old = submit(&mut c, "first");
        let new = submit(&mut c, "second");
        assert_ne!(old, new);

        let before_session = c.session().cloned();
        let before_state = c.state().clone();
        let stale = res(
            old,
            LookupKind::Block,
            LookupOutcome::Found(Route::Block { number: 1 }),
        );
        assert!(c.resolve(stale).is_none());
        assert_eq!(c.session().cloned(), before_session);
        assert_eq!(c.state(), &before_state);
    }

    #[test]
    fn resubmit_after_not_found_starts_fresh() {
        let mut c = SearchCoordinator::default();
        let g = submit(&mut c, "nothing");
        for kind in LookupKind::ALL {
            c.resolve(res(g, kind, LookupOutcome::NotFound));
        }
        assert_eq!(c.state(), &SearchState::NotFound);

        let g2 = submit(&mut c, "1000");
        assert_eq!(c.state(), &SearchState::Searching);
        assert!(!c.no_results_visible());
        assert_eq!(c.active_generation(), Some(g2));
    }

    #[test]
    fn navigated_returns_to_idle_and_reset_drops_session() {
        let mut c = SearchCoordinator::default();
        let g = submit(&mut c, "tccq");
        let route = Route::PlatformAddress { address: "tccq".into() };
        c.resolve(res(g, LookupKind::Account, LookupOutcome::Found(route)));
        c.navigated();
        assert_eq!(c.state(), &SearchState::Idle);

        let g2 = submit(&mut c, "again");
        c.reset();
        assert_eq!(c.active_generation(), None);
        assert!(c
            .resolve(res(g2, LookupKind::Block, LookupOutcome::NotFound))
            .is_none());
        assert_eq!(c.state(), &SearchState::Idle);
    }

    #[test]
    fn kind_priority_holds_lower_priority_positive() {
        let mut c = SearchCoordinator::new(TieBreak::KindPriority);
        let g = submit(&mut c, "42");
        let account = Route::PlatformAddress { address: "42".into() };
        let block = Route::Block { number: 42 };

        assert!(c
            .resolve(res(g, LookupKind::Account, LookupOutcome::Found(account)))
            .is_none());
        assert_eq!(c.state(), &SearchState::Searching);
        assert!(c
            .resolve(res(g, LookupKind::Transaction, LookupOutcome::NotFound))
            .is_none());
        assert_eq!(
            c.resolve(res(g, LookupKind::Block, LookupOutcome::Found(block.clone()))),
            Some(SearchEffect::Navigate(block))
        );
    }

    #[test]
    fn kind_priority_commits_held_positive_when_higher_kinds_fail() {
        let mut c = SearchCoordinator::new(TieBreak::KindPriority);
        let g = submit(&mut c, "tcaq");
        let addr = Route::AssetAddress { address: "tcaq".into() };
        c.resolve(res(g, LookupKind::AddressTransactions, LookupOutcome::Found(addr.clone())));
        c.resolve(res(g, LookupKind::Block, LookupOutcome::NotFound));
        c.resolve(res(g, LookupKind::Transaction, LookupOutcome::Errored("x".into())));
        c.resolve(res(g, LookupKind::AssetScheme, LookupOutcome::NotFound));
        assert_eq!(
            c.resolve(res(g, LookupKind::Account, LookupOutcome::NotFound)),
            Some(SearchEffect::Navigate(addr))
        );
    }

    #[test]
    fn evaluate_derives_routes_per_kind() {
        assert_eq!(
            evaluate(LookupKind::Block, "1000", Ok(Fetched::Found(json!({"number": 1000})))),
            LookupOutcome::Found(Route::Block { number: 1000 })
        );
        assert_eq!(
            evaluate(
                LookupKind::Transaction,
                "0xab",
                Ok(Fetched::Found(json!({"hash": "ab"})))
            ),
            LookupOutcome::Found(Route::Tx { hash: "ab".into() })
        );
        assert_eq!(
            evaluate(LookupKind::Account, "tccq", Ok(Fetched::Found(json!({"seq": 0})))),
            LookupOutcome::Found(Route::PlatformAddress { address: "tccq".into() })
        );
        assert_eq!(
            evaluate(LookupKind::Block, "x", Ok(Fetched::NotFound)),
            LookupOutcome::NotFound
        );
        assert!(matches!(
            evaluate(LookupKind::Block, "x", Err(ApiError::Transport("reset".into()))),
            LookupOutcome::Errored(_)
        ));
    }

    #[test]
    fn empty_address_transactions_is_not_a_winner() {
        assert_eq!(
            evaluate(
                LookupKind::AddressTransactions,
                "tcaq",
                Ok(Fetched::Found(json!([])))
            ),
            LookupOutcome::NotFound
        );
        assert_eq!(
            evaluate(
                LookupKind::AddressTransactions,
                "tcaq",
                Ok(Fetched::Found(json!([{"hash": "aa"}])))
            ),
            LookupOutcome::Found(Route::AssetAddress { address: "tcaq".into() })
        );
    }

    #[test]
    fn tie_break_parses() {
        assert_eq!("first".parse::<TieBreak>().unwrap(), TieBreak::FirstResponse);
        assert_eq!("Priority".parse::<TieBreak>().unwrap(), TieBreak::KindPriority);
        assert!("random".parse::<TieBreak>().is_err());
    }
}
