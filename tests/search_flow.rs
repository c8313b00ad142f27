// Integration tests: search sessions driven end to end against a scripted indexer

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::unbounded_channel;

use ccx::api::{ApiError, Fetched, IndexerApi};
use ccx::dispatch::LookupDispatcher;
use ccx::search::{SearchCoordinator, SearchEffect, SearchState};
use ccx::{resolve_query, AppEvent, Route, TieBreak};

enum Reply {
    Body(Value),
    Status(u16),
}

/// Answers each path after a fixed delay; unscripted paths are not found.
#[derive(Default)]
struct Scripted {
    replies: Mutex<HashMap<String, (u64, Reply)>>,
}

impl Scripted {
    fn new() -> Self {
        Self::default()
    }

    fn body(self, path: &str, delay_ms: u64, body: Value) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), (delay_ms, Reply::Body(body)));
        self
    }

    fn status(self, path: &str, delay_ms: u64, status: u16) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(path.to_string(), (delay_ms, Reply::Status(status)));
        self
    }

    fn arc(self) -> Arc<dyn IndexerApi> {
        Arc::new(self)
    }
}

#[async_trait]
impl IndexerApi for Scripted {
    async fn get_json(&self, path: &str) -> Result<Fetched<Value>, ApiError> {
        let reply = self.replies.lock().unwrap().get(path).map(|(d, r)| {
            let r = match r {
                Reply::Body(v) => Ok(v.clone()),
                Reply::Status(s) => Err(*s),
            };
            (*d, r)
        });
        match reply {
            None => Ok(Fetched::NotFound),
            Some((delay, r)) => {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                match r {
                    Ok(Value::Null) => Ok(Fetched::NotFound),
                    Ok(v) => Ok(Fetched::Found(v)),
                    Err(status) => Err(ApiError::Status {
                        status,
                        body: String::new(),
                    }),
                }
            }
        }
    }
}

const HASH30: &str = "0123456789abcdef0123456789abcd";

#[tokio::test(start_paused = true)]
async fn block_number_query_resolves_to_block() {
    let api = Scripted::new()
        .body("block/1000", 20, json!({"hash": "ab", "number": 1000}))
        .arc();
    let route = resolve_query(api, "1000", TieBreak::FirstResponse).await;
    assert_eq!(route, Some(Route::Block { number: 1000 }));
}

#[tokio::test(start_paused = true)]
async fn unknown_hex_string_has_no_results() {
    let api = Scripted::new()
        .status(&format!("tx/{HASH30}"), 10, 500)
        .arc();
    assert_eq!(resolve_query(api, HASH30, TieBreak::FirstResponse).await, None);
}

#[tokio::test(start_paused = true)]
async fn empty_address_history_is_not_a_hit() {
    let path = "addr-asset/tcaq/transactions?page=1&itemsPerPage=1";
    let api = Scripted::new().body(path, 5, json!([])).arc();
    assert_eq!(resolve_query(api, "tcaq", TieBreak::FirstResponse).await, None);

    let api = Scripted::new()
        .body(path, 5, json!([{"hash": "aa", "type": "transferAsset"}]))
        .arc();
    assert_eq!(
        resolve_query(api, "tcaq", TieBreak::FirstResponse).await,
        Some(Route::AssetAddress {
            address: "tcaq".into()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn first_positive_answer_wins_by_default() {
    let key = "5300aa";
    let api = Scripted::new()
        .body(&format!("asset-scheme/{key}"), 30, json!({"metadata": ""}))
        .body(&format!("account/{key}"), 10, json!({"seq": 0, "balance": "10"}))
        .arc();
    assert_eq!(
        resolve_query(api.clone(), key, TieBreak::FirstResponse).await,
        Some(Route::PlatformAddress {
            address: key.into()
        })
    );
    assert_eq!(
        resolve_query(api, key, TieBreak::KindPriority).await,
        Some(Route::Asset {
            asset_type: key.into()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn superseded_session_results_are_ignored() {
    let api = Scripted::new()
        .body("block/1", 100, json!({"hash": "01", "number": 1}))
        .body("block/2", 10, json!({"hash": "02", "number": 2}))
        .arc();
    let (tx, mut rx) = unbounded_channel();
    let mut coordinator = SearchCoordinator::new(TieBreak::FirstResponse);
    let mut dispatcher = LookupDispatcher::new(api, tx);

    let first = coordinator.submit("1", &[]).unwrap();
    dispatcher.dispatch(&first);
    let second = coordinator.submit("2", &[]).unwrap();
    dispatcher.dispatch(&second);
    assert!(second.generation > first.generation);

    let mut navigated = None;
    while let Some(ev) = rx.recv().await {
        let AppEvent::Lookup(res) = ev else { continue };
        assert_eq!(res.generation, second.generation, "cancelled lookups must not report");
        if let Some(SearchEffect::Navigate(route)) = coordinator.resolve(res) {
            navigated = Some(route);
            break;
        }
    }
    assert_eq!(navigated, Some(Route::Block { number: 2 }));
    assert_eq!(
        coordinator.state(),
        &SearchState::Resolved(Route::Block { number: 2 })
    );

    // the first session's slow block answer never arrives
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());
}
