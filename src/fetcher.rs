//! Polling fetcher: one GET against the indexer, optionally repeated on a
//! fixed interval, reported through a [`FetchObserver`].
//!
//! Every view and list is built on this. The owner keeps the returned
//! [`FetchHandle`]; cancelling or dropping the handle unmounts the fetcher.
//! Once `cancel()` (or `drop`) has returned, no observer callback will start,
//! and a callback that was already running has finished.

use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{ApiError, Fetched, IndexerApi};

/// Receives the outcome of each attempt. Callbacks run on the fetcher task
/// while the handle's liveness lock is held, so they must not block and must
/// not drop the fetcher's own handle.
pub trait FetchObserver: Send + Sync + 'static {
    fn on_result(&self, body: Value);
    fn on_not_found(&self);
    fn on_error(&self, err: &ApiError);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchSpec {
    pub path: String,
    pub repeat: Option<Duration>,
}

impl FetchSpec {
    pub fn once(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            repeat: None,
        }
    }

    pub fn every(path: impl Into<String>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            repeat: Some(interval),
        }
    }
}

/// Unmount handle for a spawned fetcher.
pub struct FetchHandle {
    alive: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
    path: String,
}

impl FetchHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        *self.alive.lock().unwrap_or_else(|e| e.into_inner())
            && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the fetcher. Idempotent.
    pub fn cancel(&mut self) {
        {
            let mut alive = self.alive.lock().unwrap_or_else(|e| e.into_inner());
            *alive = false;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchHandle")
            .field("path", &self.path)
            .finish()
    }
}

/// Run `observer` under the liveness lock. Returns false once unmounted.
fn deliver(alive: &Mutex<bool>, f: impl FnOnce()) -> bool {
    let guard = alive.lock().unwrap_or_else(|e| e.into_inner());
    if !*guard {
        return false;
    }
    f();
    true
}

/// Spawn a fetcher on the current tokio runtime.
///
/// Errors are reported once per attempt; there is no immediate retry; a
/// repeating fetcher simply tries again on its next tick.
pub fn spawn_fetch<O: FetchObserver>(
    api: Arc<dyn IndexerApi>,
    spec: FetchSpec,
    observer: O,
) -> FetchHandle {
    let alive = Arc::new(Mutex::new(true));
    let task_alive = alive.clone();
    let path = spec.path.clone();

    let task = tokio::spawn(async move {
        loop {
            let res = api.get_json(&spec.path).await;
            let delivered = match res {
                Ok(Fetched::Found(body)) => deliver(&task_alive, || observer.on_result(body)),
                Ok(Fetched::NotFound) => deliver(&task_alive, || observer.on_not_found()),
                Err(e) => {
                    if e.is_transient() {
                        log::warn!("[fetch] {} failed: {e}", spec.path);
                    } else {
                        log::debug!("[fetch] {} failed: {e}", spec.path);
                    }
                    deliver(&task_alive, || observer.on_error(&e))
                }
            };
            if !delivered {
                log::debug!("[fetch] {} unmounted, dropping result", spec.path);
                break;
            }
            match spec.repeat {
                Some(every) => tokio::time::sleep(every).await,
                None => break,
            }
        }
    });

    FetchHandle {
        alive,
        task: Some(task),
        path,
    }
}
