//! Indexer API client.
//!
//! The indexer is a plain HTTP/JSON service. Absence of a resource is not an
//! error: a 404 (or a literal `null` body) comes back as [`Fetched::NotFound`]
//! so callers can drive their not-found states without inspecting errors.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Failure taxonomy for a single indexer request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Transient errors are worth another attempt on the next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            ApiError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

/// Outcome of a successful round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
}

impl Fetched<Value> {
    /// Decode a found body into a typed document.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Fetched<T>, ApiError> {
        match self {
            Fetched::Found(v) => serde_json::from_value(v)
                .map(Fetched::Found)
                .map_err(|e| ApiError::Decode(e.to_string())),
            Fetched::NotFound => Ok(Fetched::NotFound),
        }
    }
}

/// The seam between the explorer and the indexing service.
///
/// Paths are relative to the API root (no leading slash), e.g. `block/1000`.
#[async_trait]
pub trait IndexerApi: Send + Sync + 'static {
    async fn get_json(&self, path: &str) -> Result<Fetched<Value>, ApiError>;
}

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

pub(crate) fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("[api] falling back to default reqwest client: {e}");
                reqwest::Client::new()
            })
    })
}

/// HTTP implementation of [`IndexerApi`].
#[derive(Clone, Debug)]
pub struct HttpIndexer {
    base_url: String,
    timeout: Duration,
    /// How often a 429 is waited out; see [`crate::net::send_with_backoff`].
    retries: u8,
}

impl HttpIndexer {
    pub fn new(base_url: &str, timeout_ms: u64, retries: u8) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(timeout_ms),
            retries,
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl IndexerApi for HttpIndexer {
    async fn get_json(&self, path: &str) -> Result<Fetched<Value>, ApiError> {
        let url = self.url_for(path);
        log::debug!("[api] GET {url}");

        let rb = http_client().get(&url).timeout(self.timeout);
        let res = crate::net::send_with_backoff(rb, path, self.retries).await?;

        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            log::debug!("[api] {path} -> 404");
            return Ok(Fetched::NotFound);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let v: Value = res.json().await?;
        if v.is_null() {
            return Ok(Fetched::NotFound);
        }
        Ok(Fetched::Found(v))
    }
}

/// Path builders for the indexer resources the explorer uses.
pub mod paths {
    use urlencoding::encode;

    /// Drop a leading `0x`/`0X` from hex-like identifiers.
    pub fn strip_0x(s: &str) -> &str {
        s.strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s)
    }

    pub fn block(id: &str) -> String {
        format!("block/{}", encode(id))
    }

    pub fn best_block_number() -> String {
        "block/latest-number".to_string()
    }

    pub fn tx(hash: &str) -> String {
        format!("tx/{}", encode(strip_0x(hash)))
    }

    pub fn asset_scheme(asset_type: &str) -> String {
        format!("asset-scheme/{}", encode(strip_0x(asset_type)))
    }

    pub fn account(address: &str) -> String {
        format!("account/{}", encode(address))
    }

    pub fn asset_address_transactions(address: &str, page: u32, per_page: u32) -> String {
        format!(
            "addr-asset/{}/transactions?page={page}&itemsPerPage={per_page}",
            encode(address)
        )
    }

    pub fn asset_address_utxo(address: &str) -> String {
        format!("addr-asset/{}/utxo", encode(address))
    }

    pub fn platform_address_blocks(address: &str, page: u32, per_page: u32) -> String {
        format!(
            "addr-platform/{}/blocks?page={page}&itemsPerPage={per_page}",
            encode(address)
        )
    }

    pub fn asset_transactions(asset_type: &str, page: u32, per_page: u32) -> String {
        format!(
            "asset/{}/transactions?page={page}&itemsPerPage={per_page}",
            encode(strip_0x(asset_type))
        )
    }

    pub fn asset_search(name: &str) -> String {
        format!("asset/search?name={}", encode(name))
    }
}
