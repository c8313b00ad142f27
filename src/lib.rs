//! ccx - CodeChain explorer for the terminal
//!
//! This library provides the core of ccx: an indexer client, a polling
//! fetcher, and the speculative search that probes every resource kind for
//! one query and navigates to whichever answers positively.
//!
//! ## Architecture
//!
//! - **Search**: `search` is a synchronous coordinator; `dispatch` runs its
//!   lookups as one-shot fetchers and feeds results back as events.
//! - **Suggestions**: `suggest` debounces keystrokes and tracks asset-name
//!   suggestion fetches.
//! - **Views**: `app` mounts fetchers for the current route and `ui` renders
//!   it with ratatui.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -- /block/1000
//! cargo run -- --search 0x5300...
//! ```

// Core modules
pub mod config;
pub mod types;
pub mod util_text;

// Indexer access
pub mod api;
pub mod net;
pub mod fetcher;

// Route paths
pub mod router;

// Search and suggestions
pub mod search;
pub mod dispatch;
pub mod suggest;

// Views
pub mod details;
pub mod home;
pub mod pages;

pub mod app;
pub mod ui;

pub use api::{ApiError, Fetched, HttpIndexer, IndexerApi};
pub use app::{App, AppSettings};
pub use config::Config;
pub use dispatch::resolve_query;
pub use router::Route;
pub use search::{SearchCoordinator, TieBreak};
pub use types::AppEvent;
