//! Explorer routes.
//!
//! A [`Route`] is the destination of a navigation: either typed by the user
//! as a startup argument or produced by the search coordinator.
//!
//! ## Paths
//!
//! - `/` - home (latest blocks)
//! - `/block/<number>` - block details
//! - `/tx/0x<hash>` - transaction details
//! - `/asset/<type>` - asset scheme and its transactions
//! - `/addr-platform/<address>` - platform account and its blocks
//! - `/addr-asset/<address>` - asset owner: transactions and holdings
//!
//! [`parse`] also accepts `#/...` hash paths and strips query and fragment.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Block { number: u64 },
    /// Hash without the `0x` prefix.
    Tx { hash: String },
    /// Asset type as it was looked up.
    Asset { asset_type: String },
    PlatformAddress { address: String },
    AssetAddress { address: String },
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Block { number } => write!(f, "/block/{number}"),
            Route::Tx { hash } => write!(f, "/tx/0x{hash}"),
            Route::Asset { asset_type } => write!(f, "/asset/{asset_type}"),
            Route::PlatformAddress { address } => write!(f, "/addr-platform/{address}"),
            Route::AssetAddress { address } => write!(f, "/addr-asset/{address}"),
        }
    }
}

/// Strip query and fragment from URL path
#[inline]
fn strip_query_frag(s: &str) -> &str {
    match s.find(|c: char| c == '?' || c == '#') {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Parse a route path. Returns `None` for unknown pages or malformed ids.
pub fn parse(raw: &str) -> Option<Route> {
    let s = raw.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    let path = strip_query_frag(s);

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let page = match segments.next() {
        Some(p) => p.to_ascii_lowercase(),
        None => return Some(Route::Home),
    };
    let arg = segments.next();

    let non_empty = |a: Option<&str>| a.filter(|v| !v.is_empty()).map(str::to_string);

    match page.as_str() {
        "home" => Some(Route::Home),
        "block" => {
            let number = arg?.parse::<u64>().ok()?;
            Some(Route::Block { number })
        }
        "tx" => {
            let hash = crate::api::paths::strip_0x(arg?);
            if hash.is_empty() {
                None
            } else {
                Some(Route::Tx { hash: hash.to_string() })
            }
        }
        "asset" => non_empty(arg).map(|asset_type| Route::Asset { asset_type }),
        "addr-platform" => non_empty(arg).map(|address| Route::PlatformAddress { address }),
        "addr-asset" => non_empty(arg).map(|address| Route::AssetAddress { address }),
        _ => None,
    }
}
