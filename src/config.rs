use anyhow::{anyhow, Result};
use clap::Parser;

use crate::router::{self, Route};
use crate::search::TieBreak;

/// ccx - CodeChain explorer for the terminal
///
/// Searches blocks, transactions, assets and addresses on a CodeChain indexer.
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "ccx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CodeChain explorer for the terminal", long_about = None)]
pub struct CliArgs {
    /// Route to open at startup (e.g. /block/1000, /addr-platform/tccq...)
    #[arg(value_name = "ROUTE")]
    pub route: Option<String>,

    /// Resolve one query without the UI, print the destination route and exit
    #[arg(long, value_name = "QUERY")]
    pub search: Option<String>,

    /// Indexer API base URL
    #[arg(long, env = "INDEXER_URL")]
    pub indexer_url: Option<String>,

    /// Best block number polling interval in milliseconds (100-60000)
    #[arg(long, env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Indexer request timeout in milliseconds (1000-60000)
    #[arg(long, env = "REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Retry attempts for rate-limited (HTTP 429) requests (0-10); other failures wait for the next poll
    #[arg(long, env = "REQUEST_RETRIES")]
    pub request_retries: Option<u8>,

    /// Delay before asset-name suggestions are fetched (50-5000)
    #[arg(long, env = "SUGGEST_DEBOUNCE_MS")]
    pub suggest_debounce_ms: Option<u64>,

    /// Blocks shown on the home view (1-100)
    #[arg(long, env = "LATEST_BLOCKS")]
    pub latest_blocks: Option<usize>,

    /// Page size for block and transaction lists (1-100)
    #[arg(long, env = "ITEMS_PER_PAGE")]
    pub items_per_page: Option<u32>,

    /// Which positive lookup wins a search: first (earliest answer) or priority
    #[arg(long, env = "TIE_BREAK", value_parser = clap::value_parser!(TieBreak))]
    pub tie_break: Option<TieBreak>,

    /// Target UI rendering FPS (1-120)
    #[arg(long, env = "RENDER_FPS")]
    pub render_fps: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub indexer_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub request_retries: u8,
    pub suggest_debounce_ms: u64,
    pub latest_blocks: usize,
    pub items_per_page: u32,
    pub tie_break: TieBreak,
    pub render_fps: u32,
    pub start_route: Route,
    pub search: Option<String>,
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

/// Load configuration from CLI args and environment variables
/// Priority: CLI args > Environment variables > Defaults
pub fn load() -> Result<Config> {
    resolve(CliArgs::parse())
}

/// Apply defaults and range checks to parsed arguments.
pub fn resolve(args: CliArgs) -> Result<Config> {
    let indexer_url = args
        .indexer_url
        .unwrap_or_else(|| "http://127.0.0.1:8081/api".to_string());
    validate_url(&indexer_url, "INDEXER_URL")?;

    let poll_interval_ms = validate_in_range(
        args.poll_interval_ms.unwrap_or(1000),
        100,
        60000,
        "POLL_INTERVAL_MS",
    )?;
    let request_timeout_ms = validate_in_range(
        args.request_timeout_ms.unwrap_or(8000),
        1000,
        60000,
        "REQUEST_TIMEOUT_MS",
    )?;
    let request_retries =
        validate_in_range(args.request_retries.unwrap_or(0), 0, 10, "REQUEST_RETRIES")?;
    let suggest_debounce_ms = validate_in_range(
        args.suggest_debounce_ms.unwrap_or(500),
        50,
        5000,
        "SUGGEST_DEBOUNCE_MS",
    )?;
    let latest_blocks =
        validate_in_range(args.latest_blocks.unwrap_or(8), 1, 100, "LATEST_BLOCKS")?;
    let items_per_page =
        validate_in_range(args.items_per_page.unwrap_or(6), 1, 100, "ITEMS_PER_PAGE")?;
    let render_fps = validate_in_range(args.render_fps.unwrap_or(30), 1, 120, "RENDER_FPS")?;

    let start_route = match args.route.as_deref() {
        Some(raw) => {
            router::parse(raw).ok_or_else(|| anyhow!("ROUTE '{raw}' is not a known path"))?
        }
        None => Route::Home,
    };

    let search = args.search.filter(|q| !q.trim().is_empty());

    Ok(Config {
        indexer_url,
        poll_interval_ms,
        request_timeout_ms,
        request_retries,
        suggest_debounce_ms,
        latest_blocks,
        items_per_page,
        tie_break: args.tie_break.unwrap_or_default(),
        render_fps,
        start_route,
        search,
    })
}

/// Print current configuration (useful for debugging)
impl Config {
    pub fn print_summary(&self) {
        eprintln!("ccx Configuration:");
        eprintln!("  Indexer URL: {}", self.indexer_url);
        eprintln!("  Poll Interval: {}ms", self.poll_interval_ms);
        eprintln!("  Request Timeout: {}ms", self.request_timeout_ms);
        eprintln!("  Request Retries: {}", self.request_retries);
        eprintln!("  Suggest Debounce: {}ms", self.suggest_debounce_ms);
        eprintln!("  Latest Blocks: {}", self.latest_blocks);
        eprintln!("  Items Per Page: {}", self.items_per_page);
        eprintln!("  Tie Break: {:?}", self.tie_break);
        eprintln!("  Render FPS: {}", self.render_fps);
        eprintln!("  Start Route: {}", self.start_route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["ccx"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn range_check_is_inclusive() {
        assert_eq!(validate_in_range(100, 100, 200, "X").unwrap(), 100);
        assert_eq!(validate_in_range(200, 100, 200, "X").unwrap(), 200);
        let err = validate_in_range(99, 100, 200, "X").unwrap_err();
        assert_eq!(err.to_string(), "X must be in range [100, 200], got 99");
    }

    #[test]
    fn url_must_be_http() {
        assert!(validate_url("https://indexer.codechain.io/api", "U").is_ok());
        assert!(validate_url("ws://localhost", "U").is_err());
        assert!(validate_url("", "U").is_err());
    }

    #[test]
    fn cli_values_are_checked() {
        let cfg = resolve(args(&[
            "--indexer-url",
            "https://example.org/api",
            "--items-per-page",
            "12",
            "--tie-break",
            "priority",
            "/block/1000",
        ]))
        .unwrap();
        assert_eq!(cfg.indexer_url, "https://example.org/api");
        assert_eq!(cfg.items_per_page, 12);
        assert_eq!(cfg.tie_break, TieBreak::KindPriority);
        assert_eq!(cfg.start_route, Route::Block { number: 1000 });

        assert!(resolve(args(&["--poll-interval-ms", "10"])).is_err());
        assert!(resolve(args(&["--render-fps", "0"])).is_err());
        assert!(resolve(args(&["/nowhere"])).is_err());
    }

    #[test]
    fn requests_are_not_retried_by_default() {
        assert_eq!(resolve(args(&[])).unwrap().request_retries, 0);
        assert_eq!(resolve(args(&["--request-retries", "3"])).unwrap().request_retries, 3);
        assert!(resolve(args(&["--request-retries", "11"])).is_err());
    }

    #[test]
    fn blank_search_means_interactive() {
        let cfg = resolve(args(&["--search", "  "])).unwrap();
        assert!(cfg.search.is_none());
    }
}
