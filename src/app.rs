use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{paths, ApiError, IndexerApi};
use crate::config::Config;
use crate::details::{self, ViewContext};
use crate::dispatch::LookupDispatcher;
use crate::fetcher::{spawn_fetch, FetchHandle, FetchObserver, FetchSpec};
use crate::home::LatestBlocks;
use crate::pages::PagedList;
use crate::router::Route;
use crate::search::{SearchCoordinator, SearchEffect, SearchState, TieBreak};
use crate::suggest::{Debouncer, SuggestionTracker};
use crate::types::{
    AccountDoc, AggsUtxo, AppEvent, AssetBundle, AssetSchemeDoc, BlockDoc, PageEvent,
    TransactionDoc,
};

const BACK_STACK_LIMIT: usize = 50;

#[derive(Clone, Debug)]
pub struct AppSettings {
    pub poll_interval: Duration,
    pub suggest_debounce: Duration,
    pub latest_blocks: usize,
    pub items_per_page: u32,
    pub tie_break: TieBreak,
    pub render_fps: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            suggest_debounce: Duration::from_millis(500),
            latest_blocks: 8,
            items_per_page: 6,
            tie_break: TieBreak::default(),
            render_fps: 30,
        }
    }
}

impl From<&Config> for AppSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(cfg.poll_interval_ms),
            suggest_debounce: Duration::from_millis(cfg.suggest_debounce_ms),
            latest_blocks: cfg.latest_blocks,
            items_per_page: cfg.items_per_page,
            tie_break: cfg.tie_break,
            render_fps: cfg.render_fps,
        }
    }
}

/// A single document slot of a view.
#[derive(Clone, Debug, PartialEq)]
pub enum Load<T> {
    Loading,
    Ready(T),
    Missing,
    Failed(String),
}

impl<T> Load<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Load::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// State of the page the current route shows.
#[derive(Debug)]
pub enum View {
    Home,
    Block(Load<BlockDoc>),
    Tx(Load<TransactionDoc>),
    Asset {
        scheme: Load<AssetSchemeDoc>,
        txs: PagedList<TransactionDoc>,
    },
    PlatformAddress {
        account: Load<AccountDoc>,
        blocks: PagedList<BlockDoc>,
    },
    AssetAddress {
        utxos: Load<Vec<AggsUtxo>>,
        txs: PagedList<TransactionDoc>,
    },
}

impl View {
    fn primary_missing(&mut self) {
        match self {
            View::Home => {}
            View::Block(slot) => *slot = Load::Missing,
            View::Tx(slot) => *slot = Load::Missing,
            View::Asset { scheme, .. } => *scheme = Load::Missing,
            View::PlatformAddress { account, .. } => *account = Load::Missing,
            View::AssetAddress { utxos, .. } => *utxos = Load::Ready(Vec::new()),
        }
    }

    fn primary_failed(&mut self, err: String) {
        match self {
            View::Home => {}
            View::Block(slot) => *slot = Load::Failed(err),
            View::Tx(slot) => *slot = Load::Failed(err),
            View::Asset { scheme, .. } => *scheme = Load::Failed(err),
            View::PlatformAddress { account, .. } => *account = Load::Failed(err),
            View::AssetAddress { utxos, .. } => *utxos = Load::Failed(err),
        }
    }

    fn list_failed(&mut self) {
        match self {
            View::Asset { txs, .. } | View::AssetAddress { txs, .. } => txs.on_failed(),
            View::PlatformAddress { blocks, .. } => blocks.on_failed(),
            _ => {}
        }
    }
}

/// What a page fetch loads; decides how its answer is reported.
#[derive(Clone, Copy, Debug)]
enum PageFetch {
    Block,
    LatestBlock(u64),
    Transaction,
    AssetScheme,
    Account,
    Blocks,
    Transactions,
    Utxos,
}

impl PageFetch {
    fn decode(self, body: Value) -> Result<PageEvent, serde_json::Error> {
        Ok(match self {
            PageFetch::Block | PageFetch::LatestBlock(_) => {
                PageEvent::Block(serde_json::from_value(body)?)
            }
            PageFetch::Transaction => PageEvent::Transaction(serde_json::from_value(body)?),
            PageFetch::AssetScheme => PageEvent::AssetScheme(serde_json::from_value(body)?),
            PageFetch::Account => PageEvent::Account(serde_json::from_value(body)?),
            PageFetch::Blocks => PageEvent::Blocks(serde_json::from_value(body)?),
            PageFetch::Transactions => PageEvent::Transactions(serde_json::from_value(body)?),
            PageFetch::Utxos => PageEvent::Utxos(serde_json::from_value(body)?),
        })
    }

    fn missing(self) -> PageEvent {
        match self {
            PageFetch::LatestBlock(n) => PageEvent::BlockMissing(n),
            PageFetch::Blocks => PageEvent::Blocks(Vec::new()),
            PageFetch::Transactions => PageEvent::Transactions(Vec::new()),
            PageFetch::Utxos => PageEvent::Utxos(Vec::new()),
            _ => PageEvent::NotFound,
        }
    }

    fn failed(self, err: String) -> PageEvent {
        match self {
            PageFetch::LatestBlock(n) => PageEvent::BlockMissing(n),
            PageFetch::Blocks | PageFetch::Transactions => PageEvent::ListFailed(err),
            _ => PageEvent::Failed(err),
        }
    }
}

struct PageObserver {
    epoch: u64,
    fetch: PageFetch,
    events: UnboundedSender<AppEvent>,
}

impl PageObserver {
    fn post(&self, event: PageEvent) {
        let _ = self.events.send(AppEvent::Page {
            epoch: self.epoch,
            event,
        });
    }
}

impl FetchObserver for PageObserver {
    fn on_result(&self, body: Value) {
        let event = self
            .fetch
            .decode(body)
            .unwrap_or_else(|e| self.fetch.failed(format!("decode error: {e}")));
        self.post(event);
    }
    fn on_not_found(&self) {
        self.post(self.fetch.missing());
    }
    fn on_error(&self, err: &ApiError) {
        self.post(self.fetch.failed(err.to_string()));
    }
}

struct BestBlockObserver {
    events: UnboundedSender<AppEvent>,
}

impl FetchObserver for BestBlockObserver {
    fn on_result(&self, body: Value) {
        // the indexer sends the number either bare or quoted
        let n = body
            .as_u64()
            .or_else(|| body.as_str().and_then(|s| s.parse().ok()));
        match n {
            Some(n) => {
                let _ = self.events.send(AppEvent::BestBlockNumber(n));
            }
            None => log::warn!("[home] unexpected best block number: {body}"),
        }
    }
    fn on_not_found(&self) {
        log::debug!("[home] best block number not available yet");
    }
    fn on_error(&self, _err: &ApiError) {}
}

struct SuggestObserver {
    generation: u64,
    events: UnboundedSender<AppEvent>,
}

impl SuggestObserver {
    fn post(&self, result: Result<Vec<AssetBundle>, String>) {
        let _ = self.events.send(AppEvent::Suggestions {
            generation: self.generation,
            result,
        });
    }
}

impl FetchObserver for SuggestObserver {
    fn on_result(&self, body: Value) {
        self.post(serde_json::from_value(body).map_err(|e| format!("decode error: {e}")));
    }
    fn on_not_found(&self) {
        self.post(Ok(Vec::new()));
    }
    fn on_error(&self, err: &ApiError) {
        self.post(Err(err.to_string()));
    }
}

pub struct App {
    settings: AppSettings,
    api: Arc<dyn IndexerApi>,
    events: UnboundedSender<AppEvent>,

    input: String,
    search: SearchCoordinator,
    dispatcher: LookupDispatcher,
    suggest: SuggestionTracker,
    debouncer: Debouncer,
    suggest_fetch: Option<FetchHandle>,

    route: Route,
    view: View,
    epoch: u64,
    page_fetches: Vec<FetchHandle>,
    back_stack: Vec<Route>,
    link_cursor: Option<usize>,

    best_block: Option<u64>,
    latest: LatestBlocks,
    best_poller: Option<FetchHandle>,

    quit: bool,
}

impl App {
    pub fn new(
        settings: AppSettings,
        api: Arc<dyn IndexerApi>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            search: SearchCoordinator::new(settings.tie_break),
            dispatcher: LookupDispatcher::new(api.clone(), events.clone()),
            suggest: SuggestionTracker::new(),
            debouncer: Debouncer::new(settings.suggest_debounce),
            suggest_fetch: None,
            input: String::new(),
            route: Route::Home,
            view: View::Home,
            epoch: 0,
            page_fetches: Vec::new(),
            back_stack: Vec::new(),
            link_cursor: None,
            best_block: None,
            latest: LatestBlocks::new(settings.latest_blocks),
            best_poller: None,
            quit: false,
            settings,
            api,
            events,
        }
    }

    /// Start polling the best block number and mount `route`.
    pub fn start(&mut self, route: Route) {
        self.best_poller = Some(spawn_fetch(
            self.api.clone(),
            FetchSpec::every(paths::best_block_number(), self.settings.poll_interval),
            BestBlockObserver {
                events: self.events.clone(),
            },
        ));
        self.go(route);
    }

    // ----- accessors -----

    pub fn fps(&self) -> u32 {
        self.settings.render_fps
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn search(&self) -> &SearchCoordinator {
        &self.search
    }

    pub fn suggestions(&self) -> &SuggestionTracker {
        &self.suggest
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn latest_blocks(&self) -> &LatestBlocks {
        &self.latest
    }

    pub fn best_block(&self) -> Option<u64> {
        self.best_block
    }

    pub fn can_go_back(&self) -> bool {
        !self.back_stack.is_empty()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn lookups_in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Short status shown next to the search box.
    pub fn search_status(&self) -> &'static str {
        match self.search.state() {
            SearchState::Searching => "searching...",
            SearchState::NotFound => "no results",
            SearchState::Idle | SearchState::Resolved(_) => "",
        }
    }

    // ----- input -----

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
        self.on_input_changed();
    }

    pub fn pop_char(&mut self) {
        if self.input.pop().is_some() {
            self.on_input_changed();
        }
    }

    pub fn set_input(&mut self, value: &str) {
        self.input = value.to_string();
        self.on_input_changed();
    }

    fn on_input_changed(&mut self) {
        self.search.dismiss_no_results();
        if self.input.trim().is_empty() {
            self.clear_suggestions();
            return;
        }
        let events = self.events.clone();
        self.debouncer.call(async move {
            let _ = events.send(AppEvent::SuggestDue);
        });
    }

    /// Down: next suggestion while the list is shown, otherwise next link.
    pub fn select_next(&mut self) {
        if !self.suggest.suggestions().is_empty() {
            self.suggest.select_next();
            return;
        }
        let len = self.links().len();
        if len > 0 {
            self.link_cursor = Some(match self.link_cursor {
                Some(i) if i + 1 < len => i + 1,
                _ => 0,
            });
        }
    }

    /// Up: previous suggestion while the list is shown, otherwise previous link.
    pub fn select_prev(&mut self) {
        if !self.suggest.suggestions().is_empty() {
            self.suggest.select_prev();
            return;
        }
        let len = self.links().len();
        if len > 0 {
            self.link_cursor = Some(match self.link_cursor {
                Some(i) if i > 0 && i <= len => i - 1,
                _ => len - 1,
            });
        }
    }

    /// Put the highlighted suggestion into the search box.
    pub fn accept_suggestion(&mut self) {
        let Some(asset_type) = self.suggest.selected().map(|s| s.asset_type.clone()) else {
            return;
        };
        self.input = format!("0x{asset_type}");
        self.clear_suggestions();
    }

    /// Esc: close the popover, then the suggestion list, then the input.
    pub fn escape(&mut self) {
        if self.search.no_results_visible() {
            self.search.dismiss_no_results();
        } else if !self.suggest.suggestions().is_empty() {
            self.clear_suggestions();
        } else {
            self.input.clear();
            self.clear_suggestions();
        }
    }

    fn clear_suggestions(&mut self) {
        self.debouncer.cancel();
        self.suggest_fetch = None;
        self.suggest.clear();
    }

    /// Enter: search the box, or follow the selected link when it is blank.
    pub fn confirm(&mut self) {
        if self.input.trim().is_empty() {
            self.follow_link();
        } else {
            self.submit();
        }
    }

    pub fn submit(&mut self) {
        let ticket = self.search.submit(&self.input, self.suggest.suggestions());
        self.clear_suggestions();
        if let Some(ticket) = ticket {
            self.dispatcher.dispatch(&ticket);
        }
    }

    fn fetch_suggestions(&mut self) {
        let Some(ticket) = self.suggest.begin(&self.input) else {
            self.clear_suggestions();
            return;
        };
        log::debug!("[suggest] #{} fetching {:?}", ticket.generation, ticket.query);
        self.suggest_fetch = Some(spawn_fetch(
            self.api.clone(),
            FetchSpec::once(paths::asset_search(&ticket.query)),
            SuggestObserver {
                generation: ticket.generation,
                events: self.events.clone(),
            },
        ));
    }

    // ----- links -----

    /// Routes the current view links to, top to bottom as drawn.
    pub fn links(&self) -> Vec<Route> {
        match (&self.route, &self.view) {
            (_, View::Home) => self.latest.blocks().map(details::block_link).collect(),
            (_, View::Block(slot)) => slot
                .ready()
                .map(|b| {
                    details::row_links(&details::block_rows(b))
                        .chain(b.transactions.iter().map(details::tx_link))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
            (_, View::Tx(slot)) => slot
                .ready()
                .map(|t| {
                    details::row_links(&details::transaction_rows(t, &ViewContext::default()))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
            (Route::Asset { asset_type }, View::Asset { scheme, txs }) => {
                let mut links: Vec<Route> = scheme
                    .ready()
                    .map(|s| {
                        let rows = details::asset_scheme_rows(paths::strip_0x(asset_type), s);
                        details::row_links(&rows).collect()
                    })
                    .unwrap_or_default();
                links.extend(txs.items().iter().map(details::tx_link));
                links
            }
            (_, View::PlatformAddress { account, blocks }) => {
                let mut links: Vec<Route> = account
                    .ready()
                    .map(|a| details::row_links(&details::account_rows(a)).collect())
                    .unwrap_or_default();
                links.extend(blocks.items().iter().map(details::block_link));
                links
            }
            (_, View::AssetAddress { utxos, txs }) => {
                let mut links: Vec<Route> = utxos
                    .ready()
                    .map(|list| list.iter().map(details::utxo_link).collect())
                    .unwrap_or_default();
                links.extend(txs.items().iter().map(details::tx_link));
                links
            }
            _ => Vec::new(),
        }
    }

    pub fn selected_link(&self) -> Option<Route> {
        let i = self.link_cursor?;
        self.links().into_iter().nth(i)
    }

    /// Post a navigation to the selected link; it is applied by `on_event`.
    pub fn follow_link(&mut self) {
        if let Some(route) = self.selected_link() {
            log::debug!("[app] follow link {route}");
            let _ = self.events.send(AppEvent::Navigate(route));
        }
    }

    // ----- navigation -----

    pub fn navigate(&mut self, route: Route) {
        if route == self.route {
            return;
        }
        let prev = std::mem::replace(&mut self.route, Route::Home);
        self.back_stack.push(prev);
        if self.back_stack.len() > BACK_STACK_LIMIT {
            self.back_stack.remove(0);
        }
        self.go(route);
    }

    pub fn back(&mut self) {
        if let Some(route) = self.back_stack.pop() {
            self.go(route);
        }
    }

    pub fn home(&mut self) {
        self.navigate(Route::Home);
    }

    /// Unmount the current page and mount `route`.
    fn go(&mut self, route: Route) {
        log::info!("[app] navigate {route}");
        self.search.reset();
        self.dispatcher.cancel_all();
        self.input.clear();
        self.clear_suggestions();

        self.page_fetches.clear();
        self.epoch += 1;
        self.link_cursor = None;
        self.route = route.clone();

        let per_page = self.settings.items_per_page;
        self.view = match &route {
            Route::Home => {
                self.latest = LatestBlocks::new(self.settings.latest_blocks);
                if let Some(best) = self.best_block {
                    self.request_latest(best);
                }
                View::Home
            }
            Route::Block { number } => {
                self.spawn_page(paths::block(&number.to_string()), PageFetch::Block);
                View::Block(Load::Loading)
            }
            Route::Tx { hash } => {
                self.spawn_page(paths::tx(hash), PageFetch::Transaction);
                View::Tx(Load::Loading)
            }
            Route::Asset { asset_type } => {
                self.spawn_page(paths::asset_scheme(asset_type), PageFetch::AssetScheme);
                View::Asset {
                    scheme: Load::Loading,
                    txs: PagedList::new(per_page),
                }
            }
            Route::PlatformAddress { address } => {
                self.spawn_page(paths::account(address), PageFetch::Account);
                View::PlatformAddress {
                    account: Load::Loading,
                    blocks: PagedList::new(per_page),
                }
            }
            Route::AssetAddress { address } => {
                self.spawn_page(paths::asset_address_utxo(address), PageFetch::Utxos);
                View::AssetAddress {
                    utxos: Load::Loading,
                    txs: PagedList::new(per_page),
                }
            }
        };
        self.load_more();
    }

    /// Fetch the next page of the current view's list, if it has one.
    pub fn load_more(&mut self) {
        let request = match (&self.route, &mut self.view) {
            (Route::Asset { asset_type }, View::Asset { txs, .. }) => txs.next_request().map(|page| {
                (
                    paths::asset_transactions(asset_type, page, txs.per_page()),
                    PageFetch::Transactions,
                )
            }),
            (Route::PlatformAddress { address }, View::PlatformAddress { blocks, .. }) => {
                blocks.next_request().map(|page| {
                    (
                        paths::platform_address_blocks(address, page, blocks.per_page()),
                        PageFetch::Blocks,
                    )
                })
            }
            (Route::AssetAddress { address }, View::AssetAddress { txs, .. }) => {
                txs.next_request().map(|page| {
                    (
                        paths::asset_address_transactions(address, page, txs.per_page()),
                        PageFetch::Transactions,
                    )
                })
            }
            _ => None,
        };
        if let Some((path, fetch)) = request {
            self.spawn_page(path, fetch);
        }
    }

    fn spawn_page(&mut self, path: String, fetch: PageFetch) {
        self.page_fetches.retain(FetchHandle::is_active);
        let observer = PageObserver {
            epoch: self.epoch,
            fetch,
            events: self.events.clone(),
        };
        self.page_fetches
            .push(spawn_fetch(self.api.clone(), FetchSpec::once(path), observer));
    }

    fn request_latest(&mut self, best: u64) {
        for n in self.latest.on_best_block_number(best) {
            self.spawn_page(paths::block(&n.to_string()), PageFetch::LatestBlock(n));
        }
    }

    // ----- events -----

    pub fn on_event(&mut self, ev: AppEvent) {
        match ev {
            AppEvent::Lookup(res) => match self.search.resolve(res) {
                Some(SearchEffect::Navigate(route)) => {
                    self.dispatcher.cancel_all();
                    self.search.navigated();
                    self.navigate(route);
                }
                Some(SearchEffect::ShowNoResults) => self.dispatcher.cancel_all(),
                None => {}
            },
            AppEvent::SuggestDue => self.fetch_suggestions(),
            AppEvent::Suggestions { generation, result } => match result {
                Ok(list) => {
                    self.suggest.complete(generation, list);
                }
                Err(e) => self.suggest.fail(generation, &e),
            },
            AppEvent::BestBlockNumber(n) => {
                if self.best_block.is_some_and(|b| n < b) {
                    return;
                }
                self.best_block = Some(n);
                if self.route == Route::Home {
                    self.request_latest(n);
                }
            }
            AppEvent::Page { epoch, event } => {
                if epoch != self.epoch {
                    log::debug!("[app] drop page event from epoch {epoch} (now {})", self.epoch);
                    return;
                }
                self.apply_page(event);
            }
            AppEvent::Navigate(route) => self.navigate(route),
            AppEvent::Quit => self.quit = true,
        }
    }

    fn apply_page(&mut self, event: PageEvent) {
        match (&mut self.view, event) {
            (View::Home, PageEvent::Block(b)) => self.latest.on_block(b),
            (View::Home, PageEvent::BlockMissing(n)) => self.latest.on_block_failed(n),
            (View::Block(slot), PageEvent::Block(b)) => *slot = Load::Ready(b),
            (View::Tx(slot), PageEvent::Transaction(t)) => *slot = Load::Ready(t),
            (View::Asset { scheme, .. }, PageEvent::AssetScheme(s)) => *scheme = Load::Ready(s),
            (View::PlatformAddress { account, .. }, PageEvent::Account(a)) => {
                *account = Load::Ready(a)
            }
            (View::PlatformAddress { blocks, .. }, PageEvent::Blocks(page)) => blocks.on_page(page),
            (View::Asset { txs, .. } | View::AssetAddress { txs, .. }, PageEvent::Transactions(page)) => {
                txs.on_page(page)
            }
            (View::AssetAddress { utxos, .. }, PageEvent::Utxos(list)) => *utxos = Load::Ready(list),
            (view, PageEvent::NotFound) => view.primary_missing(),
            (view, PageEvent::Failed(err)) => {
                log::warn!("[app] {} failed: {err}", self.route);
                view.primary_failed(err);
            }
            (view, PageEvent::ListFailed(err)) => {
                log::warn!("[app] {} list page failed: {err}", self.route);
                view.list_failed();
            }
            (_, other) => log::debug!("[app] unexpected page event {other:?}"),
        }
    }
}
