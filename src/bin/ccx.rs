// Native binary for ccx - Terminal UI mode

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::File,
    io,
    process::ExitCode,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

use ccx::{
    api::{HttpIndexer, IndexerApi},
    app::{App, AppSettings},
    config::{load, Config},
    dispatch::resolve_query,
    types::AppEvent,
    ui,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if it exists (safe to ignore if not found)
    let _ = dotenvy::dotenv();

    init_logging()?;
    let cfg = load().context("Failed to load configuration")?;
    if log::log_enabled!(log::Level::Debug) {
        cfg.print_summary();
    }

    let api: Arc<dyn IndexerApi> = Arc::new(HttpIndexer::new(
        &cfg.indexer_url,
        cfg.request_timeout_ms,
        cfg.request_retries,
    ));

    if let Some(query) = cfg.search.clone() {
        return Ok(search_once(api, &cfg, &query).await);
    }

    // terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // app + channels
    let (tx, rx) = unbounded_channel::<AppEvent>();
    let mut app = App::new(AppSettings::from(&cfg), api, tx);
    app.start(cfg.start_route.clone());

    // main loop
    let res = run_loop(&mut app, &mut terminal, rx).await;

    // cleanup
    drop(app);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res.map(|_| ExitCode::SUCCESS)
}

/// `RUST_LOG` picks the level (default warn). With `CCX_LOG_FILE` set, logs
/// go to that file instead of stderr, which the terminal UI owns.
fn init_logging() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Ok(path) = std::env::var("CCX_LOG_FILE") {
        let file = File::create(&path).with_context(|| format!("CCX_LOG_FILE={path}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Headless `--search`: print the destination route, or report no results.
async fn search_once(api: Arc<dyn IndexerApi>, cfg: &Config, query: &str) -> ExitCode {
    match resolve_query(api, query, cfg.tie_break).await {
        Some(route) => {
            println!("{route}");
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("There are no search results.");
            ExitCode::FAILURE
        }
    }
}

async fn run_loop(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut last_frame = Instant::now();

    loop {
        // frame budget (coalesced renders)
        let frame_ms = 1000u32.saturating_div(app.fps()) as u64;
        let budget = Duration::from_millis(frame_ms.max(1));
        let wait = budget.saturating_sub(last_frame.elapsed());

        // input events
        if event::poll(wait)? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    handle_key(app, k);
                }
            }
        }
        // fetcher events
        while let Ok(ev) = rx.try_recv() {
            app.on_event(ev);
        }

        if last_frame.elapsed() >= budget {
            terminal.draw(|f| ui::draw(f, app))?;
            last_frame = Instant::now();
        }
        if app.should_quit() {
            break;
        }
        // event::poll blocks this worker; let spawned fetchers make progress
        tokio::task::yield_now().await;
    }
    Ok(())
}

fn handle_key(app: &mut App, k: KeyEvent) {
    match (k.code, k.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => app.on_event(AppEvent::Quit),
        (KeyCode::Char('l'), KeyModifiers::CONTROL) => app.load_more(),
        (KeyCode::Char('h'), KeyModifiers::CONTROL) => app.home(),
        (KeyCode::Char('b'), KeyModifiers::CONTROL) => app.back(),
        (KeyCode::Enter, _) => app.confirm(),
        (KeyCode::Tab, _) => app.accept_suggestion(),
        (KeyCode::Down, _) => app.select_next(),
        (KeyCode::Up, _) => app.select_prev(),
        (KeyCode::Esc, _) => app.escape(),
        (KeyCode::Backspace, _) => app.pop_char(),
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => app.push_char(c),
        _ => {}
    }
}
