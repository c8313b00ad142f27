use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint, Rect},
    widgets::{Block, Borders, BorderType, List, ListItem, ListState, Paragraph, Wrap, Clear},
    style::{Color, Style, Modifier},
    text::{Line, Span},
};
use crate::app::{App, Load, View};
use crate::details::{self, DetailRow, ViewContext};
use crate::pages::PagedList;
use crate::router::Route;
use crate::suggest::SuggestStatus;
use crate::types::{BlockDoc, TransactionDoc};
use crate::util_text::{format_timestamp, truncate_middle};

const PLACEHOLDER: &str = "Block / Tx / Asset / Address";
const NO_RESULTS: &str = "There are no search results.";
const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;

// ===============================
// Top-level draw
// ===============================
pub fn draw(f:&mut Frame, app:&App){
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),   // search box
            Constraint::Min(0),      // body
            Constraint::Length(1),   // footer
        ])
        .split(f.area());

    search_box(f, chunks[0], app);
    body(f, chunks[1], app);
    footer(f, chunks[2], app);

    // Overlays render last
    if !app.suggestions().suggestions().is_empty() {
        draw_suggestions(f, chunks[0], app);
    }
    if app.search().no_results_visible() {
        draw_no_results(f, chunks[0]);
    }
}

// ===============================
// Search box + overlays
// ===============================
fn search_box(f:&mut Frame, area:Rect, app:&App){
    let input = app.input();
    let mut title = vec![Span::raw(" Search ")];
    let status = app.search_status();
    if !status.is_empty() {
        title.push(Span::styled(format!("({status}) "), Style::default().fg(Color::Yellow)));
    }
    if app.suggestions().status() == SuggestStatus::Loading {
        title.push(Span::styled("(suggesting...) ", Style::default().fg(DIM)));
    }

    let text = if input.is_empty() {
        Line::from(Span::styled(PLACEHOLDER, Style::default().fg(DIM)))
    } else {
        Line::from(input.to_string())
    };
    let paragraph = Paragraph::new(text)
        .block(Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(ACCENT)));
    f.render_widget(paragraph, area);

    if area.width > 2 {
        let x = area.x + 1 + (input.chars().count().min(area.width.saturating_sub(2) as usize) as u16);
        f.set_cursor_position((x, area.y + 1));
    }
}

fn draw_suggestions(f:&mut Frame, anchor:Rect, app:&App){
    let tracker = app.suggestions();
    let items: Vec<ListItem> = tracker.suggestions().iter().map(|s| {
        ListItem::new(Line::from(vec![
            Span::styled(s.display_name(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(format!("0x{}", truncate_middle(&s.asset_type, 24)), Style::default().fg(DIM)),
        ]))
    }).collect();

    let height = (items.len() as u16 + 2).min(10);
    let overlay = below(anchor, height, f.area());
    f.render_widget(Clear, overlay);

    let list = List::new(items)
        .block(Block::default()
            .title(" Assets (Tab: accept) ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded))
        .highlight_style(Style::default().fg(Color::Black).bg(ACCENT))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(tracker.selected_index()));
    f.render_stateful_widget(list, overlay, &mut state);
}

fn draw_no_results(f:&mut Frame, anchor:Rect){
    let width = (NO_RESULTS.len() as u16 + 4).min(anchor.width);
    let overlay = Rect { width, ..below(anchor, 3, f.area()) };
    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(NO_RESULTS)
        .style(Style::default().fg(Color::Red))
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(paragraph, overlay);
}

/// Rect of `height` rows directly under `anchor`, clipped to `screen`.
fn below(anchor:Rect, height:u16, screen:Rect) -> Rect {
    let y = anchor.y + anchor.height;
    let height = height.min(screen.height.saturating_sub(y));
    Rect { x: anchor.x, y, width: anchor.width, height }
}

// ===============================
// Body
// ===============================
fn body(f:&mut Frame, area:Rect, app:&App){
    let route = app.route();
    let title = format!(" {} ", route);
    let sel = app.selected_link();
    let sel = sel.as_ref();
    let block = Block::default().title(title).borders(Borders::ALL).border_type(BorderType::Plain);

    let lines: Vec<Line> = match (route, app.view()) {
        (_, View::Home) => home_lines(app, sel),
        (_, View::Block(slot)) => load_lines(slot, "Block not found.", |b| {
            let mut lines = row_lines(&details::block_rows(b), sel);
            lines.push(Line::raw(""));
            lines.push(section("Transactions"));
            lines.extend(b.transactions.iter().map(|t| mark(tx_summary(t), &details::tx_link(t), sel)));
            lines
        }),
        (_, View::Tx(slot)) => load_lines(slot, "Transaction not found.", |t| {
            row_lines(&details::transaction_rows(t, &ViewContext::default()), sel)
        }),
        (Route::Asset { asset_type }, View::Asset { scheme, txs }) => {
            let mut lines = load_lines(scheme, "The asset does not exist.", |s| {
                row_lines(&details::asset_scheme_rows(crate::api::paths::strip_0x(asset_type), s), sel)
            });
            lines.push(Line::raw(""));
            lines.push(section("Transactions"));
            lines.extend(list_lines(txs, |t| mark(tx_summary(t), &details::tx_link(t), sel)));
            lines
        }
        (Route::PlatformAddress { address }, View::PlatformAddress { account, blocks }) => {
            let mut lines = match account {
                Load::Missing => vec![
                    Line::styled("The address does not exist.", Style::default().fg(Color::Red)),
                    Line::styled(address.clone(), Style::default().fg(DIM)),
                ],
                other => load_lines(other, "", |a| row_lines(&details::account_rows(a), sel)),
            };
            lines.push(Line::raw(""));
            lines.push(section("Authored blocks"));
            lines.extend(list_lines(blocks, |b| mark(block_summary(b), &details::block_link(b), sel)));
            lines
        }
        (Route::AssetAddress { address }, View::AssetAddress { utxos, txs }) => {
            let mut lines = vec![section("Assets")];
            lines.extend(load_lines(utxos, "", |list| {
                if list.is_empty() {
                    return vec![Line::styled("No assets", Style::default().fg(DIM))];
                }
                list.iter().map(|u| mark(Line::from(vec![
                    Span::styled(u.display_name(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!(" x {}", u.total_asset_quantity)),
                ]), &details::utxo_link(u), sel)).collect()
            }));
            lines.push(Line::raw(""));
            lines.push(section("Transactions"));
            let ctx = ViewContext { owner: Some(address.clone()), asset_type: None };
            lines.extend(list_lines(txs, |t| mark(owner_tx_summary(t, &ctx), &details::tx_link(t), sel)));
            lines
        }
        _ => vec![Line::raw("")],
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn home_lines(app:&App, sel:Option<&Route>) -> Vec<Line<'static>> {
    let mut lines = vec![section("Latest blocks")];
    let latest = app.latest_blocks();
    if latest.is_empty() {
        lines.push(Line::styled("Loading...", Style::default().fg(DIM)));
    }
    lines.extend(latest.blocks().map(|b| mark(block_summary(b), &details::block_link(b), sel)));
    lines
}

fn section(title:&str) -> Line<'static> {
    Line::styled(title.to_string(), Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
}

fn load_lines<'a, T>(slot:&'a Load<T>, missing:&str, ready:impl FnOnce(&'a T) -> Vec<Line<'static>>) -> Vec<Line<'static>> {
    match slot {
        Load::Loading => vec![Line::styled("Loading...", Style::default().fg(DIM))],
        Load::Ready(v) => ready(v),
        Load::Missing => vec![Line::styled(missing.to_string(), Style::default().fg(Color::Red))],
        Load::Failed(e) => vec![Line::styled(format!("Failed to load: {e}"), Style::default().fg(Color::Red))],
    }
}

fn list_lines<T>(list:&PagedList<T>, line:impl Fn(&T) -> Line<'static>) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = list.items().iter().map(line).collect();
    if list.is_loading() {
        lines.push(Line::styled("Loading...", Style::default().fg(DIM)));
    } else if list.no_more() {
        if list.items().is_empty() {
            lines.push(Line::styled("None", Style::default().fg(DIM)));
        }
    } else {
        lines.push(Line::styled("Ctrl+L: load more", Style::default().fg(DIM)));
    }
    lines
}

fn row_lines(rows:&[DetailRow], sel:Option<&Route>) -> Vec<Line<'static>> {
    rows.iter().map(|r| {
        let mut style = Style::default();
        if r.link.is_some() { style = style.fg(ACCENT).add_modifier(Modifier::UNDERLINED); }
        if r.highlight { style = style.add_modifier(Modifier::BOLD).fg(Color::Yellow); }
        let line = Line::from(vec![
            Span::styled(format!("{:<20}", r.label), Style::default().fg(DIM)),
            Span::styled(r.value.clone(), style),
        ]);
        match &r.link {
            Some(link) => mark(line, link, sel),
            None => line,
        }
    }).collect()
}

/// Reverse-video the line that leads to the selected link.
fn mark(line:Line<'static>, link:&Route, sel:Option<&Route>) -> Line<'static> {
    if sel == Some(link) {
        line.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        line
    }
}

fn block_summary(b:&BlockDoc) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("#{:<10}", b.number), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{:>4} txs  ", b.tx_count())),
    ];
    if let Some(author) = &b.author {
        spans.push(Span::raw(truncate_middle(author, 20)));
        spans.push(Span::raw("  "));
    }
    if let Some(ts) = b.timestamp {
        spans.push(Span::styled(format_timestamp(ts), Style::default().fg(DIM)));
    }
    Line::from(spans)
}

fn tx_summary(t:&TransactionDoc) -> Line<'static> {
    let mut spans = vec![
        Span::styled(format!("{:<14}", t.action.label()), Style::default().fg(ACCENT)),
        Span::raw(format!("0x{}", truncate_middle(&t.hash, 24))),
    ];
    if t.is_pending {
        spans.push(Span::styled("  pending", Style::default().fg(Color::Yellow)));
    } else if t.success == Some(false) {
        spans.push(Span::styled("  failed", Style::default().fg(Color::Red)));
    }
    Line::from(spans)
}

/// Transaction summary plus the rows that touch the page's owner.
fn owner_tx_summary(t:&TransactionDoc, ctx:&ViewContext) -> Line<'static> {
    let mut line = tx_summary(t);
    let mine = details::transaction_rows(t, ctx).into_iter().filter(|r| r.highlight).count();
    if mine > 0 {
        line.spans.push(Span::styled(format!("  ({mine} own)"), Style::default().fg(Color::Yellow)));
    }
    line
}

// ===============================
// Footer
// ===============================
fn footer(f:&mut Frame, area:Rect, app:&App){
    let best = match app.best_block() {
        Some(n) => format!("best #{n}"),
        None => "best #-".to_string(),
    };
    let mut spans = vec![
        Span::styled(best, Style::default().fg(ACCENT)),
        Span::raw("  "),
    ];
    let lookups = app.lookups_in_flight();
    if lookups > 0 {
        spans.push(Span::styled(format!("{lookups} lookups  "), Style::default().fg(Color::Yellow)));
    }
    let back = if app.can_go_back() { "Ctrl+B back  " } else { "" };
    spans.push(Span::styled(
        format!("Enter search/open  Up/Down select  Tab accept  Esc clear  Ctrl+H home  {back}Ctrl+C quit"),
        Style::default().fg(DIM),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
