use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::api::CatalogClient;
use crate::app::App;
use crate::domain::Record;
use crate::listing::{ListingMode, ListingView};
use crate::store::KeyValueStorage;

const LOGS_MAX: usize = 200;
const POLL_INTERVAL: Duration = Duration::from_millis(120);
const SPINNER: &[char] = &['|', '/', '-', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Listing,
    Bookmarks,
    Logs,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Search,
}

/// Interactive browser over an [`App`].
///
/// Fetches run as tasks on the runtime behind `handle`; every frame renders
/// the cache snapshot, so earlier results stay on screen while a page loads.
pub struct Tui<C, S> {
    app: App<C, S>,
    handle: Handle,
    view: View,
    input_mode: InputMode,
    input: String,
    selected: usize,
    bookmark_selected: usize,
    logs: VecDeque<String>,
    status: String,
    in_flight: Option<JoinHandle<()>>,
}

impl<C: CatalogClient + 'static, S: KeyValueStorage> Tui<C, S> {
    pub fn new(app: App<C, S>, handle: Handle) -> Self {
        let input = app.snapshot().search_query;
        Self {
            app,
            handle,
            view: View::Listing,
            input_mode: InputMode::Normal,
            input,
            selected: 0,
            bookmark_selected: 0,
            logs: VecDeque::new(),
            status: "ready".to_string(),
            in_flight: None,
        }
    }

    pub fn run(&mut self) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        self.reload();
        let mut tick = 0usize;
        loop {
            let listing = self.app.snapshot();
            self.selected = self.selected.min(listing.records.len().saturating_sub(1));
            terminal
                .draw(|frame| self.draw(frame, &listing, tick))
                .into_diagnostic()?;

            if event::poll(POLL_INTERVAL).into_diagnostic()?
                && let Event::Key(key) = event::read().into_diagnostic()?
                && self.handle_key(key, &listing)
            {
                return Ok(());
            }
            tick = tick.wrapping_add(1);
        }
    }

    fn reload(&mut self) {
        let coordinator = self.app.coordinator().clone();
        let nav = self.app.nav().clone();
        let ids = self.app.bookmarks().ids();
        self.log(format!("load {}", nav.to_link()));
        self.in_flight = Some(self.handle.spawn(async move {
            coordinator.load(&nav, ids).await;
        }));
    }

    fn handle_key(&mut self, key: KeyEvent, listing: &ListingView) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if self.input_mode == InputMode::Search {
            self.handle_search_key(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('/') => {
                self.view = View::Listing;
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('?') | KeyCode::F(1) => self.view = View::Help,
            KeyCode::Tab => {
                self.view = match self.view {
                    View::Listing => View::Bookmarks,
                    View::Bookmarks => View::Logs,
                    View::Logs | View::Help => View::Listing,
                };
            }
            KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') => {
                if listing.has_previous() {
                    self.app.previous_page();
                    self.selected = 0;
                    self.reload();
                }
            }
            KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') => {
                if listing.has_next() {
                    self.app.next_page();
                    self.selected = 0;
                    self.reload();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1, listing),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1, listing),
            KeyCode::Char('b') | KeyCode::Char(' ') => self.toggle_selected(listing),
            KeyCode::Char('r') => {
                self.app.coordinator().invalidate(self.app.nav());
                self.reload();
            }
            _ => {}
        }
        false
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                return;
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => self.input.push(ch),
            _ => return,
        }
        self.app.search(&self.input);
        self.input = self.app.snapshot().search_query;
        self.selected = 0;
        self.reload();
    }

    fn move_selection(&mut self, delta: isize, listing: &ListingView) {
        match self.view {
            View::Bookmarks => {
                let len = self.app.bookmarks().len();
                self.bookmark_selected = step(self.bookmark_selected, delta, len);
            }
            _ => {
                self.selected = step(self.selected, delta, listing.records.len());
            }
        }
    }

    fn toggle_selected(&mut self, listing: &ListingView) {
        let record = match self.view {
            View::Bookmarks => self
                .app
                .bookmarks()
                .records()
                .get(self.bookmark_selected)
                .cloned(),
            _ => listing.records.get(self.selected).cloned(),
        };
        let Some(record) = record else {
            return;
        };
        match self.app.toggle_record(&record) {
            Ok(result) => {
                self.status = if result.bookmarked {
                    format!("bookmarked #{} {}", result.id, record.display_name)
                } else {
                    format!("removed #{} {}", result.id, record.display_name)
                };
            }
            Err(err) => self.status = format!("bookmark not saved: {err}"),
        }
        let message = self.status.clone();
        self.log(message);
        self.bookmark_selected = self
            .bookmark_selected
            .min(self.app.bookmarks().len().saturating_sub(1));
    }

    fn log(&mut self, message: String) {
        self.logs.push_back(format!(
            "[{}] {message}",
            chrono::Local::now().format("%H:%M:%S")
        ));
        while self.logs.len() > LOGS_MAX {
            self.logs.pop_front();
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame, listing: &ListingView, tick: usize) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(frame.area());

        frame.render_widget(self.draw_header(listing, tick), chunks[0]);
        match self.view {
            View::Listing => self.draw_listing(frame, listing, chunks[1]),
            View::Bookmarks => frame.render_widget(self.draw_bookmarks(), chunks[1]),
            View::Logs => frame.render_widget(self.draw_logs(chunks[1]), chunks[1]),
            View::Help => frame.render_widget(draw_help(), chunks[1]),
        }
        frame.render_widget(self.draw_footer(listing), chunks[2]);
    }

    fn draw_header(&self, listing: &ListingView, tick: usize) -> Paragraph<'static> {
        let state = if listing.is_error {
            Span::styled("error", Style::default().fg(Color::Red))
        } else if listing.is_loading {
            Span::styled(
                format!("loading {}", SPINNER[tick % SPINNER.len()]),
                Style::default().fg(Color::Yellow),
            )
        } else {
            Span::styled("ready", Style::default().fg(Color::Green))
        };
        let mode = match listing.mode {
            ListingMode::Browsing => "browse".to_string(),
            ListingMode::Searching => format!("search \"{}\"", listing.search_query),
        };
        Paragraph::new(Line::from(vec![
            Span::styled(
                "POKEDEX",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {mode}  page {}/{}  bookmarks {}  ",
                listing.page_number,
                listing.total_pages,
                self.app.bookmarks().len()
            )),
            state,
        ]))
        .block(Block::default().borders(Borders::BOTTOM))
        .alignment(Alignment::Left)
    }

    fn draw_listing(&self, frame: &mut ratatui::Frame, listing: &ListingView, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let mut lines = Vec::new();
        if listing.is_error {
            lines.push(Line::from(Span::styled(
                "Failed to load data. Press r to retry.",
                Style::default().fg(Color::Red),
            )));
        }
        if listing.records.is_empty() && listing.is_loading {
            lines.push(Line::from("Loading..."));
        } else if listing.records.is_empty() && !listing.is_error {
            lines.push(Line::from("No matches."));
        }
        for (index, record) in listing.records.iter().enumerate() {
            let marker = if listing.bookmarked_ids.contains(&record.id) {
                "★"
            } else {
                " "
            };
            let style = if index == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "{marker} #{:<3} {} ({})",
                    record.id, record.display_name, record.name
                ),
                style,
            )));
        }
        let list = Paragraph::new(lines).block(Block::default().borders(Borders::RIGHT));
        frame.render_widget(list, columns[0]);

        let detail = listing
            .records
            .get(self.selected)
            .map(|record| draw_record(record, listing.bookmarked_ids.contains(&record.id)))
            .unwrap_or_else(|| Paragraph::new(""));
        frame.render_widget(detail, columns[1]);
    }

    fn draw_bookmarks(&self) -> Paragraph<'static> {
        let records = self.app.bookmarks().records();
        let mut lines = vec![Line::from(Span::styled(
            "BOOKMARKS",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))];
        if records.is_empty() {
            lines.push(Line::from("No bookmarks yet. Press b on a record to add it."));
        }
        for (index, record) in records.iter().enumerate() {
            let style = if index == self.bookmark_selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!("#{:<3} {} ({})", record.id, record.display_name, record.name),
                style,
            )));
        }
        Paragraph::new(lines)
    }

    fn draw_logs(&self, area: Rect) -> Paragraph<'static> {
        let visible = area.height as usize;
        let skip = self.logs.len().saturating_sub(visible);
        let lines = self
            .logs
            .iter()
            .skip(skip)
            .map(|line| Line::from(line.clone()))
            .collect::<Vec<_>>();
        Paragraph::new(lines).wrap(Wrap { trim: true })
    }

    fn draw_footer(&self, listing: &ListingView) -> Paragraph<'static> {
        let line = match self.input_mode {
            InputMode::Search => Line::from(vec![
                Span::styled("/ ", Style::default().fg(Color::Yellow)),
                Span::raw(self.input.clone()),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
            InputMode::Normal => {
                let prev = if listing.has_previous() { "←" } else { " " };
                let next = if listing.has_next() { "→" } else { " " };
                Line::from(vec![
                    Span::styled(
                        format!("{prev} {next}  "),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::raw(self.status.clone()),
                    Span::styled(
                        format!("   {}", self.app.nav().to_link()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            }
        };
        Paragraph::new(line).block(Block::default().borders(Borders::TOP))
    }
}

fn draw_record(record: &Record, bookmarked: bool) -> Paragraph<'static> {
    let label = Style::default().fg(Color::Gray);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("#{} {}", record.id, record.display_name),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Name: ", label),
            Span::raw(record.name.clone()),
        ]),
        Line::from(vec![
            Span::styled("Category: ", label),
            Span::raw(record.category.clone()),
        ]),
        Line::from(vec![
            Span::styled("Types: ", label),
            Span::raw(record.types.join(", ")),
        ]),
        Line::from(vec![
            Span::styled("Sprite: ", label),
            Span::raw(if record.sprite_url.is_empty() {
                "n/a".to_string()
            } else {
                record.sprite_url.clone()
            }),
        ]),
        Line::from(vec![
            Span::styled("Bookmarked: ", label),
            Span::raw(if bookmarked { "yes" } else { "no" }),
        ]),
        Line::from(""),
        Line::from(Span::styled("Stats", label)),
    ];
    for stat in &record.stats {
        lines.push(Line::from(format!(
            "  {:<16} {:>3} {}",
            stat.stat_name,
            stat.base_value,
            stat_bar(stat.base_value)
        )));
    }
    Paragraph::new(lines).wrap(Wrap { trim: true })
}

fn draw_help() -> Paragraph<'static> {
    let lines = vec![
        Line::from("/        search by id or name (Enter/Esc to finish)"),
        Line::from("← →      previous / next page"),
        Line::from("↑ ↓      select record"),
        Line::from("b, space toggle bookmark"),
        Line::from("r        retry the current page"),
        Line::from("Tab      listing / bookmarks / logs"),
        Line::from("q, Esc   quit"),
    ];
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true })
}

fn stat_bar(value: u32) -> String {
    let filled = (value.min(200) / 20) as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(10 - filled))
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_stays_in_bounds() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(4, 1, 5), 4);
        assert_eq!(step(2, 1, 5), 3);
        assert_eq!(step(3, 1, 0), 0);
    }

    #[test]
    fn stat_bar_is_fixed_width() {
        assert_eq!(stat_bar(0), "..........");
        assert_eq!(stat_bar(100), "#####.....");
        assert_eq!(stat_bar(255).len(), 10);
    }
}
