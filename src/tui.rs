use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, ProgressEvent, ProgressSink};
use crate::catalog::Catalog;
use crate::detail::{DetailState, DetailView};
use crate::domain::{ItemKey, Theme};
use crate::error::DexError;
use crate::pokeapi::PokeApiClient;
use crate::prefs::{self, PreferenceStore};
use crate::view::{CardList, DetailTicket, Session, ViewModel};

const LOGS_MAX: usize = 200;
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Cards,
    Categories,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    OpenDetail(ItemKey),
    ToggleTheme,
}

#[derive(Debug)]
pub struct Browser {
    session: Session,
    search: String,
    focus: Focus,
    card_cursor: usize,
    chip_cursor: usize,
    stage_cursor: usize,
    show_logs: bool,
}

impl Browser {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            search: String::new(),
            focus: Focus::Cards,
            card_cursor: 0,
            chip_cursor: 0,
            stage_cursor: 0,
            show_logs: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn card_cursor(&self) -> usize {
        self.card_cursor
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        match key.code {
            KeyCode::F(2) => return Action::ToggleTheme,
            KeyCode::F(4) => {
                self.show_logs = !self.show_logs;
                return Action::None;
            }
            _ => {}
        }
        if self.session.is_detail_open() {
            return self.handle_detail_key(key.code);
        }
        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Cards => Focus::Categories,
                    Focus::Categories => Focus::Cards,
                };
            }
            _ => {}
        }
        match self.focus {
            Focus::Cards => self.handle_cards_key(key.code),
            Focus::Categories => self.handle_categories_key(key.code),
        }
    }

    fn handle_cards_key(&mut self, code: KeyCode) -> Action {
        let visible = self.session.visible();
        match code {
            KeyCode::Up => self.card_cursor = self.card_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.card_cursor + 1 < visible.len() {
                    self.card_cursor += 1;
                }
            }
            KeyCode::PageUp => self.card_cursor = self.card_cursor.saturating_sub(10),
            KeyCode::PageDown => {
                self.card_cursor = (self.card_cursor + 10).min(visible.len().saturating_sub(1));
            }
            KeyCode::Enter => {
                if let Some(summary) = visible.get(self.card_cursor) {
                    return Action::OpenDetail(ItemKey::Id(summary.id));
                }
            }
            KeyCode::Backspace => {
                self.search.pop();
                self.apply_search();
            }
            KeyCode::Char(ch) => {
                self.search.push(ch);
                self.apply_search();
            }
            _ => {}
        }
        Action::None
    }

    fn handle_categories_key(&mut self, code: KeyCode) -> Action {
        let categories: Vec<String> = self.session.catalog().categories().iter().cloned().collect();
        match code {
            KeyCode::Left => self.chip_cursor = self.chip_cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.chip_cursor + 1 < categories.len() {
                    self.chip_cursor += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(category) = categories.get(self.chip_cursor) {
                    self.session.toggle_category(category);
                    self.card_cursor = 0;
                }
            }
            KeyCode::Char('c') => {
                self.session.clear_categories();
                self.card_cursor = 0;
            }
            _ => {}
        }
        Action::None
    }

    fn handle_detail_key(&mut self, code: KeyCode) -> Action {
        let stages = match self.session.detail() {
            Some(DetailState::Ready { view }) if view.lineage.evolves() => {
                view.lineage.nodes().to_vec()
            }
            _ => Vec::new(),
        };
        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.session.close_detail();
                self.stage_cursor = 0;
            }
            KeyCode::Left => self.stage_cursor = self.stage_cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.stage_cursor + 1 < stages.len() {
                    self.stage_cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(stage) = stages.get(self.stage_cursor) {
                    let key = stage
                        .id
                        .parse::<ItemKey>()
                        .unwrap_or_else(|_| ItemKey::Name(stage.id.clone()));
                    return Action::OpenDetail(key);
                }
            }
            _ => {}
        }
        Action::None
    }

    pub fn begin_detail(&mut self, key: ItemKey) -> DetailTicket {
        self.stage_cursor = 0;
        self.session.open_detail(key)
    }

    pub fn toggle_theme(&mut self, preferences: &dyn PreferenceStore) -> Option<DexError> {
        let (next, err) = prefs::apply_toggle(preferences, self.session.theme());
        self.session.set_theme(next);
        err
    }

    fn apply_search(&mut self) {
        self.session.set_search(&self.search);
        self.card_cursor = 0;
    }
}

#[derive(Debug, Default)]
struct StatusState {
    status: String,
    loading: bool,
    logs: VecDeque<String>,
}

struct TuiProgress {
    state: Arc<Mutex<StatusState>>,
}

impl ProgressSink for TuiProgress {
    fn event(&self, event: ProgressEvent) {
        if let Ok(mut state) = self.state.lock() {
            let message = event.message.trim().to_string();
            state.status = parse_phase(&message)
                .map(|(_, payload)| payload.to_string())
                .unwrap_or_else(|| message.clone());
            push_log(&mut state.logs, format!("[{}] {message}", timestamp()));
        }
    }
}

enum Update {
    Catalog(Catalog),
    Detail(DetailTicket, DetailState),
}

pub struct Tui {
    status: Arc<Mutex<StatusState>>,
    list_state: ListState,
}

impl Default for Tui {
    fn default() -> Self {
        Self::new()
    }
}

impl Tui {
    pub fn new() -> Self {
        Self {
            status: Arc::new(Mutex::new(StatusState {
                status: "starting".to_string(),
                ..StatusState::default()
            })),
            list_state: ListState::default(),
        }
    }

    pub fn run<C>(
        &mut self,
        app: Arc<App<C>>,
        theme: Theme,
        preferences: &dyn PreferenceStore,
    ) -> miette::Result<()>
    where
        C: PokeApiClient + 'static,
    {
        let mut browser = Browser::new(Session::new(Catalog::default(), theme));
        let (tx, rx) = mpsc::channel();

        self.set_loading(true);
        {
            let app = app.clone();
            let tx = tx.clone();
            let sink = TuiProgress {
                state: self.status.clone(),
            };
            thread::spawn(move || {
                let (catalog, _) = app.load_catalog(&sink);
                let _ = tx.send(Update::Catalog(catalog));
            });
        }

        let mut stdout = io::stdout();
        enable_raw_mode().map_err(terminal_error)?;
        stdout.execute(EnterAlternateScreen).map_err(terminal_error)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(terminal_error)?;
        terminal.clear().map_err(terminal_error)?;

        let result = self.event_loop(&mut terminal, &mut browser, &app, &tx, &rx, preferences);

        disable_raw_mode().map_err(terminal_error)?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).map_err(terminal_error)?;
        result
    }

    fn event_loop<C>(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        browser: &mut Browser,
        app: &Arc<App<C>>,
        tx: &Sender<Update>,
        rx: &Receiver<Update>,
        preferences: &dyn PreferenceStore,
    ) -> miette::Result<()>
    where
        C: PokeApiClient + 'static,
    {
        loop {
            while let Ok(update) = rx.try_recv() {
                match update {
                    Update::Catalog(catalog) => {
                        browser.session_mut().replace_catalog(catalog);
                        self.set_loading(false);
                    }
                    Update::Detail(ticket, state) => {
                        browser.session_mut().complete_detail(&ticket, state);
                    }
                }
            }

            let model = browser.session().view_model();
            self.list_state.select(
                (!model.cards.cards().is_empty()).then_some(browser.card_cursor()),
            );
            let status = self.status_snapshot();
            let list_state = &mut self.list_state;
            terminal
                .draw(|frame| draw_ui(frame, browser, &model, &status, list_state))
                .map_err(terminal_error)?;

            if !event::poll(Duration::from_millis(120)).map_err(terminal_error)? {
                continue;
            }
            let Event::Key(key) = event::read().map_err(terminal_error)? else {
                continue;
            };
            match browser.handle_key(key) {
                Action::None => {}
                Action::Quit => return Ok(()),
                Action::ToggleTheme => {
                    if let Some(err) = browser.toggle_theme(preferences) {
                        self.log(format!("theme not saved: {err}"));
                    }
                }
                Action::OpenDetail(key) => {
                    let ticket = browser.begin_detail(key);
                    let app = app.clone();
                    let tx = tx.clone();
                    let sink = TuiProgress {
                        state: self.status.clone(),
                    };
                    thread::spawn(move || {
                        let state = app.detail(ticket.key(), &sink);
                        let _ = tx.send(Update::Detail(ticket, state));
                    });
                }
            }
        }
    }

    fn log(&self, message: String) {
        if let Ok(mut state) = self.status.lock() {
            push_log(&mut state.logs, format!("[{}] {message}", timestamp()));
            state.status = message;
        }
    }

    fn set_loading(&self, loading: bool) {
        if let Ok(mut state) = self.status.lock() {
            state.loading = loading;
        }
    }

    fn status_snapshot(&self) -> StatusSnapshot {
        self.status
            .lock()
            .map(|state| StatusSnapshot {
                status: state.status.clone(),
                loading: state.loading,
                logs: state.logs.iter().cloned().collect(),
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct StatusSnapshot {
    status: String,
    loading: bool,
    logs: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    muted: Color,
    selected: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            fg: Color::White,
            bg: Color::Black,
            accent: Color::Cyan,
            muted: Color::Gray,
            selected: Color::Yellow,
        },
        Theme::Light => Palette {
            fg: Color::Black,
            bg: Color::White,
            accent: Color::Blue,
            muted: Color::DarkGray,
            selected: Color::Magenta,
        },
    }
}

fn draw_ui(
    frame: &mut ratatui::Frame,
    browser: &Browser,
    model: &ViewModel,
    status: &StatusSnapshot,
    list_state: &mut ListState,
) {
    let colors = palette(model.theme);
    frame.render_widget(
        Block::default().style(Style::default().fg(colors.fg).bg(colors.bg)),
        frame.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(draw_header(browser, model, status, colors), chunks[0]);
    frame.render_widget(draw_search(browser, colors), chunks[1]);
    frame.render_widget(draw_chips(browser, model, colors), chunks[2]);

    if status.loading && model.cards.cards().is_empty() {
        let loading = Paragraph::new("Loading Pokémon...")
            .alignment(Alignment::Center)
            .style(Style::default().fg(colors.muted));
        frame.render_widget(loading, chunks[3]);
    } else if browser.show_logs {
        frame.render_widget(draw_logs(status, colors), chunks[3]);
    } else {
        draw_cards(frame, model, colors, chunks[3], list_state);
    }

    let hints = if model.detail.is_some() {
        "←/→ stage  Enter open stage  Esc close  F2 theme"
    } else {
        "type to search  ↑/↓ select  Enter details  Tab categories  Space toggle  c clear  F2 theme  F4 logs  Esc quit"
    };
    frame.render_widget(
        Paragraph::new(hints).style(Style::default().fg(colors.muted)),
        chunks[4],
    );

    if let Some(detail) = &model.detail {
        let area = centered_rect(80, 85, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(draw_detail(detail, browser.stage_cursor, colors), area);
    }
}

fn draw_header(
    browser: &Browser,
    model: &ViewModel,
    status: &StatusSnapshot,
    colors: Palette,
) -> Paragraph<'static> {
    let catalog = browser.session().catalog();
    let selected = browser
        .session()
        .visible()
        .get(browser.card_cursor())
        .and_then(|summary| catalog.describe(summary.id))
        .unwrap_or_default();
    Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                "POKÉDEX",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(env!("CARGO_PKG_VERSION"), Style::default().fg(colors.muted)),
            Span::raw(format!(
                "   Loaded: {}/{}   Showing: {}   Theme: {}   ",
                catalog.len(),
                catalog.requested(),
                model.cards.cards().len(),
                model.theme
            )),
            Span::styled(selected, Style::default().fg(colors.selected)),
        ]),
        Line::from(Span::styled(
            status.status.clone(),
            Style::default().fg(colors.muted),
        )),
    ])
}

fn draw_search(browser: &Browser, colors: Palette) -> Paragraph<'static> {
    let style = if browser.focus() == Focus::Cards {
        Style::default().fg(colors.accent)
    } else {
        Style::default().fg(colors.muted)
    };
    Paragraph::new(Line::from(vec![
        Span::styled("Search: ", style),
        Span::raw(browser.search.clone()),
    ]))
}

fn draw_chips(browser: &Browser, model: &ViewModel, colors: Palette) -> Paragraph<'static> {
    let focused = browser.focus() == Focus::Categories;
    let spans: Vec<Span<'static>> = if model.categories.is_empty() {
        vec![Span::styled(
            "Loading types...",
            Style::default().fg(colors.muted),
        )]
    } else {
        model
            .categories
            .iter()
            .enumerate()
            .map(|(index, chip)| {
                let mark = if chip.selected { "[x]" } else { "[ ]" };
                let mut style = Style::default().fg(if chip.selected {
                    colors.selected
                } else {
                    colors.fg
                });
                if focused && index == browser.chip_cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Span::styled(format!("{mark} {}  ", chip.label), style)
            })
            .collect()
    };
    let title = if focused { "Types (focused)" } else { "Types" };
    Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::TOP | Borders::BOTTOM).title(title))
        .wrap(Wrap { trim: true })
}

fn draw_cards(
    frame: &mut ratatui::Frame,
    model: &ViewModel,
    colors: Palette,
    area: Rect,
    list_state: &mut ListState,
) {
    match &model.cards {
        CardList::NoMatch { message } => {
            let empty = Paragraph::new(*message)
                .alignment(Alignment::Center)
                .style(Style::default().fg(colors.muted));
            frame.render_widget(empty, area);
        }
        CardList::Items { cards } => {
            let items: Vec<ListItem> = cards
                .iter()
                .map(|card| {
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("{} ", card.display_id),
                            Style::default().fg(colors.muted),
                        ),
                        Span::styled(
                            format!("{:<16}", card.name),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            card.categories.join(" / "),
                            Style::default().fg(colors.accent),
                        ),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .highlight_style(Style::default().fg(colors.selected))
                .highlight_symbol("> ");
            frame.render_stateful_widget(list, area, list_state);
        }
    }
}

fn draw_logs(status: &StatusSnapshot, colors: Palette) -> Paragraph<'static> {
    let lines: Vec<Line> = status
        .logs
        .iter()
        .rev()
        .map(|line| Line::from(line.clone()))
        .collect();
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Logs"))
        .style(Style::default().fg(colors.muted))
        .wrap(Wrap { trim: true })
}

fn draw_detail(state: &DetailState, stage_cursor: usize, colors: Palette) -> Paragraph<'static> {
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(colors.fg).bg(colors.bg));
    let lines = match state {
        DetailState::Loading { key } => vec![Line::from(format!("Loading details for {key}..."))],
        DetailState::Failed { message, .. } => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))],
        DetailState::Ready { view } => detail_lines(view, stage_cursor, colors),
    };
    Paragraph::new(lines).block(block).wrap(Wrap { trim: false })
}

fn detail_lines(view: &DetailView, stage_cursor: usize, colors: Palette) -> Vec<Line<'static>> {
    let heading = |text: &str| {
        Line::from(Span::styled(
            text.to_string(),
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ))
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                view.header.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(view.header.display_id.clone(), Style::default().fg(colors.muted)),
            Span::raw("  "),
            Span::styled(
                view.header.categories.join(" / "),
                Style::default().fg(colors.accent),
            ),
        ]),
        Line::from(""),
    ];

    for tile in &view.sprites {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<11}", tile.label), Style::default().fg(colors.muted)),
            Span::raw(tile.url.clone()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(heading("Base Stats"));
    for bar in &view.stats {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", bar.label), Style::default().fg(colors.muted)),
            Span::styled(progress_bar(bar.percent, BAR_WIDTH), Style::default().fg(colors.accent)),
            Span::raw(format!(" {}", bar.value)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(heading("Evolution Chain"));
    match view.lineage.notice() {
        Some(notice) => lines.push(Line::from(Span::styled(
            notice,
            Style::default().fg(colors.muted),
        ))),
        None => {
            let nodes = view.lineage.nodes();
            let mut spans = Vec::with_capacity(nodes.len() * 2);
            for (index, node) in nodes.iter().enumerate() {
                let mut style = Style::default();
                if index == stage_cursor {
                    style = style.fg(colors.selected).add_modifier(Modifier::REVERSED);
                }
                spans.push(Span::styled(node.name.clone(), style));
                if index + 1 < nodes.len() {
                    spans.push(Span::raw(" → "));
                }
            }
            lines.push(Line::from(spans));
        }
    }

    lines.push(Line::from(""));
    lines.push(heading("Older Game Sprites"));
    if let Some(notice) = view.generations_notice() {
        lines.push(Line::from(Span::styled(notice, Style::default().fg(colors.muted))));
    }
    for group in &view.generations {
        lines.push(Line::from(Span::styled(
            group.label,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for sprite in &group.sprites {
            let suffix = if sprite.animated { " (animated)" } else { "" };
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<8}", sprite.game), Style::default().fg(colors.muted)),
                Span::raw(format!("{}{suffix}", sprite.url)),
            ]));
        }
    }
    lines
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let mut out = String::from("[");
    for i in 0..width {
        out.push(if i < filled { '#' } else { '.' });
    }
    out.push(']');
    out
}

fn parse_phase(message: &str) -> Option<(&str, &str)> {
    let rest = message.strip_prefix("phase=")?;
    let (phase, payload) = rest.split_once(';')?;
    Some((phase, payload.trim()))
}

fn push_log(buffer: &mut VecDeque<String>, item: String) {
    buffer.push_back(item);
    while buffer.len() > LOGS_MAX {
        buffer.pop_front();
    }
}

fn terminal_error(err: io::Error) -> DexError {
    DexError::Terminal(err.to_string())
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
