use std::fmt::Write as _;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dbpanel_core::backend::{BackendError, PanelBackend};
use dbpanel_core::command::{CommandTicket, LoadingGuard, RequestToken};
use dbpanel_core::config::PanelConfig;
use dbpanel_core::panel::{AdminPanel, CommandOutcome, NoticeKind};
use dbpanel_core::protocol::{StatementResult, TablesPayload};
use dbpanel_core::results_view::{MessageKind, ResultGrid, SortDirection};
use dbpanel_core::schema_view::{SchemaView, TableBlock};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::{Frame, Terminal};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(120);
const MAX_MESSAGE_LINES: usize = 8;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Databases,
    Schema,
    Editor,
    Results,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Self::Databases => Self::Schema,
            Self::Schema => Self::Editor,
            Self::Editor => Self::Results,
            Self::Results => Self::Databases,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Databases => "Databases",
            Self::Schema => "Tables",
            Self::Editor => "SQL Editor",
            Self::Results => "Results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    ImportFile,
    SearchResults,
}

impl PromptKind {
    fn title(self) -> &'static str {
        match self {
            Self::ImportFile => "Import .sql file (path)",
            Self::SearchResults => "Search results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Editing,
    Prompt(PromptKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectionKey {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Msg {
    Quit,
    ToggleHelp,
    NextPane,
    Submit,
    RunCommand,
    RefreshDatabases,
    LoadTables,
    ToggleSchema,
    StartEditing,
    StopEditing,
    OpenImportPrompt,
    OpenSearchPrompt,
    ConfirmPrompt,
    CancelPrompt,
    InsertChar(char),
    Newline,
    Backspace,
    Navigate(DirectionKey),
    SortColumn(usize),
    DismissAlert,
    Tick,
}

/// Outcome of a background request, delivered back to the UI loop.
#[derive(Debug)]
enum PanelEvent {
    Databases(Result<Vec<String>, BackendError>),
    Tables(Result<TablesPayload, BackendError>),
    Command {
        token: RequestToken,
        result: Result<Vec<StatementResult>, BackendError>,
        // Held until the result has been rendered.
        loading: LoadingGuard,
    },
}

struct TuiApp {
    panel: AdminPanel,
    backend: Arc<dyn PanelBackend>,
    runtime: Handle,
    events_tx: UnboundedSender<PanelEvent>,
    events_rx: UnboundedReceiver<PanelEvent>,
    server_url: String,
    pane: Pane,
    mode: InputMode,
    prompt_input: String,
    schema_scroll: u16,
    show_help: bool,
    should_quit: bool,
    status_line: String,
}

impl TuiApp {
    fn new(config: &PanelConfig, backend: Arc<dyn PanelBackend>, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            panel: AdminPanel::new(config.page_size),
            backend,
            runtime,
            events_tx,
            events_rx,
            server_url: config.server_url.clone(),
            pane: Pane::Databases,
            mode: InputMode::Normal,
            prompt_input: String::new(),
            schema_scroll: 0,
            show_help: false,
            should_quit: false,
            status_line: "Select a database with arrows and Enter".to_string(),
        }
    }

    fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Quit => self.should_quit = true,
            Msg::ToggleHelp => self.show_help = !self.show_help,
            Msg::NextPane => {
                self.pane = self.pane.next();
                self.status_line = format!("Switched pane to {}", self.pane.name());
            }
            Msg::Submit => self.submit(),
            Msg::RunCommand => self.run_command(),
            Msg::RefreshDatabases => self.spawn_database_refresh(),
            Msg::LoadTables => self.load_tables(),
            Msg::ToggleSchema => {
                let visible = self.panel.toggle_schema_visibility();
                self.status_line = if visible {
                    "Tables shown".to_string()
                } else {
                    "Tables hidden".to_string()
                };
            }
            Msg::StartEditing => {
                self.pane = Pane::Editor;
                self.mode = InputMode::Editing;
                self.status_line = "Editing SQL (Esc to stop, Ctrl+R to run)".to_string();
            }
            Msg::StopEditing => {
                self.mode = InputMode::Normal;
                self.status_line = "Stopped editing".to_string();
            }
            Msg::OpenImportPrompt => {
                self.prompt_input.clear();
                self.mode = InputMode::Prompt(PromptKind::ImportFile);
            }
            Msg::OpenSearchPrompt => self.open_search_prompt(),
            Msg::ConfirmPrompt => self.confirm_prompt(),
            Msg::CancelPrompt => {
                self.prompt_input.clear();
                self.mode = InputMode::Normal;
            }
            Msg::InsertChar(character) => match self.mode {
                InputMode::Editing => self.panel.sql_input_mut().push(character),
                InputMode::Prompt(_) => self.prompt_input.push(character),
                InputMode::Normal => {}
            },
            Msg::Newline => {
                if self.mode == InputMode::Editing {
                    self.panel.sql_input_mut().push('\n');
                }
            }
            Msg::Backspace => match self.mode {
                InputMode::Editing => {
                    self.panel.sql_input_mut().pop();
                }
                InputMode::Prompt(_) => {
                    self.prompt_input.pop();
                }
                InputMode::Normal => {}
            },
            Msg::Navigate(direction) => self.navigate(direction),
            Msg::SortColumn(column) => self.sort_results(column),
            Msg::DismissAlert => self.panel.dismiss_alert(),
            Msg::Tick => self.drain_events(),
        }
    }

    fn submit(&mut self) {
        match self.pane {
            Pane::Databases => match self.panel.select_highlighted_database() {
                Ok(Some(database)) => {
                    self.status_line =
                        format!("Database `{database}` selected, press t to load tables");
                }
                Ok(None) => {
                    self.schema_scroll = 0;
                    self.status_line = "No database selected".to_string();
                }
                Err(error) => self.status_line = error.to_string(),
            },
            Pane::Schema => self.load_tables(),
            Pane::Editor => self.run_command(),
            Pane::Results => self.panel.results_mut().focus_next_grid(),
        }
    }

    fn run_command(&mut self) {
        let Some(ticket) = self.panel.begin_command() else {
            if let Some(notice) = self.panel.notice() {
                self.status_line = notice.text.clone();
            }
            return;
        };
        self.mode = InputMode::Normal;
        self.status_line = "Running command...".to_string();
        self.spawn_command(ticket);
    }

    fn load_tables(&mut self) {
        let Some(database) = self.panel.tables_request() else {
            return;
        };
        self.status_line = format!("Loading tables for `{database}`");
        self.spawn_tables_fetch(database);
    }

    fn spawn_database_refresh(&self) {
        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = backend.list_databases().await;
            if events.send(PanelEvent::Databases(result)).is_err() {
                debug!("panel closed before the database list arrived");
            }
        });
    }

    fn spawn_tables_fetch(&self, database: String) {
        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = backend.fetch_tables(&database).await;
            if events.send(PanelEvent::Tables(result)).is_err() {
                debug!(database = %database, "panel closed before table metadata arrived");
            }
        });
    }

    fn spawn_command(&self, ticket: CommandTicket) {
        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        self.runtime.spawn(async move {
            let CommandTicket {
                token,
                sql,
                loading,
            } = ticket;
            let result = backend.execute(&sql).await;
            let event = PanelEvent::Command {
                token,
                result,
                loading,
            };
            if events.send(event).is_err() {
                debug!(token = token.value(), "panel closed before the command finished");
            }
        });
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Databases(result) => {
                if self.panel.apply_database_list(result) {
                    let count = self.panel.session().known_databases().len();
                    self.status_line = format!("Loaded {count} databases");
                }
            }
            PanelEvent::Tables(result) => {
                self.panel.apply_tables(result);
                self.schema_scroll = 0;
            }
            PanelEvent::Command {
                token,
                result,
                loading,
            } => {
                let outcome = self.panel.apply_command_result(token, result);
                drop(loading);
                self.after_command(outcome);
            }
        }
    }

    fn after_command(&mut self, outcome: CommandOutcome) {
        if outcome.refresh_databases() {
            info!("result mentions a database, refreshing database list");
            self.spawn_database_refresh();
        }

        match outcome {
            CommandOutcome::Rendered { .. } => {
                self.pane = Pane::Results;
                self.status_line = "Command finished".to_string();
            }
            CommandOutcome::Failed => {
                if let Some(notice) = self.panel.notice() {
                    self.status_line = notice.text.clone();
                }
            }
            CommandOutcome::Discarded { .. } => debug!("stale command response dropped"),
            CommandOutcome::Rejected => {}
        }
    }

    fn open_search_prompt(&mut self) {
        let Some(grid) = self.panel.results_mut().focused_grid_mut() else {
            self.status_line = "No result grid to search".to_string();
            return;
        };
        self.prompt_input = grid.search().to_string();
        self.mode = InputMode::Prompt(PromptKind::SearchResults);
    }

    fn confirm_prompt(&mut self) {
        let InputMode::Prompt(kind) = self.mode else {
            return;
        };
        let input = std::mem::take(&mut self.prompt_input);
        self.mode = InputMode::Normal;

        match kind {
            PromptKind::ImportFile => {
                let path = input.trim();
                if path.is_empty() {
                    return;
                }
                self.panel.choose_import_file(path);
                match self.panel.import_selected_file() {
                    Ok(true) => {
                        self.pane = Pane::Editor;
                        self.status_line = format!("Imported `{path}` into the editor");
                    }
                    Ok(false) => {}
                    Err(error) => self.status_line = format!("Import failed: {error}"),
                }
            }
            PromptKind::SearchResults => {
                if let Some(grid) = self.panel.results_mut().focused_grid_mut() {
                    grid.set_search(input);
                    self.status_line = format!("{} matching rows", grid.matching_rows());
                }
            }
        }
    }

    fn navigate(&mut self, direction: DirectionKey) {
        match self.pane {
            Pane::Databases => match direction {
                DirectionKey::Up | DirectionKey::Left => self.panel.selector_mut().move_previous(),
                DirectionKey::Down | DirectionKey::Right => self.panel.selector_mut().move_next(),
            },
            Pane::Schema => match direction {
                DirectionKey::Up | DirectionKey::Left => {
                    self.schema_scroll = self.schema_scroll.saturating_sub(1);
                }
                DirectionKey::Down | DirectionKey::Right => {
                    self.schema_scroll = self.schema_scroll.saturating_add(1);
                }
            },
            Pane::Results => {
                let results = self.panel.results_mut();
                match direction {
                    DirectionKey::Up => results.focus_previous_grid(),
                    DirectionKey::Down => results.focus_next_grid(),
                    DirectionKey::Left => {
                        if let Some(grid) = results.focused_grid_mut() {
                            grid.previous_page();
                        }
                    }
                    DirectionKey::Right => {
                        if let Some(grid) = results.focused_grid_mut() {
                            grid.next_page();
                        }
                    }
                }
            }
            Pane::Editor => {}
        }
    }

    fn sort_results(&mut self, column: usize) {
        if self.pane != Pane::Results {
            return;
        }
        if let Some(grid) = self.panel.results_mut().focused_grid_mut() {
            grid.sort_by(column);
            if let Some(header) = grid.headers().get(column) {
                self.status_line = format!("Sorted by `{header}`");
            }
        }
    }
}

/// Runs the panel until the user quits; requests execute on a private tokio runtime.
pub fn run(config: &PanelConfig, backend: Arc<dyn PanelBackend>) -> Result<(), TuiError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let mut app = TuiApp::new(config, backend, runtime.handle().clone());
    app.handle(Msg::RefreshDatabases);

    let mut terminal = setup_terminal()?;
    let run_result = run_loop(&mut terminal, &mut app);
    let restore_result = restore_terminal(&mut terminal);
    drop(app);
    runtime.shutdown_background();

    if let Err(error) = run_result {
        restore_result?;
        return Err(error);
    }

    restore_result?;
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), TuiError> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut TuiApp,
) -> Result<(), TuiError> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, app))?;

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let alert_open = app.panel.alert().is_some();
                    if let Some(message) = map_key_event(app.mode, alert_open, key) {
                        app.handle(message);
                    }
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.handle(Msg::Tick);
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame<'_>, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(columns[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(columns[1]);

    render_databases(frame, app, left[0]);
    render_schema(frame, app, left[1]);
    render_editor(frame, app, right[0]);
    render_results(frame, app, right[1]);

    let footer = Paragraph::new(vec![
        Line::from("Tab: pane | Enter: select/run | i: edit | Ctrl+R: run | o: import | ?: help"),
        Line::from(format!("Status: {}", app.status_line)),
    ])
    .block(Block::default().borders(Borders::ALL).title("Keys"));
    frame.render_widget(footer, chunks[2]);

    if let InputMode::Prompt(kind) = app.mode {
        render_prompt(frame, kind, &app.prompt_input);
    }
    if app.show_help {
        render_help_popup(frame);
    }
    if let Some(alert) = app.panel.alert() {
        render_alert(frame, alert);
    }
}

fn render_header(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let loading = if app.panel.is_loading() {
        Span::styled(
            "⏳ running",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw("idle")
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" Pane: {} ", app.pane.name()),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::raw(format!("Server: {}", app.server_url)),
        Span::raw(" | "),
        Span::raw(format!(
            "DB: {}",
            app.panel.session().current_database().unwrap_or("-")
        )),
        Span::raw(" | "),
        loading,
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("SQL Admin Panel"),
    );
    frame.render_widget(header, area);
}

fn pane_block(app: &TuiApp, pane: Pane, title: String) -> Block<'static> {
    let border_style = if app.pane == pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}

fn render_databases(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let selector = app.panel.selector();
    let current = app.panel.session().current_database();

    let lines = selector
        .options()
        .iter()
        .enumerate()
        .map(|(index, option)| {
            let marker = if index == selector.highlighted_index() {
                ">"
            } else {
                " "
            };
            let active = if !option.disabled && current == Some(option.value.as_str()) {
                " *"
            } else {
                ""
            };
            let style = if option.disabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::styled(format!("{marker} {}{active}", option.label), style)
        })
        .collect::<Vec<_>>();

    let load_hint = if app.panel.can_load_tables() {
        "t: load tables"
    } else {
        "select to enable load"
    };
    let list = Paragraph::new(lines).block(pane_block(
        app,
        Pane::Databases,
        format!("Databases (r: refresh, {load_hint})"),
    ));
    frame.render_widget(list, area);
}

fn render_schema(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let block = pane_block(app, Pane::Schema, "Tables (v: show/hide)".to_string());

    if !app.panel.schema_visible() {
        frame.render_widget(Paragraph::new("Tables hidden").block(block), area);
        return;
    }

    let lines = match app.panel.schema() {
        SchemaView::Empty => vec![Line::from("Select a database and press t to load tables")],
        SchemaView::Error(text) | SchemaView::FetchFailed(text) => vec![Line::styled(
            text.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )],
        SchemaView::Tables(blocks) => blocks.iter().flat_map(table_block_lines).collect(),
    };

    let schema = Paragraph::new(lines)
        .block(block)
        .scroll((app.schema_scroll, 0));
    frame.render_widget(schema, area);
}

fn table_block_lines(table: &TableBlock) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled(
            format!("🧾 {}", table.name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::styled(
            "  Column Name | Type",
            Style::default().fg(Color::DarkGray),
        ),
    ];

    for column in &table.columns {
        lines.push(Line::from(format!(
            "  {} | {}",
            column.decorated_name(),
            column.data_type
        )));
    }

    for (label, summary) in table.summary_lines() {
        let color = if label == dbpanel_core::schema_view::PRIMARY_KEY_LABEL {
            Color::Yellow
        } else {
            Color::Blue
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {label}"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" {summary}")),
        ]));
    }

    lines.push(Line::from(""));
    lines
}

fn render_editor(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let mut block = pane_block(
        app,
        Pane::Editor,
        "SQL (i: edit, Ctrl+R: run, o: import)".to_string(),
    );
    if app.mode == InputMode::Editing {
        block = block.border_style(Style::default().fg(Color::Yellow));
    }

    let text = if app.panel.sql_input().is_empty() && app.mode != InputMode::Editing {
        vec![Line::styled(
            "Type SQL commands here...",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        app.panel.sql_input().lines().map(Line::from).collect()
    };

    let editor = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(editor, area);
}

fn render_results(frame: &mut Frame<'_>, app: &TuiApp, area: Rect) {
    let block = pane_block(app, Pane::Results, "Results".to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let results = app.panel.results();
    let view = results.view();

    let mut message_lines = Vec::new();
    if let Some(notice) = app.panel.notice() {
        let color = match notice.kind {
            NoticeKind::Warning | NoticeKind::Failure => Color::Red,
        };
        message_lines.push(Line::styled(
            notice.text.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    for message in &view.messages {
        let color = match message.kind {
            MessageKind::Info => Color::Gray,
            MessageKind::Error => Color::Red,
        };
        message_lines.push(Line::styled(
            format!("• {}", message.display_text()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let message_height = message_lines.len().min(MAX_MESSAGE_LINES);
    let mut constraints = Vec::with_capacity(view.grids.len() + 1);
    constraints.push(Constraint::Length(
        u16::try_from(message_height).unwrap_or(u16::MAX),
    ));
    let grid_count = u32::try_from(view.grids.len()).unwrap_or(u32::MAX);
    for _ in &view.grids {
        constraints.push(Constraint::Ratio(1, grid_count));
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    frame.render_widget(Paragraph::new(message_lines), sections[0]);

    for (index, grid) in view.grids.iter().enumerate() {
        let focused = app.pane == Pane::Results && index == results.focused_grid_index();
        render_grid(frame, grid, focused, sections[index + 1]);
    }
}

fn grid_title(grid: &ResultGrid) -> String {
    let mut title = format!(
        "{} · page {}/{} · {} rows",
        grid.title(),
        grid.page() + 1,
        grid.page_count(),
        grid.matching_rows()
    );
    if let Some((column, direction)) = grid.sort() {
        let arrow = match direction {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        };
        if let Some(header) = grid.headers().get(column) {
            let _ = write!(title, " · sort: {header} {arrow}");
        }
    }
    if !grid.search().is_empty() {
        let _ = write!(title, " · search: {}", grid.search());
    }
    title
}

fn render_grid(frame: &mut Frame<'_>, grid: &ResultGrid, focused: bool, area: Rect) {
    let header = Row::new(
        grid.headers()
            .iter()
            .map(|header| Cell::from(header.clone())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = grid
        .page_rows()
        .into_iter()
        .map(|cells| Row::new(cells.into_iter().map(Cell::from)));
    let widths = vec![Constraint::Fill(1); grid.headers().len().max(1)];

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Blue)
    };
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(grid_title(grid)),
    );
    frame.render_widget(table, area);
}

fn render_prompt(frame: &mut Frame<'_>, kind: PromptKind, input: &str) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);
    let prompt = Paragraph::new(vec![
        Line::from(format!("> {input}")),
        Line::from(""),
        Line::from("Enter: confirm | Esc: cancel"),
    ])
    .block(Block::default().borders(Borders::ALL).title(kind.title()));
    frame.render_widget(prompt, area);
}

fn render_alert(frame: &mut Frame<'_>, alert: &str) {
    let area = centered_rect(50, 20, frame.area());
    frame.render_widget(Clear, area);
    let popup = Paragraph::new(vec![
        Line::styled(
            alert.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::from("Press any key to continue"),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Alert"));
    frame.render_widget(popup, area);
}

fn render_help_popup(frame: &mut Frame<'_>) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);
    let help = Paragraph::new(vec![
        Line::from("Global keymap"),
        Line::from("q: quit"),
        Line::from("?: toggle help"),
        Line::from("Tab: cycle panes"),
        Line::from("Enter: select database / load tables / run SQL (by pane)"),
        Line::from("r: refresh database list"),
        Line::from("t: load tables for the selected database"),
        Line::from("v: show or hide tables"),
        Line::from("i: edit SQL, Esc: stop editing"),
        Line::from("Ctrl+R or F5: run SQL"),
        Line::from("o: import a .sql file"),
        Line::from("Results: arrows page/switch grid, 1..9 sort by column, /: search"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, area);
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100_u16 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100_u16 - height_percent) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100_u16 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100_u16 - width_percent) / 2),
        ])
        .split(vertical[1])[1]
}

fn is_run_shortcut(key: KeyEvent) -> bool {
    matches!(
        (key.modifiers, key.code),
        (KeyModifiers::CONTROL, KeyCode::Char('r')) | (_, KeyCode::F(5))
    )
}

fn map_key_event(mode: InputMode, alert_open: bool, key: KeyEvent) -> Option<Msg> {
    if alert_open {
        return Some(Msg::DismissAlert);
    }
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        return Some(Msg::Quit);
    }

    match mode {
        InputMode::Normal => map_normal_key(key),
        InputMode::Editing => {
            if is_run_shortcut(key) {
                return Some(Msg::RunCommand);
            }
            match key.code {
                KeyCode::Esc => Some(Msg::StopEditing),
                KeyCode::Enter => Some(Msg::Newline),
                KeyCode::Backspace => Some(Msg::Backspace),
                KeyCode::Char(character) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Msg::InsertChar(character))
                }
                _ => None,
            }
        }
        InputMode::Prompt(_) => match key.code {
            KeyCode::Esc => Some(Msg::CancelPrompt),
            KeyCode::Enter => Some(Msg::ConfirmPrompt),
            KeyCode::Backspace => Some(Msg::Backspace),
            KeyCode::Char(character) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Msg::InsertChar(character))
            }
            _ => None,
        },
    }
}

fn map_normal_key(key: KeyEvent) -> Option<Msg> {
    if is_run_shortcut(key) {
        return Some(Msg::RunCommand);
    }
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => Some(Msg::Quit),
        (_, KeyCode::Char('?')) => Some(Msg::ToggleHelp),
        (_, KeyCode::Tab) => Some(Msg::NextPane),
        (_, KeyCode::Enter) => Some(Msg::Submit),
        (_, KeyCode::Char('r')) => Some(Msg::RefreshDatabases),
        (_, KeyCode::Char('t')) => Some(Msg::LoadTables),
        (_, KeyCode::Char('v')) => Some(Msg::ToggleSchema),
        (_, KeyCode::Char('i')) => Some(Msg::StartEditing),
        (_, KeyCode::Char('o')) => Some(Msg::OpenImportPrompt),
        (_, KeyCode::Char('/')) => Some(Msg::OpenSearchPrompt),
        (_, KeyCode::Up | KeyCode::Char('k')) => Some(Msg::Navigate(DirectionKey::Up)),
        (_, KeyCode::Down | KeyCode::Char('j')) => Some(Msg::Navigate(DirectionKey::Down)),
        (_, KeyCode::Left | KeyCode::Char('h')) => Some(Msg::Navigate(DirectionKey::Left)),
        (_, KeyCode::Right | KeyCode::Char('l')) => Some(Msg::Navigate(DirectionKey::Right)),
        (_, KeyCode::Char(digit @ '1'..='9')) => digit
            .to_digit(10)
            .and_then(|value| usize::try_from(value).ok())
            .map(|value| Msg::SortColumn(value - 1)),
        _ => None,
    }
}
