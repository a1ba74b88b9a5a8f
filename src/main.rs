use std::env;
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use soccer_terminal::state::{
    action_for_key, apply_delta, auth_mode_label, AppState, AuthMode, BackendCommand, Delta,
    DashboardTable, LoginField, RowAction, Screen, TableRow, LOGIN_RULES, MARKET_ACTIONS,
    TEAM_ACTIONS,
};
use soccer_terminal::{demo_feed, feed, session};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<BackendCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<BackendCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn dispatch(&mut self, command: BackendCommand) {
        let note = match &command {
            BackendCommand::UpdatePlayer(_) => Some("[INFO] update player sent"),
            BackendCommand::UpdateTeam(_) => Some("[INFO] update team sent"),
            BackendCommand::TransferPlayer(_) => Some("[INFO] transfer player sent"),
            BackendCommand::SignIn(_) => Some("[INFO] sign in sent"),
            BackendCommand::SignUp(_) => Some("[INFO] sign up sent"),
            BackendCommand::FetchTeam | BackendCommand::FetchMarket => None,
        };
        if self.cmd_tx.send(command).is_err() {
            self.state.push_log("[WARN] Provider unavailable");
            return;
        }
        if let Some(note) = note {
            self.state.push_log(note);
        }
    }

    /// The full-page-reload analog: drop every snapshot and refetch team and
    /// market as two independent requests. Either one may fail on its own;
    /// the other still renders.
    fn request_reload(&mut self) {
        self.state.clear_snapshots();
        self.dispatch(BackendCommand::FetchTeam);
        self.dispatch(BackendCommand::FetchMarket);
    }

    fn on_key(&mut self, key: KeyEvent) {
        // Alert on top: any key dismisses it.
        if self.state.alert.is_some() {
            self.state.alert = None;
            return;
        }
        if self.state.prompt.is_some() {
            self.on_prompt_key(key);
            return;
        }
        match self.state.screen {
            Screen::Login => self.on_login_key(key),
            Screen::Dashboard => self.on_dashboard_key(key),
        }
    }

    fn on_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                // Cancelled prompt: silent abort, nothing dispatched.
                self.state.prompt = None;
            }
            KeyCode::Enter => {
                if let Some(command) = self.state.confirm_prompt() {
                    self.dispatch(command);
                }
            }
            KeyCode::Backspace => {
                if let Some(prompt) = self.state.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(prompt) = self.state.prompt.as_mut() {
                    prompt.input.push(c);
                }
            }
            _ => {}
        }
    }

    fn on_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.state.login_focus = match self.state.login_focus {
                    LoginField::Username => LoginField::Password,
                    LoginField::Password => LoginField::Username,
                };
            }
            KeyCode::F(2) => {
                self.state.auth_mode = match self.state.auth_mode {
                    AuthMode::SignIn => AuthMode::SignUp,
                    AuthMode::SignUp => AuthMode::SignIn,
                };
            }
            KeyCode::Enter => {
                let command = soccer_terminal::state::auth_command(
                    self.state.auth_mode,
                    &self.state.login_username,
                    &self.state.login_password,
                );
                // Missing credentials abort silently: no request, no alert.
                if let Some(command) = command {
                    self.dispatch(command);
                }
            }
            KeyCode::Backspace => {
                match self.state.login_focus {
                    LoginField::Username => self.state.login_username.pop(),
                    LoginField::Password => self.state.login_password.pop(),
                };
            }
            KeyCode::Char(c) => match self.state.login_focus {
                LoginField::Username => self.state.login_username.push(c),
                LoginField::Password => self.state.login_password.push(c),
            },
            _ => {}
        }
    }

    fn on_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                self.state.focus = match self.state.focus {
                    DashboardTable::Team => DashboardTable::Players,
                    DashboardTable::Players => DashboardTable::Market,
                    DashboardTable::Market => DashboardTable::Team,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char('r') => {
                self.state.push_log("[INFO] Manual reload");
                self.request_reload();
            }
            KeyCode::Char('o') => {
                session::clear();
                self.state.reset_to_login();
                self.state.push_log("[INFO] Signed out");
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char(c) => self.on_row_key(c),
            _ => {}
        }
    }

    fn on_row_key(&mut self, c: char) {
        match self.state.focus {
            DashboardTable::Team => {
                let Some(team) = &self.state.team else {
                    return;
                };
                let uuid = team.team_id.uuid.clone();
                if let Some(action) = action_for_key(TEAM_ACTIONS, c) {
                    self.state.open_prompt(action, &uuid);
                }
            }
            DashboardTable::Players => {
                let selected = self.state.selected_player;
                let Some(row) = self.state.player_rows.rows().get(selected) else {
                    return;
                };
                let key = row.key.clone();
                let actions = row.actions.clone();
                if let Some(action) = action_for_key(&actions, c) {
                    self.state.open_prompt(action, &key);
                }
            }
            DashboardTable::Market => {
                if action_for_key(MARKET_ACTIONS, c) == Some(RowAction::TransferPlayer) {
                    if let Some(command) = self.state.transfer_command() {
                        self.dispatch(command);
                    }
                }
            }
        }
    }

    fn select_next(&mut self) {
        match self.state.focus {
            DashboardTable::Team => {}
            DashboardTable::Players => {
                let total = self.state.player_rows.len();
                if total > 0 && self.state.selected_player + 1 < total {
                    self.state.selected_player += 1;
                }
            }
            DashboardTable::Market => {
                let total = self.state.market_rows.len();
                if total > 0 && self.state.selected_market + 1 < total {
                    self.state.selected_market += 1;
                }
            }
        }
    }

    fn select_prev(&mut self) {
        match self.state.focus {
            DashboardTable::Team => {}
            DashboardTable::Players => {
                self.state.selected_player = self.state.selected_player.saturating_sub(1);
            }
            DashboardTable::Market => {
                self.state.selected_market = self.state.selected_market.saturating_sub(1);
            }
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();

    let initial_session = session::load();
    if demo_mode() {
        demo_feed::spawn_demo_provider(tx, cmd_rx);
    } else {
        feed::spawn_provider(tx, cmd_rx, initial_session.clone());
    }

    let mut app = App::new(cmd_tx);
    if let Some(stored) = initial_session {
        app.state.user_id = Some(stored.user_id);
        app.state.screen = Screen::Dashboard;
        app.state.push_log("[INFO] Session restored");
        app.request_reload();
    }

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn demo_mode() -> bool {
    env::var("SOCCER_DEMO")
        .map(|val| val == "1" || val.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        if let Some(fresh) = app.state.pending_session.take() {
            session::store(&fresh);
        }
        if app.state.reload_pending {
            app.state.reload_pending = false;
            app.request_reload();
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Login => render_login(frame, chunks[1], &app.state),
        Screen::Dashboard => render_dashboard(frame, chunks[1], &app.state),
    }

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if let Some(prompt) = &app.state.prompt {
        render_prompt_overlay(frame, frame.size(), &prompt.title, &prompt.input);
    }
    if let Some(alert) = &app.state.alert {
        render_alert_overlay(frame, frame.size(), alert);
    }
}

fn header_text(state: &AppState) -> String {
    match &state.user_id {
        Some(user_id) => format!("SOCCER MANAGER TERMINAL | USER : {user_id}"),
        None => "SOCCER MANAGER TERMINAL | NOT SIGNED IN".to_string(),
    }
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Login => "Tab Field | F2 Mode | Enter Submit | Esc Quit".to_string(),
        Screen::Dashboard => {
            let table_keys = match state.focus {
                DashboardTable::Team => "n Name | c Country",
                DashboardTable::Players => "f First | l Last | c Country | v Transfer value",
                DashboardTable::Market => "t Transfer",
            };
            format!(
                "Tab Table | j/k/\u{2191}/\u{2193} Move | {table_keys} | r Reload | o Sign out | ? Help | q Quit"
            )
        }
    }
}

fn render_login(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(60, 70, area);
    let block = Block::default().title("Welcome").borders(Borders::ALL);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let username_marker = if state.login_focus == LoginField::Username {
        "> "
    } else {
        "  "
    };
    let password_marker = if state.login_focus == LoginField::Password {
        "> "
    } else {
        "  "
    };
    let masked = "*".repeat(state.login_password.chars().count());

    let text = format!(
        "Mode : {}  (F2 to switch)\n\n{}Username : {}\n{}Password : {}\n\n{}",
        auth_mode_label(state.auth_mode),
        username_marker,
        state.login_username,
        password_marker,
        masked,
        LOGIN_RULES,
    );
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn render_dashboard(frame: &mut Frame, area: Rect, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(area);

    render_table(
        frame,
        chunks[0],
        "My Team",
        state.focus == DashboardTable::Team,
        TEAM_HEADERS,
        &team_columns(),
        state.team_rows.rows(),
        0,
    );
    render_table(
        frame,
        chunks[1],
        "Players",
        state.focus == DashboardTable::Players,
        PLAYER_HEADERS,
        &player_columns(),
        state.player_rows.rows(),
        state.selected_player,
    );
    render_table(
        frame,
        chunks[2],
        "Transfer Market",
        state.focus == DashboardTable::Market,
        MARKET_HEADERS,
        &market_columns(),
        state.market_rows.rows(),
        state.selected_market,
    );

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);
}

const TEAM_HEADERS: &[&str] = &[
    "Id", "Name", "Country", "Balance", "Value", "Players", "Actions",
];

const PLAYER_HEADERS: &[&str] = &[
    "Id",
    "Type",
    "First name",
    "Last name",
    "Age",
    "Country",
    "Asset",
    "Transfer",
    "Actions",
];

const MARKET_HEADERS: &[&str] = &[
    "Id",
    "Type",
    "First name",
    "Last name",
    "Age",
    "Country",
    "Transfer",
    "Team",
    "Team country",
    "Team id",
    "Actions",
];

fn team_columns() -> [Constraint; 7] {
    [
        Constraint::Length(36),
        Constraint::Min(14),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(7),
        Constraint::Min(18),
    ]
}

fn player_columns() -> [Constraint; 9] {
    [
        Constraint::Length(36),
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Min(10),
        Constraint::Length(4),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Min(30),
    ]
}

fn market_columns() -> [Constraint; 11] {
    [
        Constraint::Length(36),
        Constraint::Length(12),
        Constraint::Min(9),
        Constraint::Min(9),
        Constraint::Length(4),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Min(12),
        Constraint::Length(12),
        Constraint::Length(36),
        Constraint::Length(10),
    ]
}

#[allow(clippy::too_many_arguments)]
fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    focused: bool,
    headers: &[&str],
    widths: &[Constraint],
    rows: &[TableRow],
    selected: usize,
) {
    let mut block = Block::default().title(title).borders(Borders::ALL);
    if focused {
        block = block.border_style(Style::default().fg(Color::Cyan));
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let header_area = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width,
        height: 1,
    };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(header_area);
    let header_style = Style::default().add_modifier(Modifier::BOLD);
    for (col, text) in cols.iter().zip(headers) {
        render_cell_text(frame, *col, text, header_style);
    }

    if rows.is_empty() {
        if inner.height > 1 {
            let empty_area = Rect {
                x: inner.x,
                y: inner.y + 1,
                width: inner.width,
                height: 1,
            };
            let empty =
                Paragraph::new("No rows yet").style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, empty_area);
        }
        return;
    }

    let visible = (inner.height - 1) as usize;
    let (start, end) = visible_range(selected, rows.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + 1 + i as u16,
            width: inner.width,
            height: 1,
        };

        let row_selected = focused && idx == selected;
        let row_style = if row_selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if row_selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);
        for (col, cell) in cols.iter().zip(&rows[idx].cells) {
            render_cell_text(frame, *col, cell, row_style);
        }
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No activity yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_prompt_overlay(frame: &mut Frame, area: Rect, title: &str, input: &str) {
    let popup_area = centered_rect(60, 24, area);
    frame.render_widget(Clear, popup_area);

    let text = format!("{title}\n\n> {input}_\n\nEnter Confirm | Esc Cancel");
    let prompt = Paragraph::new(text)
        .block(Block::default().title("Edit").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(prompt, popup_area);
}

fn render_alert_overlay(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let text = format!("{message}\n\nPress any key");
    let alert = Paragraph::new(text)
        .block(Block::default().title("Alert").borders(Borders::ALL))
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: false });
    frame.render_widget(alert, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Soccer Manager Terminal - Help",
        "",
        "Dashboard:",
        "  Tab          Cycle table focus",
        "  j/k or \u{2191}/\u{2193}   Move selection",
        "  r            Reload team and market",
        "  o            Sign out",
        "  q / Esc      Quit",
        "",
        "My Team:       n Edit name | c Edit country",
        "Players:       f First name | l Last name | c Country | v Transfer value",
        "Market:        t Transfer the selected player",
        "",
        "Edits open a prompt pre-filled with the current value.",
        "Transfer value must be a whole number, 0 delists the player.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
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

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
