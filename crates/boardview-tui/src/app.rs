use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use boardview_core::generation::{Generation, Ticket};
use boardview_core::project::Content;
use boardview_core::wiki::Navigation;
use boardview_core::{BoardViewModel, ProjectSnapshot, WikiNavigator};
use boardview_service::{BlockingBoardService, BoardRequest, ServiceError};
use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::components::progress_chart::ProgressChart;
use crate::components::project_board::{
    label_line, title_span, ProjectBoard, ASSIGNEE_PREFIX,
};
use crate::components::wiki_view::{WikiView, LOADING};

pub const TITLE_PREFIX: &str = "プロジェクト: ";
pub const ERROR_PREFIX: &str = "エラーが発生しました: ";

/// Which main panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Board,
    Wiki,
}

/// What the app is currently doing
#[derive(Debug, Clone)]
pub enum Mode {
    /// Board or wiki navigation
    Normal,
    /// Editing the connection form
    Form { form: ConnectForm },
    /// Viewing one card
    CardDetail { card: Content },
    /// Blocking error popup
    Alert { message: String },
    /// Typing a wiki page id
    GotoPage { input: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormField {
    #[default]
    Token,
    Owner,
    Repo,
    ProjectNumber,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Token => FormField::Owner,
            FormField::Owner => FormField::Repo,
            FormField::Repo => FormField::ProjectNumber,
            FormField::ProjectNumber => FormField::Token,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Token => FormField::ProjectNumber,
            FormField::Owner => FormField::Token,
            FormField::Repo => FormField::Owner,
            FormField::ProjectNumber => FormField::Repo,
        }
    }
}

/// The connection form. Fields are kept as typed text until submission.
#[derive(Clone, Default)]
pub struct ConnectForm {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub project_number: String,
    pub field: FormField,
    pub error: Option<String>,
}

impl ConnectForm {
    pub fn to_request(&self) -> Result<BoardRequest, String> {
        let project_number = self
            .project_number
            .trim()
            .parse::<u32>()
            .map_err(|_| "project number must be a positive integer".to_string())?;
        let request = BoardRequest {
            token: self.token.trim().to_string(),
            owner: self.owner.trim().to_string(),
            repo: self.repo.trim().to_string(),
            project_number,
        };
        request.validate().map_err(|e| e.to_string())?;
        Ok(request)
    }

    fn field_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Token => &mut self.token,
            FormField::Owner => &mut self.owner,
            FormField::Repo => &mut self.repo,
            FormField::ProjectNumber => &mut self.project_number,
        }
    }
}

impl std::fmt::Debug for ConnectForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectForm")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("project_number", &self.project_number)
            .field("field", &self.field)
            .field("error", &self.error)
            .finish()
    }
}

/// Startup state assembled from the command line.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub form: ConnectForm,
    pub navigator: WikiNavigator,
    pub initial_fragment: String,
}

/// Result of a worker thread, stamped with the ticket it was issued.
#[derive(Debug)]
pub enum Outcome {
    Board {
        ticket: Ticket,
        result: Result<ProjectSnapshot, ServiceError>,
    },
    Wiki {
        ticket: Ticket,
        page: String,
        result: Result<String, ServiceError>,
    },
}

pub struct App {
    service: Arc<BlockingBoardService>,
    view: View,
    mode: Mode,
    status_message: Option<String>,
    last_form: ConnectForm,
    project_title: Option<String>,
    fetched_at: Option<DateTime<Utc>>,
    board: ProjectBoard,
    chart: ProgressChart,
    wiki: WikiView,
    board_gen: Generation,
    wiki_gen: Generation,
    board_inflight: Option<Ticket>,
    wiki_inflight: Option<Ticket>,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
}

impl App {
    /// Submits the board right away when the prefilled form is complete,
    /// otherwise opens the form. Always loads the initial wiki page.
    pub fn new(service: Arc<BlockingBoardService>, config: AppConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            service,
            view: View::Board,
            mode: Mode::Normal,
            status_message: None,
            last_form: config.form.clone(),
            project_title: None,
            fetched_at: None,
            board: ProjectBoard::new(),
            chart: ProgressChart::new(),
            wiki: WikiView::new(config.navigator),
            board_gen: Generation::new(),
            wiki_gen: Generation::new(),
            board_inflight: None,
            wiki_inflight: None,
            tx,
            rx,
        };

        match config.form.to_request() {
            Ok(request) => app.submit(request),
            Err(_) => app.mode = Mode::Form { form: config.form },
        }
        app.navigate(&config.initial_fragment);
        app
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn project_title(&self) -> Option<&str> {
        self.project_title.as_deref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn board(&self) -> &ProjectBoard {
        &self.board
    }

    pub fn chart(&self) -> &ProgressChart {
        &self.chart
    }

    pub fn wiki(&self) -> &WikiView {
        &self.wiki
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode, Mode::Form { .. } | Mode::GotoPage { .. })
    }

    /// Returns true if the event loop should use a poll timeout instead of blocking.
    pub fn needs_polling(&self) -> bool {
        self.board_inflight.is_some() || self.wiki_inflight.is_some()
    }

    /// Tear down the previous board and chart, then fetch on a worker thread.
    pub fn submit(&mut self, request: BoardRequest) {
        self.board.clear();
        self.chart.dispose();
        self.project_title = None;
        self.fetched_at = None;

        let ticket = self.board_gen.advance();
        self.board_inflight = Some(ticket);
        tracing::info!(
            owner = %request.owner,
            repo = %request.repo,
            number = request.project_number,
            ticket = ticket.value(),
            "fetching project board"
        );

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = service.fetch_project(&request);
            let _ = tx.send(Outcome::Board { ticket, result });
        });
    }

    /// Load the page named by `fragment`. Pages missing from the menu are
    /// rejected without a request unless validation is off.
    pub fn navigate(&mut self, fragment: &str) {
        let ticket = self.wiki_gen.advance();
        match self.wiki.navigator().resolve(fragment) {
            Navigation::Unlisted(page) => {
                self.wiki_inflight = None;
                tracing::warn!(%page, "refusing unlisted wiki page");
                let message = ServiceError::UnknownPage(page.clone()).to_string();
                self.wiki.show_error(&page, message);
            }
            Navigation::Fetch(page) => {
                self.wiki_inflight = Some(ticket);
                self.wiki.show_loading(&page);
                tracing::debug!(%page, ticket = ticket.value(), "fetching wiki page");

                let service = Arc::clone(&self.service);
                let tx = self.tx.clone();
                thread::spawn(move || {
                    let result = service.fetch_page(&page);
                    let _ = tx.send(Outcome::Wiki {
                        ticket,
                        page,
                        result,
                    });
                });
            }
        }
    }

    /// Apply every outcome that has arrived. Called on timeout from the event loop.
    pub fn poll_outcomes(&mut self) {
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply(outcome);
        }
    }

    /// Block until nothing is in flight or `timeout` passes. Returns false on timeout.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.needs_polling() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(outcome) => self.apply(outcome),
                Err(_) => return false,
            }
        }
        true
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Board { ticket, result } => {
                if !self.board_gen.is_current(ticket) {
                    tracing::debug!(ticket = ticket.value(), "discarding stale board response");
                    return;
                }
                self.board_inflight = None;
                match result {
                    Ok(snapshot) => self.show_snapshot(snapshot),
                    Err(e) => {
                        tracing::warn!(error = %e, "board fetch failed");
                        self.mode = Mode::Alert {
                            message: format!("{ERROR_PREFIX}{e}"),
                        };
                    }
                }
            }
            Outcome::Wiki {
                ticket,
                page,
                result,
            } => {
                if !self.wiki_gen.is_current(ticket) {
                    tracing::debug!(%page, "discarding stale wiki response");
                    return;
                }
                self.wiki_inflight = None;
                match result {
                    Ok(markdown) => self.wiki.show_page(&page, &markdown),
                    Err(e) => {
                        tracing::warn!(%page, error = %e, "wiki fetch failed");
                        self.wiki.show_error(&page, e.to_string());
                    }
                }
            }
        }
    }

    fn show_snapshot(&mut self, snapshot: ProjectSnapshot) {
        let vm = BoardViewModel::build(&snapshot);
        tracing::info!(
            title = %snapshot.title,
            columns = vm.len(),
            items = vm.total_items(),
            "project board loaded"
        );
        self.chart.render_model(&vm);
        self.board.render_model(&vm);
        self.project_title = Some(snapshot.title);
        self.fetched_at = Some(snapshot.fetched_at);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        match &self.mode.clone() {
            Mode::Normal => self.handle_normal(key),
            Mode::Form { form } => self.handle_form(key, form.clone()),
            Mode::CardDetail { .. } => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                    self.mode = Mode::Normal;
                }
            }
            Mode::Alert { .. } => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                    self.mode = Mode::Normal;
                }
            }
            Mode::GotoPage { input } => self.handle_goto_page(key, input.clone()),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab => {
                self.view = match self.view {
                    View::Board => View::Wiki,
                    View::Wiki => View::Board,
                };
            }
            KeyCode::Char('c') => {
                self.mode = Mode::Form {
                    form: ConnectForm {
                        error: None,
                        ..self.last_form.clone()
                    },
                };
            }
            KeyCode::Char('/') => {
                self.mode = Mode::GotoPage {
                    input: String::new(),
                };
            }
            _ => match self.view {
                View::Board => self.handle_board_key(key),
                View::Wiki => self.handle_wiki_key(key),
            },
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(card) = self.board.selected_card() {
                    self.mode = Mode::CardDetail { card: card.clone() };
                }
            }
            KeyCode::Char('r') => match self.last_form.to_request() {
                Ok(request) => {
                    self.submit(request);
                    self.status_message = Some("Refreshing".into());
                }
                Err(_) => {
                    self.mode = Mode::Form {
                        form: self.last_form.clone(),
                    }
                }
            },
            _ => self.board.handle_key(key),
        }
    }

    fn handle_wiki_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(page) = self.wiki.selected_page().map(str::to_string) {
                    self.navigate(&page);
                }
            }
            KeyCode::Char('r') => {
                if let Some(page) = self.wiki.current_page().map(str::to_string) {
                    self.navigate(&page);
                }
            }
            _ => self.wiki.handle_key(key),
        }
    }

    fn handle_form(&mut self, key: KeyEvent, mut form: ConnectForm) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                form.field = form.field.next();
                self.mode = Mode::Form { form };
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.field = form.field.prev();
                self.mode = Mode::Form { form };
            }
            KeyCode::Enter => match form.to_request() {
                Ok(request) => {
                    form.error = None;
                    self.last_form = form;
                    self.mode = Mode::Normal;
                    self.view = View::Board;
                    self.submit(request);
                }
                Err(e) => {
                    form.error = Some(e);
                    self.mode = Mode::Form { form };
                }
            },
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                form.field_mut().pop();
                self.mode = Mode::Form { form };
            }
            KeyCode::Char(c) => {
                form.field_mut().push(c);
                self.mode = Mode::Form { form };
            }
            _ => {}
        }
    }

    fn handle_goto_page(&mut self, key: KeyEvent, mut input: String) {
        match key.code {
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                self.view = View::Wiki;
                self.navigate(&input);
            }
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::GotoPage { input };
            }
            KeyCode::Char(c) => {
                input.push(c);
                self.mode = Mode::GotoPage { input };
            }
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, layout[0]);
        match self.view {
            View::Board => self.render_board_view(frame, layout[1]),
            View::Wiki => self.wiki.render(frame, layout[1]),
        }
        self.render_status_bar(frame, layout[2]);

        // Overlays
        match &self.mode {
            Mode::Normal => {}
            Mode::Form { form } => self.render_form(frame, form, area),
            Mode::CardDetail { card } => self.render_card_detail(frame, card, area),
            Mode::Alert { message } => self.render_alert(frame, message, area),
            Mode::GotoPage { input } => self.render_input_bar(frame, " Page: ", input, area),
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" boardview ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("| "),
        ];
        if let Some(ref title) = self.project_title {
            spans.push(Span::styled(
                format!("{TITLE_PREFIX}{title}"),
                Style::default().fg(Color::Yellow),
            ));
        }
        if let Some(at) = self.fetched_at {
            spans.push(Span::styled(
                format!(" ({})", at.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.push(Span::raw(" | "));
        for (view, name) in [(View::Board, "Board"), (View::Wiki, "Wiki")] {
            let style = if view == self.view {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(format!(" {name} "), style));
        }
        frame.render_widget(Line::from(spans), area);
    }

    fn render_board_view(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(self.chart.height()), Constraint::Min(0)])
            .split(area);
        self.chart.render(frame, chunks[0]);

        if self.board.is_empty() {
            let hint = if self.board_inflight.is_some() {
                LOADING
            } else {
                "No board loaded. Press c to connect."
            };
            let paragraph = Paragraph::new(Line::styled(hint, Style::default().fg(Color::DarkGray)))
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(paragraph, chunks[1]);
        } else {
            self.board.render(frame, chunks[1]);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref msg) = self.status_message {
            let line = Line::from(Span::styled(
                format!(" {msg}"),
                Style::default().fg(Color::Yellow),
            ));
            frame.render_widget(line, area);
            return;
        }

        let hints: Vec<(&str, &str)> = match (&self.mode, self.view) {
            (Mode::Normal, View::Board) => vec![
                ("h/l", "column"),
                ("j/k", "card"),
                ("Enter", "detail"),
                ("r", "refresh"),
                ("c", "connect"),
                ("Tab", "wiki"),
                ("q", "quit"),
            ],
            (Mode::Normal, View::Wiki) => vec![
                ("j/k", "menu"),
                ("Enter", "open"),
                ("J/K", "scroll"),
                ("/", "go to"),
                ("r", "reload"),
                ("Tab", "board"),
                ("q", "quit"),
            ],
            (Mode::Form { .. }, _) => {
                vec![("Tab", "next field"), ("Enter", "submit"), ("Esc", "cancel")]
            }
            (Mode::CardDetail { .. }, _) | (Mode::Alert { .. }, _) => vec![("Esc", "close")],
            (Mode::GotoPage { .. }, _) => vec![("Enter", "open"), ("Esc", "cancel")],
        };

        let spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(format!(" {key}"), Style::default().fg(Color::Yellow).bold()),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();

        frame.render_widget(Line::from(spans), area);
    }

    fn render_input_bar(&self, frame: &mut Frame, label: &str, input: &str, area: Rect) {
        let input_area = Rect {
            x: area.x,
            y: area.y + area.height.saturating_sub(3),
            width: area.width,
            height: 3.min(area.height),
        };
        frame.render_widget(Clear, input_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(label);
        let paragraph = Paragraph::new(input).block(block);
        frame.render_widget(paragraph, input_area);
    }

    fn render_form(&self, frame: &mut Frame, form: &ConnectForm, area: Rect) {
        let popup = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Connect ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta));
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let masked = "*".repeat(form.token.chars().count());
        let fields = [
            (FormField::Token, "Token:   ", masked.as_str()),
            (FormField::Owner, "Owner:   ", form.owner.as_str()),
            (FormField::Repo, "Repo:    ", form.repo.as_str()),
            (FormField::ProjectNumber, "Project: ", form.project_number.as_str()),
        ];

        let mut lines = Vec::new();
        for (field, label, value) in fields {
            let label_style = if field == form.field {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(label, label_style),
                Span::raw(value),
            ]));
            lines.push(Line::from(""));
        }
        if let Some(ref err) = form.error {
            lines.push(Line::styled(err.as_str(), Style::default().fg(Color::Red)));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_card_detail(&self, frame: &mut Frame, card: &Content, area: Rect) {
        let popup = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Card ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let mut lines = vec![Line::from(title_span(card)), Line::from("")];
        match card {
            Content::Issue(issue) => {
                lines.push(Line::styled(
                    issue.url.as_str(),
                    Style::default().fg(Color::DarkGray),
                ));
                if let Some(assignees) = issue.assignee_line() {
                    lines.push(Line::from(format!("{ASSIGNEE_PREFIX}{assignees}")));
                }
                if !issue.labels.is_empty() {
                    lines.push(label_line(&issue.labels));
                }
            }
            Content::DraftIssue(_) => {
                lines.push(Line::styled("Draft", Style::default().fg(Color::DarkGray)));
            }
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, popup);
    }

    fn render_alert(&self, frame: &mut Frame, message: &str, area: Rect) {
        let popup = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));
        let paragraph = Paragraph::new(message)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(number: &str) -> ConnectForm {
        ConnectForm {
            token: " ghp_x ".into(),
            owner: "octo".into(),
            repo: "board".into(),
            project_number: number.into(),
            ..ConnectForm::default()
        }
    }

    #[test]
    fn form_builds_trimmed_request() {
        let req = form(" 3 ").to_request().unwrap();
        assert_eq!(req.token, "ghp_x");
        assert_eq!(req.project_number, 3);
    }

    #[test]
    fn form_rejects_bad_numbers() {
        assert!(form("").to_request().is_err());
        assert!(form("abc").to_request().is_err());
        assert!(form("-1").to_request().is_err());
        assert!(form("0").to_request().is_err());
    }

    #[test]
    fn form_rejects_missing_repo() {
        let mut f = form("1");
        f.repo = "  ".into();
        assert!(f.to_request().is_err());
    }

    #[test]
    fn form_fields_cycle() {
        let mut field = FormField::Token;
        for _ in 0..4 {
            field = field.next();
        }
        assert_eq!(field, FormField::Token);
        assert_eq!(FormField::Token.prev(), FormField::ProjectNumber);
    }

    #[test]
    fn form_debug_hides_token() {
        let rendered = format!("{:?}", form("1"));
        assert!(!rendered.contains("ghp_x"));
    }

    #[test]
    fn centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(60, 50, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert!(popup.x >= area.x && popup.right() <= area.right());
    }
}
