use boardview_core::wiki::menu_label;
use boardview_core::WikiNavigator;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use super::markdown;

pub const LOADING: &str = "読み込み中...";

#[derive(Debug, Clone, PartialEq)]
pub enum WikiContent {
    Empty,
    Page { page: String, text: Text<'static> },
    Error { page: String, message: String },
}

/// Menu of wiki pages plus the currently loaded page.
pub struct WikiView {
    navigator: WikiNavigator,
    menu_state: ListState,
    content: WikiContent,
    loading: Option<String>,
    scroll: u16,
}

impl WikiView {
    pub fn new(navigator: WikiNavigator) -> Self {
        let mut menu_state = ListState::default();
        if !navigator.pages().is_empty() {
            menu_state.select(Some(0));
        }
        Self {
            navigator,
            menu_state,
            content: WikiContent::Empty,
            loading: None,
            scroll: 0,
        }
    }

    pub fn navigator(&self) -> &WikiNavigator {
        &self.navigator
    }

    pub fn content(&self) -> &WikiContent {
        &self.content
    }

    pub fn loading(&self) -> Option<&str> {
        self.loading.as_deref()
    }

    pub fn show_loading(&mut self, page: &str) {
        self.loading = Some(page.to_string());
    }

    /// Replace the content with a rendered page and move the menu marker to it.
    pub fn show_page(&mut self, page: &str, markdown_src: &str) {
        self.loading = None;
        self.content = WikiContent::Page {
            page: page.to_string(),
            text: markdown::to_text(markdown_src),
        };
        self.navigator.activate(page);
        if let Some(idx) = self.navigator.active_index() {
            self.menu_state.select(Some(idx));
        }
        self.scroll = 0;
    }

    /// Show an inline error. The menu marker stays where it was.
    pub fn show_error(&mut self, page: &str, message: impl Into<String>) {
        self.loading = None;
        self.content = WikiContent::Error {
            page: page.to_string(),
            message: message.into(),
        };
        self.scroll = 0;
    }

    /// Page under the menu cursor.
    pub fn selected_page(&self) -> Option<&str> {
        let idx = self.menu_state.selected()?;
        self.navigator.pages().get(idx).map(String::as_str)
    }

    /// Page whose content (or error) is on screen.
    pub fn current_page(&self) -> Option<&str> {
        match &self.content {
            WikiContent::Empty => None,
            WikiContent::Page { page, .. } | WikiContent::Error { page, .. } => Some(page),
        }
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let len = self.navigator.pages().len();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let current = self.menu_state.selected().unwrap_or(0);
                if current + 1 < len {
                    self.menu_state.select(Some(current + 1));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let current = self.menu_state.selected().unwrap_or(0);
                if current > 0 {
                    self.menu_state.select(Some(current - 1));
                }
            }
            KeyCode::Char('J') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('K') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(area);

        let active = self.navigator.active();
        let items: Vec<ListItem> = self
            .navigator
            .pages()
            .iter()
            .map(|page| {
                let label = menu_label(page);
                if Some(page.as_str()) == active {
                    ListItem::new(Line::styled(
                        format!("● {label}"),
                        Style::default().fg(Color::Cyan).bold(),
                    ))
                } else {
                    ListItem::new(format!("  {label}"))
                }
            })
            .collect();
        let menu = List::new(items)
            .block(Block::default().title(" Wiki ").borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = self.menu_state.clone();
        frame.render_stateful_widget(menu, chunks[0], &mut state);

        let title = match (&self.loading, self.current_page()) {
            (Some(page), _) => format!(" {page} ({LOADING}) "),
            (None, Some(page)) => format!(" {page} "),
            (None, None) => " ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let body = match &self.content {
            WikiContent::Empty => Text::raw(""),
            WikiContent::Page { text, .. } => text.clone(),
            WikiContent::Error { message, .. } => {
                Text::styled(message.clone(), Style::default().fg(Color::Red))
            }
        };
        let paragraph = Paragraph::new(body)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, chunks[1]);
    }
}
