use boardview_core::color::{contrast_color, Foreground, Rgb};
use boardview_core::project::{Content, Label};
use boardview_core::BoardViewModel;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

pub const ASSIGNEE_PREFIX: &str = "担当: ";

pub struct ProjectBoard {
    columns: Vec<BoardColumn>,
    active_column: usize,
}

struct BoardColumn {
    status: String,
    cards: Vec<Content>,
    list_state: ListState,
}

impl ProjectBoard {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            active_column: 0,
        }
    }

    /// Replace the whole board with one column per bucket, in key order.
    pub fn render_model(&mut self, vm: &BoardViewModel) {
        self.clear();
        self.columns = vm
            .iter()
            .map(|(status, cards)| {
                let mut list_state = ListState::default();
                if !cards.is_empty() {
                    list_state.select(Some(0));
                }
                BoardColumn {
                    status: status.to_string(),
                    cards: cards.to_vec(),
                    list_state,
                }
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.active_column = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.status.as_str()).collect()
    }

    pub fn cards(&self, column: usize) -> &[Content] {
        self.columns
            .get(column)
            .map(|c| c.cards.as_slice())
            .unwrap_or_default()
    }

    /// Returns the currently highlighted card, if any.
    pub fn selected_card(&self) -> Option<&Content> {
        let col = self.columns.get(self.active_column)?;
        let idx = col.list_state.selected()?;
        col.cards.get(idx)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => {
                if self.active_column > 0 {
                    self.active_column -= 1;
                }
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if self.active_column + 1 < self.columns.len() {
                    self.active_column += 1;
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(col) = self.columns.get_mut(self.active_column) {
                    let current = col.list_state.selected().unwrap_or(0);
                    if current + 1 < col.cards.len() {
                        col.list_state.select(Some(current + 1));
                    }
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(col) = self.columns.get_mut(self.active_column) {
                    let current = col.list_state.selected().unwrap_or(0);
                    if current > 0 {
                        col.list_state.select(Some(current - 1));
                    }
                }
            }
            KeyCode::Char('g') => {
                if let Some(col) = self.columns.get_mut(self.active_column) {
                    if !col.cards.is_empty() {
                        col.list_state.select(Some(0));
                    }
                }
            }
            KeyCode::Char('G') => {
                if let Some(col) = self.columns.get_mut(self.active_column) {
                    if !col.cards.is_empty() {
                        col.list_state.select(Some(col.cards.len() - 1));
                    }
                }
            }
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let col_count = self.columns.len() as u16;
        if col_count == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..col_count)
            .map(|_| Constraint::Ratio(1, col_count as u32))
            .collect();

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (i, (col, chunk)) in self.columns.iter().zip(chunks.iter()).enumerate() {
            let is_active = i == self.active_column;
            self.render_column(frame, col, *chunk, is_active);
        }
    }

    fn render_column(&self, frame: &mut Frame, col: &BoardColumn, area: Rect, is_active: bool) {
        let title = format!(" {} ({}) ", col.status, col.cards.len());

        let border_style = if is_active {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let items: Vec<ListItem> = col.cards.iter().map(card_item).collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).bold())
            .highlight_symbol("> ");

        let mut state = col.list_state.clone();
        frame.render_stateful_widget(list, area, &mut state);
    }
}

impl Default for ProjectBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Title styled as a link for issues, plain for drafts.
pub fn title_span(card: &Content) -> Span<'_> {
    match card {
        Content::Issue(issue) => Span::styled(
            issue.title.as_str(),
            Style::default().fg(Color::LightBlue).underlined(),
        ),
        Content::DraftIssue(draft) => Span::raw(draft.title.as_str()),
    }
}

pub fn label_style(label: &Label) -> Style {
    let fg = match contrast_color(&label.color) {
        Foreground::Dark => Color::Black,
        Foreground::Light => Color::White,
    };
    let style = Style::default().fg(fg);
    match Rgb::from_hex(&label.color) {
        Some(rgb) => style.bg(Color::Rgb(rgb.r, rgb.g, rgb.b)),
        None => style,
    }
}

/// Label chips separated by single spaces.
pub fn label_line(labels: &[Label]) -> Line<'_> {
    let mut spans = Vec::with_capacity(labels.len() * 2);
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(format!(" {} ", label.name), label_style(label)));
    }
    Line::from(spans)
}

fn card_item(card: &Content) -> ListItem<'_> {
    let mut lines = vec![Line::from(title_span(card))];
    match card {
        Content::Issue(issue) => {
            if let Some(assignees) = issue.assignee_line() {
                lines.push(Line::styled(
                    format!("{ASSIGNEE_PREFIX}{assignees}"),
                    Style::default().fg(Color::Gray),
                ));
            }
            if !issue.labels.is_empty() {
                lines.push(label_line(&issue.labels));
            }
        }
        Content::DraftIssue(_) => {}
    }
    ListItem::new(lines)
}

#[cfg(test)]
mod tests {
    use boardview_core::project::{Assignee, DraftIssue, FieldValue, Issue, ProjectItem};
    use boardview_core::ProjectSnapshot;
    use chrono::Utc;

    use super::*;

    fn issue(title: &str) -> Content {
        Content::Issue(Issue {
            title: title.into(),
            url: format!("https://github.com/o/r/issues/{title}"),
            assignees: vec![Assignee { login: "alice".into() }],
            labels: vec![Label {
                name: "bug".into(),
                color: "d73a4a".into(),
            }],
        })
    }

    fn vm(items: Vec<(Content, &str)>) -> BoardViewModel {
        BoardViewModel::build(&ProjectSnapshot {
            title: "p".into(),
            items: items
                .into_iter()
                .map(|(content, status)| ProjectItem {
                    content: Some(content),
                    field_values: vec![FieldValue {
                        name: status.into(),
                        field_name: "Status".into(),
                    }],
                })
                .collect(),
            fetched_at: Utc::now(),
        })
    }

    fn make_board() -> ProjectBoard {
        let mut board = ProjectBoard::new();
        board.render_model(&vm(vec![
            (issue("t1"), "Todo"),
            (issue("t2"), "Todo"),
            (issue("p1"), "In Progress"),
            (
                Content::DraftIssue(DraftIssue { title: "d1".into() }),
                "Done",
            ),
        ]));
        board
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, crossterm::event::KeyModifiers::NONE)
    }

    #[test]
    fn columns_follow_model_order() {
        let board = make_board();
        assert_eq!(board.column_names(), vec!["Todo", "In Progress", "Done"]);
        assert_eq!(board.cards(0).len(), 2);
        assert!(board.cards(9).is_empty());
    }

    #[test]
    fn render_model_replaces_previous_board() {
        let mut board = make_board();
        board.handle_key(key(KeyCode::Char('l')));
        board.render_model(&vm(vec![(issue("x"), "Only")]));
        assert_eq!(board.column_names(), vec!["Only"]);
        assert_eq!(board.selected_card().unwrap().title(), "x");

        board.render_model(&vm(vec![(issue("x"), "Only")]));
        assert_eq!(board.column_names(), vec!["Only"]);
    }

    #[test]
    fn navigation_moves_selection() {
        let mut board = make_board();
        assert_eq!(board.selected_card().unwrap().title(), "t1");

        board.handle_key(key(KeyCode::Char('j')));
        assert_eq!(board.selected_card().unwrap().title(), "t2");
        board.handle_key(key(KeyCode::Char('j')));
        assert_eq!(board.selected_card().unwrap().title(), "t2");

        board.handle_key(key(KeyCode::Char('l')));
        board.handle_key(key(KeyCode::Char('l')));
        assert_eq!(board.selected_card().unwrap().title(), "d1");
        board.handle_key(key(KeyCode::Char('l')));
        assert_eq!(board.selected_card().unwrap().title(), "d1");

        board.handle_key(key(KeyCode::Char('h')));
        assert_eq!(board.selected_card().unwrap().title(), "p1");
    }

    #[test]
    fn jump_to_first_and_last() {
        let mut board = make_board();
        board.handle_key(key(KeyCode::Char('G')));
        assert_eq!(board.selected_card().unwrap().title(), "t2");
        board.handle_key(key(KeyCode::Char('g')));
        assert_eq!(board.selected_card().unwrap().title(), "t1");
    }

    #[test]
    fn clear_empties_board() {
        let mut board = make_board();
        board.clear();
        assert!(board.is_empty());
        assert!(board.selected_card().is_none());
    }

    #[test]
    fn label_colors_follow_contrast_rule() {
        let light_bg = Label {
            name: "enhancement".into(),
            color: "a2eeef".into(),
        };
        let style = label_style(&light_bg);
        assert_eq!(style.fg, Some(Color::Black));
        assert_eq!(style.bg, Some(Color::Rgb(0xa2, 0xee, 0xef)));

        let dark_bg = Label {
            name: "bug".into(),
            color: "d73a4a".into(),
        };
        assert_eq!(label_style(&dark_bg).fg, Some(Color::White));
    }

    #[test]
    fn malformed_label_color_has_no_background() {
        let label = Label {
            name: "odd".into(),
            color: "nope".into(),
        };
        let style = label_style(&label);
        assert_eq!(style.fg, Some(Color::White));
        assert_eq!(style.bg, None);
    }

    #[test]
    fn issue_card_has_assignee_and_label_lines() {
        let card = issue("t1");
        let item = card_item(&card);
        assert_eq!(item.height(), 3);

        let draft = Content::DraftIssue(DraftIssue { title: "d".into() });
        assert_eq!(card_item(&draft).height(), 1);
    }

    #[test]
    fn title_span_styles() {
        let card = issue("t1");
        let span = title_span(&card);
        assert!(span.style.add_modifier.contains(Modifier::UNDERLINED));

        let draft = Content::DraftIssue(DraftIssue { title: "d".into() });
        assert_eq!(title_span(&draft).style, Style::default());
    }
}
