//! Markdown rendering for wiki pages: HTML for the CLI, styled text for the TUI.

use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::prelude::*;

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

pub fn to_html(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options()));
    out
}

pub fn to_text(markdown: &str) -> Text<'static> {
    let mut writer = TextWriter::default();
    for event in Parser::new_ext(markdown, options()) {
        writer.event(event);
    }
    writer.finish()
}

#[derive(Default)]
struct TextWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// One entry per open list: the next number for ordered lists.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    /// Cells already written in the current table row.
    table_cells: usize,
}

impl TextWriter {
    fn style(&self) -> Style {
        self.styles
            .iter()
            .fold(Style::default(), |acc, s| acc.patch(*s))
    }

    fn push_text(&mut self, text: &str) {
        if !self.in_code_block {
            self.current.push(Span::styled(text.to_string(), self.style()));
            return;
        }
        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.flush();
            }
            if !segment.is_empty() {
                self.current
                    .push(Span::styled(format!("  {segment}"), self.style()));
            }
        }
    }

    fn flush(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn flush_pending(&mut self) {
        if !self.current.is_empty() {
            self.flush();
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_pending();
                self.styles.push(heading_style(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush();
                self.styles.pop();
                self.blank();
            }
            Event::Start(Tag::Paragraph) => {
                // Inside a list item the marker is still pending.
                if self.lists.is_empty() {
                    self.flush_pending();
                }
            }
            Event::End(TagEnd::Paragraph) => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            Event::Start(Tag::List(start)) => {
                self.flush_pending();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.flush_pending();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            Event::Start(Tag::Item) => {
                self.flush_pending();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::raw(format!("{indent}{marker}")));
            }
            Event::End(TagEnd::Item) => self.flush_pending(),
            Event::Start(Tag::Emphasis) => self.styles.push(Style::default().italic()),
            Event::Start(Tag::Strong) => self.styles.push(Style::default().bold()),
            Event::Start(Tag::Strikethrough) => {
                self.styles.push(Style::default().crossed_out())
            }
            Event::Start(Tag::Link { .. }) => self
                .styles
                .push(Style::default().fg(Color::LightBlue).underlined()),
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link) => {
                self.styles.pop();
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_pending();
                self.in_code_block = true;
                self.styles.push(Style::default().fg(Color::Yellow));
            }
            Event::End(TagEnd::CodeBlock) => {
                self.flush_pending();
                self.in_code_block = false;
                self.styles.pop();
                self.blank();
            }
            Event::Start(Tag::Table(_)) => {
                self.flush_pending();
                self.table_cells = 0;
            }
            Event::Start(Tag::TableHead) => self.styles.push(Style::default().bold()),
            Event::End(TagEnd::TableHead) => {
                self.flush();
                self.styles.pop();
                self.table_cells = 0;
            }
            Event::End(TagEnd::TableRow) => {
                self.flush();
                self.table_cells = 0;
            }
            Event::Start(Tag::TableCell) => {
                if self.table_cells > 0 {
                    self.current
                        .push(Span::styled(" │ ", Style::default().fg(Color::DarkGray)));
                }
                self.table_cells += 1;
            }
            Event::End(TagEnd::Table) => self.blank(),
            Event::Start(Tag::HtmlBlock) => self.flush_pending(),
            Event::End(TagEnd::HtmlBlock) => {
                self.flush_pending();
                self.blank();
            }
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self
                .current
                .push(Span::styled(code.to_string(), self.style().fg(Color::Yellow))),
            Event::Html(raw) => {
                for line in raw.lines().filter(|l| !l.trim().is_empty()) {
                    self.current.push(Span::styled(
                        line.trim_end().to_string(),
                        Style::default().fg(Color::DarkGray),
                    ));
                    self.flush();
                }
            }
            Event::InlineHtml(raw) => self.current.push(Span::styled(
                raw.to_string(),
                Style::default().fg(Color::DarkGray),
            )),
            Event::SoftBreak => self.current.push(Span::raw(" ")),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush_pending();
                self.lines.push(Line::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                ));
                self.blank();
            }
            Event::TaskListMarker(done) => {
                self.current
                    .push(Span::raw(if done { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Text<'static> {
        self.flush_pending();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        Text::from(self.lines)
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().fg(Color::Cyan).bold().underlined(),
        HeadingLevel::H2 => Style::default().fg(Color::Cyan).bold(),
        _ => Style::default().bold(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &Text) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn html_output() {
        let html = to_html("# Title\n\nSome *text*.");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>text</em>"));
    }

    #[test]
    fn heading_is_styled_and_followed_by_blank() {
        let text = to_text("# Welcome\nbody");
        let lines = plain(&text);
        assert_eq!(lines, vec!["Welcome", "", "body"]);
        let heading = &text.lines[0].spans[0];
        assert!(heading.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn bullet_and_ordered_lists() {
        let lines = plain(&to_text("- one\n- two\n\n1. first\n2. second\n"));
        assert_eq!(
            lines,
            vec!["• one", "• two", "", "1. first", "2. second"]
        );
    }

    #[test]
    fn nested_list_is_indented() {
        let lines = plain(&to_text("- outer\n  - inner\n"));
        assert_eq!(lines, vec!["• outer", "  • inner"]);
    }

    #[test]
    fn code_block_keeps_lines() {
        let lines = plain(&to_text("```\ncargo build\ncargo test\n```\n"));
        assert_eq!(lines, vec!["  cargo build", "  cargo test"]);
    }

    #[test]
    fn task_list_markers() {
        let lines = plain(&to_text("- [x] done\n- [ ] open\n"));
        assert_eq!(lines, vec!["• [x] done", "• [ ] open"]);
    }

    #[test]
    fn inline_code_and_emphasis() {
        let text = to_text("run `make` *now*");
        let line = &text.lines[0];
        assert_eq!(plain(&text), vec!["run make now"]);
        assert_eq!(line.spans[1].style.fg, Some(Color::Yellow));
        assert!(line.spans[3].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn loose_list_keeps_marker_on_item_line() {
        let lines = plain(&to_text("- a\n\n- b\n"));
        assert_eq!(lines, vec!["• a", "• b"]);
    }

    #[test]
    fn table_rows_are_separate_lines() {
        let text = to_text("| Name | Status |\n|---|---|\n| ci | green |\n| lint | red |\n\nafter\n");
        assert_eq!(
            plain(&text),
            vec!["Name │ Status", "ci │ green", "lint │ red", "", "after"]
        );
        assert!(text.lines[0].spans[0]
            .style
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn html_block_does_not_merge_into_paragraphs() {
        let lines = plain(&to_text(
            "<details>\n<summary>More</summary>\n\nhidden\n\n</details>\n\nnext para\n",
        ));
        assert_eq!(
            lines,
            vec![
                "<details>",
                "<summary>More</summary>",
                "",
                "hidden",
                "",
                "</details>",
                "",
                "next para",
            ]
        );
    }

    #[test]
    fn empty_input_yields_empty_text() {
        assert!(to_text("").lines.is_empty());
    }
}
