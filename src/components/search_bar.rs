use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use tree_explorer::SearchMode;

use crate::theme::ThemeColors;

/// One-line search input: prompt, query with cursor, and the mode label.
pub struct SearchBarWidget<'a> {
    query: &'a str,
    cursor_position: usize,
    mode: SearchMode,
    case_sensitive: bool,
    editing: bool,
    theme: &'a ThemeColors,
}

impl<'a> SearchBarWidget<'a> {
    pub fn new(query: &'a str, cursor_position: usize, theme: &'a ThemeColors) -> Self {
        Self {
            query,
            cursor_position,
            mode: SearchMode::default(),
            case_sensitive: false,
            editing: false,
            theme,
        }
    }

    pub fn mode(mut self, mode: SearchMode, case_sensitive: bool) -> Self {
        self.mode = mode;
        self.case_sensitive = case_sensitive;
        self
    }

    /// Draw the cursor; otherwise the query is shown read-only.
    pub fn editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }
}

impl<'a> Widget for SearchBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let prompt_style = Style::default()
            .fg(self.theme.border_focused_fg)
            .add_modifier(Modifier::BOLD);
        let input_style = Style::default().fg(self.theme.tree_fg);
        let cursor_style = Style::default()
            .bg(self.theme.tree_fg)
            .fg(self.theme.status_bg)
            .add_modifier(Modifier::BOLD);

        let mut spans = vec![Span::styled("/ ", prompt_style)];
        if self.editing {
            let pos = self.cursor_position.min(self.query.len());
            let (before, rest) = self.query.split_at(pos);
            let mut rest_chars = rest.chars();
            let cursor_char = rest_chars
                .next()
                .map(String::from)
                .unwrap_or_else(|| " ".to_string());
            spans.push(Span::styled(before, input_style));
            spans.push(Span::styled(cursor_char, cursor_style));
            spans.push(Span::styled(rest_chars.as_str(), input_style));
        } else if self.query.is_empty() {
            spans.push(Span::styled(
                "press / to search",
                Style::default().fg(self.theme.dim_fg),
            ));
        } else {
            spans.push(Span::styled(self.query, input_style));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);

        let label = format!(
            "[{}{}]",
            self.mode.label(),
            if self.case_sensitive { " Aa" } else { "" }
        );
        let label_len = label.chars().count() as u16;
        if area.width > label_len + 4 {
            buf.set_string(
                area.x + area.width - label_len,
                area.y,
                label,
                Style::default().fg(self.theme.info_fg),
            );
        }
    }
}
