use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " /:search  Tab:mode  c:compress  ?:help ";

/// One-line bar showing the focused path, row info, key hints, or a status message.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            path_str,
            info,
            theme,
            status_message: None,
            is_error: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }
}

/// Keep the last `budget` chars of `s`, marking the cut with `...`.
fn truncate_left(s: &str, budget: usize) -> String {
    let len = s.chars().count();
    if len <= budget {
        return s.to_string();
    }
    if budget <= 3 {
        return s.chars().take(budget).collect();
    }
    let tail: String = s.chars().skip(len - (budget - 3)).collect();
    format!("...{}", tail)
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let width = area.width as usize;
        buf.set_style(area, Style::default().bg(self.theme.status_bg));

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default()
                    .bg(self.theme.status_bg)
                    .fg(self.theme.success_fg)
            };
            let display = format!("{:<width$}", msg, width = width);
            buf.set_line(area.x, area.y, &Line::from(Span::styled(display, style)), area.width);
            return;
        }

        // [path] ... [info] [hints]
        let hints_len = KEY_HINTS.chars().count();
        let info_len = self.info.chars().count();
        let remaining = width.saturating_sub(hints_len);
        let path_budget = remaining.saturating_sub(info_len + 1);
        let path_display = truncate_left(self.path_str, path_budget);
        let info_display: String = self
            .info
            .chars()
            .take(remaining.saturating_sub(path_display.chars().count()))
            .collect();
        let gap = remaining
            .saturating_sub(path_display.chars().count())
            .saturating_sub(info_display.chars().count());

        let spans = vec![
            Span::styled(path_display, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(info_display, Style::default().fg(self.theme.info_fg)),
            Span::styled(
                KEY_HINTS,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ),
        ];
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use ratatui::style::Color;

    fn render_to_string(widget: StatusBarWidget, width: u16) -> (Buffer, String) {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        let content = (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        (buf, content)
    }

    #[test]
    fn test_normal_bar_rendering() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("src/lib/index.ts", "3/12 · Substring", &tc);
        let (_, content) = render_to_string(widget, 100);
        assert!(content.starts_with("src/lib/index.ts"));
        assert!(content.contains("3/12 · Substring"));
        assert!(content.contains("/:search"));
    }

    #[test]
    fn test_status_message_success() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("path", "info", &tc).status_message("Compression off", false);
        let (buf, content) = render_to_string(widget, 60);
        assert!(content.contains("Compression off"));
        assert!(!content.contains("info"));
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::Rgb(166, 227, 161));
    }

    #[test]
    fn test_status_message_error() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("path", "info", &tc).status_message("regex parse error", true);
        let (buf, _) = render_to_string(widget, 60);
        let cell = buf.cell((0, 0)).unwrap();
        assert_eq!(cell.bg, Color::Rgb(243, 139, 168));
        assert_eq!(cell.fg, Color::Rgb(205, 214, 244));
    }

    #[test]
    fn test_long_path_is_truncated_from_the_left() {
        assert_eq!(truncate_left("a/very/long/path.rs", 10), "...path.rs");
        assert_eq!(truncate_left("short", 10), "short");
        assert_eq!(truncate_left("abcdef", 2), "ab");
    }

    #[test]
    fn test_zero_area_does_not_panic() {
        let tc = theme::dark_theme();
        let widget = StatusBarWidget::new("/path", "info", &tc);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }
}
