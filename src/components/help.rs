use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::theme::ThemeColors;

struct KeyCategory {
    name: &'static str,
    entries: &'static [(&'static str, &'static str)],
}

const CATEGORIES: &[KeyCategory] = &[
    KeyCategory {
        name: "Navigation",
        entries: &[
            ("j / ↓", "Move down"),
            ("k / ↑", "Move up"),
            ("PgDn / PgUp", "Move one page"),
            ("g / Home", "Jump to first row"),
            ("G / End", "Jump to last row"),
            ("l / →", "Expand, or step into directory"),
            ("h / ←", "Collapse, or go to parent"),
            ("Enter / Space", "Toggle directory"),
            ("*", "Toggle directory and all below"),
        ],
    },
    KeyCategory {
        name: "Search",
        entries: &[
            ("/", "Edit search"),
            ("Enter", "Keep filter, back to tree"),
            ("Esc", "Clear filter"),
            ("Tab", "Cycle substring / regex / fuzzy"),
            ("f", "Search inside the focused folder"),
            ("o", "Show focused result in the full tree"),
        ],
    },
    KeyCategory {
        name: "View",
        entries: &[
            ("c", "Toggle directory compression"),
            ("r", "Reveal the --reveal path again"),
            ("?", "Toggle this help"),
            ("q / Ctrl+C", "Quit"),
        ],
    },
];

/// Centered keybinding reference.
pub struct HelpOverlay<'a> {
    theme: &'a ThemeColors,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a ThemeColors) -> Self {
        Self { theme }
    }

    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let header_style = Style::default()
            .fg(self.theme.border_focused_fg)
            .add_modifier(Modifier::BOLD);
        let key_style = Style::default()
            .fg(self.theme.match_fg)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(self.theme.tree_file_fg);

        let mut lines = Vec::new();
        for category in CATEGORIES {
            lines.push(Line::from(Span::styled(
                format!("── {} ", category.name),
                header_style,
            )));
            for (key, description) in category.entries {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {:<16}", key), key_style),
                    Span::styled(*description, desc_style),
                ]));
            }
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            " Press any key to close ",
            Style::default().fg(self.theme.dim_fg),
        )));
        lines
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = self.build_content_lines();
        let width = 56.min(area.width);
        let height = (lines.len() as u16 + 2).min(area.height);
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let overlay_area = Rect::new(x, y, width, height);

        Clear.render(overlay_area, buf);
        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused_fg))
            .style(Style::default().bg(self.theme.status_bg));
        let inner = block.inner(overlay_area);
        block.render(overlay_area, buf);

        for (i, line) in lines.iter().take(inner.height as usize).enumerate() {
            buf.set_line(inner.x + 1, inner.y + i as u16, line, inner.width.saturating_sub(2));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_categories_have_entries() {
        for cat in CATEGORIES {
            assert!(!cat.entries.is_empty(), "Category '{}' has no entries", cat.name);
        }
    }

    #[test]
    fn renders_inside_small_area() {
        let theme = crate::theme::dark_theme();
        let area = Rect::new(0, 0, 30, 8);
        let mut buf = Buffer::empty(area);
        HelpOverlay::new(&theme).render(area, &mut buf);
        let top: String = (0..30)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        assert!(top.contains("Help"));
    }
}
