use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use tree_explorer::{NodeKind, SearchQuery, TreeNode, VisibleNodes};

use crate::theme::ThemeColors;

/// Renders visible rows with box-drawing guides and search-match highlighting.
pub struct TreeWidget<'a> {
    visible: VisibleNodes<'a>,
    theme: &'a ThemeColors,
    query: Option<&'a SearchQuery>,
    scroll_offset: usize,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(visible: VisibleNodes<'a>, theme: &'a ThemeColors) -> Self {
        Self {
            visible,
            theme,
            query: None,
            scroll_offset: 0,
            use_icons: false,
            block: None,
        }
    }

    pub fn query(mut self, query: Option<&'a SearchQuery>) -> Self {
        self.query = query;
        self
    }

    pub fn scroll_offset(mut self, offset: usize) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn use_icons(mut self, use_icons: bool) -> Self {
        self.use_icons = use_icons;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Guide columns for the row at `index`: one per ancestor level, then
    /// the row's own connector. Top-level rows get none.
    fn build_prefix(&self, index: usize) -> String {
        let nodes = self.visible.nodes;
        let depth = self.visible.depth_of(&nodes[index]).unwrap_or(0);
        if depth == 0 {
            return String::new();
        }

        let mut prefix = String::new();
        for level in 1..depth {
            // Nearest preceding row at `level` is this row's ancestor there.
            let ancestor = (0..index)
                .rev()
                .find(|&j| self.visible.depth_of(&nodes[j]).is_some_and(|d| d <= level))
                .filter(|&j| self.visible.depth_of(&nodes[j]) == Some(level));
            match ancestor {
                Some(j) if !self.visible.is_last_sibling(j) => prefix.push_str("│  "),
                _ => prefix.push_str("   "),
            }
        }
        if self.visible.is_last_sibling(index) {
            prefix.push_str("└──");
        } else {
            prefix.push_str("├──");
        }
        prefix
    }

    fn item_indicator(&self, node: &TreeNode) -> &'static str {
        let expanded = self.visible.is_expanded(node);
        match (node.kind, self.use_icons) {
            (NodeKind::Directory, true) if expanded => "\u{f07c} ",
            (NodeKind::Directory, true) => "\u{f07b} ",
            (NodeKind::File, true) => file_icon_by_ext(&node.name),
            (NodeKind::Directory, false) if !node.is_expandable() => "▹ ",
            (NodeKind::Directory, false) if expanded => "▾ ",
            (NodeKind::Directory, false) => "▸ ",
            (NodeKind::File, false) => "· ",
        }
    }

    fn row_style(&self, node: &TreeNode, focused: bool) -> Style {
        if focused {
            return Style::default()
                .bg(self.theme.tree_focused_bg)
                .fg(self.theme.tree_focused_fg)
                .add_modifier(Modifier::BOLD);
        }
        match node.kind {
            NodeKind::Directory if !node.is_expandable() => Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::ITALIC),
            NodeKind::Directory => Style::default()
                .fg(self.theme.tree_dir_fg)
                .add_modifier(Modifier::BOLD),
            NodeKind::File => Style::default().fg(self.theme.tree_file_fg),
        }
    }

    /// Split `name` into spans, highlighting the chars the query matched.
    fn name_spans(&self, name: &str, base: Style) -> Vec<Span<'static>> {
        let indices = self
            .query
            .map(|q| q.match_indices(name))
            .unwrap_or_default();
        if indices.is_empty() {
            return vec![Span::styled(name.to_string(), base)];
        }

        let highlight = base.fg(self.theme.match_fg).add_modifier(Modifier::UNDERLINED);
        let mut spans = Vec::new();
        let mut run = String::new();
        let mut run_matched = false;
        for (i, c) in name.chars().enumerate() {
            let matched = indices.contains(&i);
            if matched != run_matched && !run.is_empty() {
                let style = if run_matched { highlight } else { base };
                spans.push(Span::styled(std::mem::take(&mut run), style));
            }
            run_matched = matched;
            run.push(c);
        }
        if !run.is_empty() {
            spans.push(Span::styled(run, if run_matched { highlight } else { base }));
        }
        spans
    }
}

/// Nerd Font icon for a file based on its extension.
fn file_icon_by_ext(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "rs" => "\u{e7a8} ",
        "py" => "\u{e73c} ",
        "js" | "jsx" => "\u{e74e} ",
        "ts" | "tsx" => "\u{e628} ",
        "html" | "htm" => "\u{e736} ",
        "css" | "scss" => "\u{e749} ",
        "json" => "\u{e60b} ",
        "toml" | "yaml" | "yml" | "ini" => "\u{e615} ",
        "md" | "markdown" | "txt" => "\u{e73e} ",
        "sh" | "bash" | "zsh" => "\u{f489} ",
        "go" => "\u{e627} ",
        "lock" => "\u{f023} ",
        "png" | "jpg" | "jpeg" | "gif" | "svg" => "\u{f1c5} ",
        "zip" | "tar" | "gz" | "xz" => "\u{f410} ",
        _ => "\u{f15b} ",
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        let visible_height = inner_area.height as usize;
        if self.visible.is_empty() || visible_height == 0 {
            return;
        }

        let guide_style = Style::default().fg(self.theme.tree_guide_fg);
        let rows = self
            .visible
            .nodes
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible_height);

        for (i, (index, node)) in rows.enumerate() {
            let y = inner_area.y + i as u16;
            let focused = self.visible.is_focused(node);
            let style = self.row_style(node, focused);

            let mut spans = vec![
                Span::styled(self.build_prefix(index), guide_style),
                Span::styled(self.item_indicator(node), style),
            ];
            spans.extend(self.name_spans(&node.name, style));

            if focused {
                // Paint the highlight across the full row width.
                buf.set_style(Rect::new(inner_area.x, y, inner_area.width, 1), style);
            }
            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}
