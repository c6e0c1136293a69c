use ratatui::{
    layout::{Alignment, Constraint, Layout},
    style::Style,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::help::HelpOverlay;
use crate::components::search_bar::SearchBarWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the explorer: search bar, tree rows, status bar.
pub fn render(app: &mut App, frame: &mut Frame) {
    let [search_area, tree_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let border_fg = if app.mode == AppMode::Normal {
        app.theme.border_focused_fg
    } else {
        app.theme.border_fg
    };
    let block = Block::default()
        .title(tree_title(app))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_fg));
    app.tree_area = block.inner(tree_area);
    app.update_scroll(app.tree_area.height as usize);

    frame.render_widget(
        SearchBarWidget::new(
            &app.search_input.query,
            app.search_input.cursor_position,
            &app.theme,
        )
        .mode(app.search_mode, app.case_sensitive)
        .editing(app.mode == AppMode::Search),
        search_area,
    );

    let visible = app.visible();
    if visible.is_empty() {
        let text = if app.active_query.is_some() {
            "No matches"
        } else {
            "Empty tree"
        };
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(app.theme.dim_fg))
                .block(block),
            tree_area,
        );
    } else {
        frame.render_widget(
            TreeWidget::new(visible, &app.theme)
                .query(app.active_query.as_ref())
                .scroll_offset(app.scroll_offset)
                .use_icons(app.use_icons)
                .block(block),
            tree_area,
        );
    }

    let focused_path = visible
        .focused_node
        .map(|node| node.path.as_str())
        .unwrap_or("");
    let info = format!(
        "{}/{} · {}",
        visible.focused_index().map_or(0, |i| i + 1),
        visible.len(),
        if app.generator.options().compress {
            "compressed"
        } else {
            "flat"
        }
    );
    let mut status = StatusBarWidget::new(focused_path, &info, &app.theme);
    if let Some(message) = &app.status_message {
        status = status.status_message(&message.text, message.is_error);
    }
    frame.render_widget(status, status_area);

    if app.show_help {
        frame.render_widget(HelpOverlay::new(&app.theme), frame.area());
    }
}

/// Root name, plus the active filter and its folder scope.
fn tree_title(app: &App) -> String {
    let root = &app.generator.source_root().name;
    match &app.active_query {
        Some(query) => match &app.search_scope {
            Some(scope) => format!(" {} · \"{}\" in {} ", root, query.text(), scope),
            None => format!(" {} · \"{}\" ", root, query.text()),
        },
        None => format!(" {} ", root),
    }
}
