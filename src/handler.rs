use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::{App, AppMode};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    match app.mode {
        AppMode::Normal => handle_normal_key(app, key),
        AppMode::Search => handle_search_key(app, key),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    if app.show_help {
        app.show_help = false;
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.move_focus(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_focus(-1),
        KeyCode::PageDown => app.move_focus(page(app)),
        KeyCode::PageUp => app.move_focus(-page(app)),
        KeyCode::Char('g') | KeyCode::Home => app.focus_first(),
        KeyCode::Char('G') | KeyCode::End => app.focus_last(),
        KeyCode::Char('l') | KeyCode::Right => app.expand_focused(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_focused(),
        KeyCode::Enter | KeyCode::Char(' ') => app.toggle_focused(false),
        KeyCode::Char('*') => app.toggle_focused(true),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('f') => app.search_in_focused_folder(),
        KeyCode::Char('o') => app.go_to_focused(),
        KeyCode::Tab => app.cycle_search_mode(),
        KeyCode::Char('c') => app.toggle_compress(),
        KeyCode::Char('r') => app.reveal(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Esc if app.active_query.is_some() => app.cancel_search(),
        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Down => app.accept_search(),
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Tab => app.cycle_search_mode(),
        KeyCode::Backspace => app.search_delete_char(),
        KeyCode::Left => app.search_cursor_left(),
        KeyCode::Right => app.search_cursor_right(),
        KeyCode::Char(c) => app.search_input_char(c),
        _ => {}
    }
}

fn page(app: &App) -> isize {
    app.tree_area.height.max(1) as isize
}

/// Handle a mouse event: clicks focus rows, the wheel moves focus.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.mode == AppMode::Search {
                app.accept_search();
            }
            app.click_row(mouse.row);
        }
        MouseEventKind::ScrollDown => app.move_focus(3),
        MouseEventKind::ScrollUp => app.move_focus(-3),
        _ => {}
    }
}
