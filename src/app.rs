use std::sync::Arc;
use std::time::Instant;

use ratatui::layout::Rect;
use tracing::{debug, info};

use tree_explorer::config::AppConfig;
use tree_explorer::tree::expansion::is_ancestor_path;
use tree_explorer::{
    GeneratorOptions, SearchMode, SearchQuery, TreeNode, VisibleNodes, VisibleNodesGenerator,
};

use crate::theme::{resolve_theme, ThemeColors};

/// Application mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Keystrokes edit the search bar.
    Search,
}

/// Text and cursor of the search bar.
#[derive(Debug, Default)]
pub struct SearchInput {
    pub query: String,
    pub cursor_position: usize,
}

/// A transient message shown in the status bar.
#[derive(Debug)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Main application state.
pub struct App {
    pub generator: VisibleNodesGenerator,
    pub mode: AppMode,
    pub search_input: SearchInput,
    pub search_mode: SearchMode,
    pub case_sensitive: bool,
    /// The query the current rows were filtered with.
    pub active_query: Option<SearchQuery>,
    /// Folder the search is limited to.
    pub search_scope: Option<String>,
    pub scroll_offset: usize,
    /// Screen area of the tree rows, recorded on render for mouse hit-testing.
    pub tree_area: Rect,
    /// Path revealed at startup and on `r`.
    pub reveal_path: Option<String>,
    pub status_message: Option<StatusMessage>,
    pub show_help: bool,
    pub use_icons: bool,
    pub theme: ThemeColors,
    pub should_quit: bool,
}

impl App {
    /// Create a new App over a loaded tree.
    pub fn new(root: Arc<TreeNode>, config: &AppConfig, reveal_path: Option<String>) -> Self {
        Self {
            generator: VisibleNodesGenerator::new(root, config.generator_options()),
            mode: AppMode::Normal,
            search_input: SearchInput::default(),
            search_mode: config.search_mode(),
            case_sensitive: config.case_sensitive(),
            active_query: None,
            search_scope: None,
            scroll_offset: 0,
            tree_area: Rect::default(),
            reveal_path,
            status_message: None,
            show_help: false,
            use_icons: config.use_icons(),
            theme: resolve_theme(&config.theme),
            should_quit: false,
        }
    }

    pub fn visible(&self) -> VisibleNodes<'_> {
        self.generator.visible_nodes()
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.visible().focused_index()
    }

    fn focus_index(&mut self, index: usize) {
        let node = self.visible().nodes.get(index).cloned();
        if node.is_some() {
            self.generator.set_focus(node);
        }
    }

    fn focused_node(&self) -> Option<Arc<TreeNode>> {
        self.visible().focused_node.cloned()
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Move focus by `delta` rows, clamped to the list. Without focus the
    /// first row gets it.
    pub fn move_focus(&mut self, delta: isize) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let target = match self.focused_index() {
            Some(current) => current.saturating_add_signed(delta).min(len - 1),
            None => 0,
        };
        self.focus_index(target);
    }

    /// Jump to the first row.
    pub fn focus_first(&mut self) {
        self.focus_index(0);
    }

    /// Jump to the last row.
    pub fn focus_last(&mut self) {
        let len = self.visible().len();
        if len > 0 {
            self.focus_index(len - 1);
        }
    }

    /// Expand the focused directory, or step into its first child when it is
    /// already expanded.
    pub fn expand_focused(&mut self) {
        let Some(node) = self.focused_node() else {
            return;
        };
        if !node.is_expandable() {
            return;
        }
        if self.generator.is_expanded(&node) {
            if let Some(index) = self.focused_index() {
                let visible = self.visible();
                let child_row = visible
                    .nodes
                    .get(index + 1)
                    .is_some_and(|next| visible.depth_of(next) > visible.depth_of(&node));
                if child_row {
                    self.focus_index(index + 1);
                }
            }
        } else {
            self.generator.set_expanded(&node, true);
        }
    }

    /// Collapse the focused directory, or jump to the parent row when it is
    /// a file or already collapsed.
    pub fn collapse_focused(&mut self) {
        let Some(node) = self.focused_node() else {
            return;
        };
        if self.generator.is_expanded(&node) {
            self.generator.set_expanded(&node, false);
            return;
        }
        let parent = self
            .focused_index()
            .and_then(|index| self.visible().parent_index(index));
        if let Some(parent) = parent {
            self.focus_index(parent);
        }
    }

    pub fn toggle_focused(&mut self, recursive: bool) {
        if let Some(node) = self.focused_node() {
            self.generator.toggle(&node, recursive);
        }
    }

    // ── Search bar ──────────────────────────────────────────────────────────

    /// Enter search mode. The tree loses focus while the bar is edited.
    pub fn start_search(&mut self) {
        self.mode = AppMode::Search;
        self.search_input.cursor_position = self.search_input.query.len();
        self.generator.set_focus(None);
    }

    /// Insert a character at the cursor and re-run the search.
    pub fn search_input_char(&mut self, c: char) {
        self.search_input
            .query
            .insert(self.search_input.cursor_position, c);
        self.search_input.cursor_position += c.len_utf8();
        self.apply_search();
    }

    /// Delete the character before the cursor (backspace) and re-run the search.
    pub fn search_delete_char(&mut self) {
        if self.search_input.cursor_position == 0 {
            return;
        }
        let byte_pos = self.search_input.cursor_position;
        if let Some(prev_char) = self.search_input.query[..byte_pos].chars().next_back() {
            self.search_input.cursor_position -= prev_char.len_utf8();
            self.search_input
                .query
                .remove(self.search_input.cursor_position);
            self.apply_search();
        }
    }

    pub fn search_cursor_left(&mut self) {
        let pos = self.search_input.cursor_position;
        if let Some(prev_char) = self.search_input.query[..pos].chars().next_back() {
            self.search_input.cursor_position -= prev_char.len_utf8();
        }
    }

    pub fn search_cursor_right(&mut self) {
        let pos = self.search_input.cursor_position;
        if let Some(next_char) = self.search_input.query[pos..].chars().next() {
            self.search_input.cursor_position += next_char.len_utf8();
        }
    }

    /// Leave search mode keeping the filter, focusing the first row.
    pub fn accept_search(&mut self) {
        self.mode = AppMode::Normal;
        if self.focused_index().is_none() {
            self.focus_first();
        }
    }

    /// Clear the search text and filter, and leave search mode.
    pub fn cancel_search(&mut self) {
        self.mode = AppMode::Normal;
        self.search_input = SearchInput::default();
        self.search_scope = None;
        self.apply_search();
        self.focus_first();
    }

    /// Limit the search to the focused folder, or to the folder holding the
    /// focused file, and start editing the search text.
    pub fn search_in_focused_folder(&mut self) {
        let Some(node) = self.focused_node() else {
            return;
        };
        let folder = if node.is_directory() {
            Some(node.path.clone())
        } else {
            node.path
                .rsplit_once('/')
                .map(|(parent, _)| parent.to_string())
        };
        match &folder {
            Some(folder) => self.set_status_message(format!("Searching in {}", folder)),
            None => self.set_status_message("Searching everywhere".to_string()),
        }
        self.search_scope = folder;
        self.start_search();
        if !self.search_input.query.is_empty() {
            self.apply_search();
        }
    }

    /// Clear the search and show the focused result in the full tree,
    /// expanding the directories leading to it.
    pub fn go_to_focused(&mut self) {
        if self.active_query.is_none() {
            return;
        }
        let Some(node) = self.focused_node() else {
            return;
        };
        self.mode = AppMode::Normal;
        self.search_input = SearchInput::default();
        self.search_scope = None;
        self.active_query = None;
        self.generator.search_query(None);
        let target = self.generator.locate_and_expand(&node.path, true);
        self.generator.set_focus(target);
        self.scroll_offset = 0;
        debug!(path = %node.path, "went to search result");
    }

    /// Replace the search text, e.g. from the command line.
    pub fn set_search_text(&mut self, text: &str) {
        self.search_input.query = text.to_string();
        self.search_input.cursor_position = text.len();
        self.apply_search();
    }

    /// Compile the search text and re-derive the rows. A pattern that does
    /// not compile leaves the current rows untouched.
    pub fn apply_search(&mut self) {
        match SearchQuery::new(&self.search_input.query, self.search_mode, self.case_sensitive) {
            Ok(query) => {
                self.active_query = query;
                self.refresh_rows();
                self.scroll_offset = 0;
            }
            Err(e) => {
                debug!(error = %e, "search text rejected");
                self.set_status_error(e.to_string());
            }
        }
    }

    /// Re-derive the rows from the active query and folder scope.
    fn refresh_rows(&mut self) {
        match (&self.active_query, &self.search_scope) {
            (Some(query), Some(scope)) => {
                let in_scope =
                    |node: &TreeNode| is_ancestor_path(scope, &node.path) && query.matches(node);
                self.generator.search(Some(&in_scope));
            }
            (query, _) => self.generator.search_query(query.as_ref()),
        }
    }

    /// Switch to the next search mode and re-run the current search.
    pub fn cycle_search_mode(&mut self) {
        self.search_mode = self.search_mode.next();
        self.set_status_message(format!("Search mode: {}", self.search_mode.label()));
        if !self.search_input.query.is_empty() {
            self.apply_search();
        }
    }

    /// Turn directory-chain compression on or off. Rebuilds the generator
    /// and re-applies the current search.
    pub fn toggle_compress(&mut self) {
        let options = GeneratorOptions {
            compress: !self.generator.options().compress,
        };
        let root = Arc::clone(self.generator.source_root());
        self.generator = VisibleNodesGenerator::new(root, options);
        if self.active_query.is_some() {
            self.refresh_rows();
        }
        self.scroll_offset = 0;
        info!(compress = options.compress, "compression toggled");
        self.set_status_message(format!(
            "Compression {}",
            if options.compress { "on" } else { "off" }
        ));
    }

    /// Locate the reveal path, expanding its ancestors, and focus it.
    pub fn reveal(&mut self) {
        let Some(path) = self.reveal_path.clone() else {
            return;
        };
        match self.generator.locate_and_expand(&path, true) {
            Some(node) => self.generator.set_focus(Some(node)),
            None => self.set_status_error(format!("{} is not in the current tree", path)),
        }
    }

    /// Focus the row under a click at terminal row `y`.
    pub fn click_row(&mut self, y: u16) {
        let area = self.tree_area;
        if y < area.y || y >= area.y + area.height {
            return;
        }
        let index = self.scroll_offset + (y - area.y) as usize;
        if self.focused_index() == Some(index) {
            self.toggle_focused(false);
        } else {
            self.focus_index(index);
        }
    }

    /// Update the scroll offset so the focused row is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        let len = self.visible().len();
        self.scroll_offset = self.scroll_offset.min(len.saturating_sub(1));
        let Some(focused) = self.focused_index() else {
            return;
        };
        if focused < self.scroll_offset {
            self.scroll_offset = focused;
        } else if focused >= self.scroll_offset + visible_height {
            self.scroll_offset = focused - visible_height + 1;
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ── Status messages ─────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, text: String) {
        self.status_message = Some(StatusMessage {
            text,
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_status_error(&mut self, text: String) {
        self.status_message = Some(StatusMessage {
            text,
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some(message) = &self.status_message {
            if message.created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tree_explorer::tree::TreeBuilder;

    /// root → [docs → [api → [index.md]], src → [main.rs, lib.rs], README.md]
    fn sample_root() -> Arc<TreeNode> {
        let mut t = TreeBuilder::new();
        let index = t.file("docs/api/index.md");
        let api = t.directory("docs/api", vec![index]);
        let docs = t.directory("docs", vec![api]);
        let main = t.file("src/main.rs");
        let lib = t.file("src/lib.rs");
        let src = t.directory("src", vec![main, lib]);
        let readme = t.file("README.md");
        t.root("project", vec![docs, src, readme])
    }

    fn setup_app() -> App {
        let config = AppConfig::default();
        App::new(sample_root(), &config, Some("src/lib.rs".to_string()))
    }

    fn row_names(app: &App) -> Vec<String> {
        app.visible().nodes.iter().map(|n| n.name.clone()).collect()
    }

    #[test]
    fn starts_compressed_and_unfocused() {
        let app = setup_app();
        assert_eq!(row_names(&app), vec!["docs/api", "src", "README.md"]);
        assert!(app.focused_index().is_none());
    }

    #[test]
    fn move_focus_starts_at_top_and_clamps() {
        let mut app = setup_app();
        app.move_focus(1);
        assert_eq!(app.focused_index(), Some(0));
        app.move_focus(10);
        assert_eq!(app.focused_index(), Some(2));
        app.move_focus(-10);
        assert_eq!(app.focused_index(), Some(0));
    }

    #[test]
    fn focus_first_and_last() {
        let mut app = setup_app();
        app.focus_last();
        assert_eq!(app.focused_index(), Some(2));
        app.focus_first();
        assert_eq!(app.focused_index(), Some(0));
    }

    #[test]
    fn expand_then_step_into_child() {
        let mut app = setup_app();
        app.focus_index(1);
        app.expand_focused();
        assert_eq!(row_names(&app), vec!["docs/api", "src", "main.rs", "lib.rs", "README.md"]);
        assert_eq!(app.focused_index(), Some(1));
        app.expand_focused();
        assert_eq!(app.focused_index(), Some(2));
    }

    #[test]
    fn collapse_jumps_to_parent_then_collapses() {
        let mut app = setup_app();
        app.focus_index(1);
        app.expand_focused();
        app.focus_index(3);
        app.collapse_focused();
        assert_eq!(app.focused_index(), Some(1));
        app.collapse_focused();
        assert_eq!(row_names(&app), vec!["docs/api", "src", "README.md"]);
    }

    #[test]
    fn expand_on_file_is_noop() {
        let mut app = setup_app();
        app.focus_last();
        app.expand_focused();
        assert_eq!(app.visible().len(), 3);
    }

    #[test]
    fn typing_in_search_filters_live() {
        let mut app = setup_app();
        app.start_search();
        assert_eq!(app.mode, AppMode::Search);
        for c in "main".chars() {
            app.search_input_char(c);
        }
        assert_eq!(row_names(&app), vec!["src", "main.rs"]);
        app.search_delete_char();
        assert_eq!(app.search_input.query, "mai");
        app.accept_search();
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.focused_index(), Some(0));
    }

    #[test]
    fn cancel_search_restores_full_tree() {
        let mut app = setup_app();
        app.set_search_text("index");
        assert_eq!(row_names(&app), vec!["docs/api", "index.md"]);
        app.cancel_search();
        assert!(app.search_input.query.is_empty());
        assert!(app.active_query.is_none());
        assert_eq!(row_names(&app), vec!["docs/api", "src", "README.md"]);
    }

    #[test]
    fn invalid_regex_keeps_rows_and_reports() {
        let mut app = setup_app();
        app.search_mode = SearchMode::Regex;
        app.set_search_text("main");
        let before = row_names(&app);
        app.set_search_text("(main");
        assert_eq!(row_names(&app), before);
        assert!(app.status_message.as_ref().is_some_and(|m| m.is_error));
    }

    #[test]
    fn cycle_search_mode_reapplies_query() {
        let mut app = setup_app();
        app.set_search_text("mrs");
        assert!(app.visible().is_empty());
        app.cycle_search_mode(); // regex
        app.cycle_search_mode(); // fuzzy
        assert_eq!(app.search_mode, SearchMode::Fuzzy);
        assert_eq!(row_names(&app), vec!["src", "main.rs"]);
    }

    #[test]
    fn go_to_focused_result_shows_it_in_full_tree() {
        let mut app = setup_app();
        app.set_search_text("lib");
        app.accept_search();
        app.move_focus(1);
        app.go_to_focused();

        assert!(app.active_query.is_none());
        assert!(app.search_input.query.is_empty());
        assert_eq!(
            row_names(&app),
            vec!["docs/api", "src", "main.rs", "lib.rs", "README.md"]
        );
        let focused = app.visible().focused_node.cloned().unwrap();
        assert_eq!(focused.path, "src/lib.rs");
        assert_eq!(app.focused_index(), Some(3));
    }

    #[test]
    fn go_to_focused_without_search_is_noop() {
        let mut app = setup_app();
        app.focus_first();
        let before = app.generator.generation();
        app.go_to_focused();
        assert_eq!(app.generator.generation(), before);
        assert_eq!(app.focused_index(), Some(0));
    }

    #[test]
    fn folder_search_only_matches_inside_folder() {
        let mut app = setup_app();
        app.set_search_text("m");
        // index.md, main.rs and README.md all contain an "m".
        assert_eq!(app.visible().len(), 5);
        app.cancel_search();

        app.focus_index(1);
        app.search_in_focused_folder();
        assert_eq!(app.mode, AppMode::Search);
        assert_eq!(app.search_scope.as_deref(), Some("src"));
        app.search_input_char('m');
        assert_eq!(row_names(&app), vec!["src", "main.rs"]);

        app.cancel_search();
        assert!(app.search_scope.is_none());
        assert_eq!(row_names(&app), vec!["docs/api", "src", "README.md"]);
    }

    #[test]
    fn folder_search_from_file_uses_its_folder() {
        let mut app = setup_app();
        app.reveal();
        app.search_in_focused_folder();
        assert_eq!(app.search_scope.as_deref(), Some("src"));

        let mut app = setup_app();
        app.focus_last();
        app.search_in_focused_folder();
        assert!(app.search_scope.is_none());
    }

    #[test]
    fn folder_scope_survives_compression_toggle() {
        let mut app = setup_app();
        app.focus_index(1);
        app.search_in_focused_folder();
        app.set_search_text("rs");
        app.toggle_compress();
        assert_eq!(row_names(&app), vec!["src", "main.rs", "lib.rs"]);
    }

    #[test]
    fn toggle_compress_rebuilds_rows() {
        let mut app = setup_app();
        app.toggle_compress();
        assert!(!app.generator.options().compress);
        assert_eq!(row_names(&app), vec!["docs", "src", "README.md"]);
        app.toggle_compress();
        assert_eq!(row_names(&app), vec!["docs/api", "src", "README.md"]);
    }

    #[test]
    fn reveal_expands_and_focuses_path() {
        let mut app = setup_app();
        app.reveal();
        let focused = app.visible().focused_node.cloned().unwrap();
        assert_eq!(focused.path, "src/lib.rs");
        assert_eq!(app.focused_index(), Some(3));
    }

    #[test]
    fn reveal_of_filtered_path_reports_error() {
        let mut app = setup_app();
        app.set_search_text("index");
        app.reveal();
        assert!(app.focused_index().is_none());
        assert!(app.status_message.as_ref().is_some_and(|m| m.is_error));
    }

    #[test]
    fn click_focuses_then_toggles() {
        let mut app = setup_app();
        app.tree_area = Rect::new(0, 1, 40, 10);
        app.click_row(2);
        assert_eq!(app.focused_index(), Some(1));
        app.click_row(2);
        assert_eq!(app.visible().len(), 5);
        app.click_row(0);
        assert_eq!(app.focused_index(), Some(1));
    }

    #[test]
    fn update_scroll_follows_focus() {
        let mut app = setup_app();
        app.focus_index(1);
        app.expand_focused();
        app.focus_last();
        app.update_scroll(2);
        assert_eq!(app.scroll_offset, 3);
        app.focus_first();
        app.update_scroll(2);
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = setup_app();
        assert!(!app.should_quit);
        app.quit();
        assert!(app.should_quit);
    }

    #[test]
    fn clear_expired_status_removes_old() {
        let mut app = setup_app();
        app.set_status_message("fresh".to_string());
        app.clear_expired_status();
        assert!(app.status_message.is_some());
        if let Some(message) = app.status_message.as_mut() {
            message.created = Instant::now() - Duration::from_secs(5);
        }
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }
}
