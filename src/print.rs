//! Plain-text rendering of the visible rows for `--print`.

use std::fmt::Write;

use tree_explorer::{NodeKind, VisibleNodes};

/// One line per row: focus marker, two spaces per depth, indicator, name.
pub fn render_rows(visible: VisibleNodes<'_>) -> String {
    let mut out = String::new();
    for node in visible.nodes {
        let focus = if visible.is_focused(node) { ">" } else { " " };
        let indent = "  ".repeat(visible.depth_of(node).unwrap_or(0));
        let marker = match node.kind {
            NodeKind::Directory if visible.is_expanded(node) => "▾",
            NodeKind::Directory => "▸",
            NodeKind::File => "·",
        };
        let _ = writeln!(out, "{}{}{} {}", focus, indent, marker, node.name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_explorer::tree::TreeBuilder;
    use tree_explorer::{GeneratorOptions, SearchMode, SearchQuery, VisibleNodesGenerator};

    fn generator() -> VisibleNodesGenerator {
        let mut t = TreeBuilder::new();
        let index = t.file("src/lib/index.ts");
        let util = t.file("src/lib/util.ts");
        let lib = t.directory("src/lib", vec![index, util]);
        let src = t.directory("src", vec![lib]);
        let readme = t.file("README.md");
        let root = t.root("project", vec![src, readme]);
        VisibleNodesGenerator::new(root, GeneratorOptions { compress: true })
    }

    #[test]
    fn prints_collapsed_top_level() {
        let gen = generator();
        assert_eq!(render_rows(gen.visible_nodes()), " ▸ src/lib\n · README.md\n");
    }

    #[test]
    fn prints_search_result_with_focus() {
        let mut gen = generator();
        let query = SearchQuery::new("index", SearchMode::Substring, false)
            .unwrap()
            .unwrap();
        gen.search_query(Some(&query));
        let target = gen.locate_and_expand("src/lib/index.ts", true);
        gen.set_focus(target);
        assert_eq!(
            render_rows(gen.visible_nodes()),
            " ▾ src/lib\n>  · index.ts\n"
        );
    }

    #[test]
    fn empty_rows_print_nothing() {
        let mut gen = generator();
        let query = SearchQuery::new("nothing", SearchMode::Substring, false)
            .unwrap()
            .unwrap();
        gen.search_query(Some(&query));
        assert_eq!(render_rows(gen.visible_nodes()), "");
    }
}
