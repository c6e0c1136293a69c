use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;

use super::node::{NodeId, NodeKind, TreeNode};

/// Expansion state plus the flattened rows it produces.
///
/// Every operation takes the derived root explicitly; the layer never holds
/// on to a tree of its own.
#[derive(Debug, Default)]
pub struct ExpansionLayer {
    expanded: HashSet<String>,
    depths: HashMap<NodeId, usize>,
    nodes: Vec<Arc<TreeNode>>,
    /// Bumped on every flatten.
    generation: u64,
}

impl ExpansionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible rows in depth-first pre-order.
    pub fn nodes(&self) -> &[Arc<TreeNode>] {
        &self.nodes
    }

    pub fn depths(&self) -> &HashMap<NodeId, usize> {
        &self.depths
    }

    pub fn expanded(&self) -> &HashSet<String> {
        &self.expanded
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_expanded(&self, node: &TreeNode) -> bool {
        self.expanded.contains(&node.path)
    }

    /// Forget every expanded path. Rows are left as they are until the next
    /// flatten.
    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    /// Record a path as expanded without checking the node it names.
    pub fn insert_path(&mut self, path: impl Into<String>) {
        self.expanded.insert(path.into());
    }

    fn mark(&mut self, node: &TreeNode, expand: bool) {
        if expand && node.is_expandable() {
            self.expanded.insert(node.path.clone());
        } else {
            self.expanded.remove(&node.path);
        }
    }

    fn mark_recursive(&mut self, node: &TreeNode, expand: bool) {
        self.mark(node, expand);
        for child in node.children() {
            self.mark_recursive(child, expand);
        }
    }

    pub fn set_expanded(&mut self, root: Option<&Arc<TreeNode>>, node: &TreeNode, expand: bool) {
        self.mark(node, expand);
        self.flatten(root);
    }

    /// Flip the expansion of `node`. With `recursive`, the same target state
    /// is applied to every descendant and the rows are rebuilt once.
    pub fn toggle(&mut self, root: Option<&Arc<TreeNode>>, node: &TreeNode, recursive: bool) {
        let expand = !self.is_expanded(node);
        if recursive {
            self.mark_recursive(node, expand);
            self.flatten(root);
        } else {
            self.set_expanded(root, node, expand);
        }
    }

    /// Find the node at `path` in the derived tree and expand it.
    ///
    /// Directories passed through on the way down are expanded as well. With
    /// `expand_ancestors`, each ancestor path is located (and expanded) first,
    /// outermost to innermost.
    pub fn locate_and_expand(
        &mut self,
        root: Option<&Arc<TreeNode>>,
        path: &str,
        expand_ancestors: bool,
    ) -> Option<Arc<TreeNode>> {
        let path = path.trim_matches('/');
        let found = match root {
            Some(root) if !path.is_empty() => self.locate(root, path, expand_ancestors),
            _ => None,
        };
        self.flatten(root);
        found
    }

    fn locate(&mut self, root: &Arc<TreeNode>, path: &str, expand_ancestors: bool) -> Option<Arc<TreeNode>> {
        if expand_ancestors {
            if let Some((parent, _)) = path.rsplit_once('/') {
                self.locate(root, parent, true);
            }
        }

        let found = find_node(root, path, &mut |visited: &TreeNode| self.mark(visited, true));
        if let Some(node) = &found {
            self.mark(node, true);
        }
        found
    }

    /// Rebuild rows and depths from scratch.
    ///
    /// Top-level children of `root` sit at depth 0. A node's children are
    /// visited only when its path is expanded, it is a directory and it has
    /// at least one child.
    pub fn flatten(&mut self, root: Option<&Arc<TreeNode>>) {
        self.depths.clear();
        let mut nodes = Vec::new();

        if let Some(root) = root {
            let mut stack: Vec<(&Arc<TreeNode>, usize)> =
                root.children().iter().rev().map(|child| (child, 0)).collect();

            while let Some((node, depth)) = stack.pop() {
                nodes.push(Arc::clone(node));
                self.depths.insert(node.id, depth);

                let children = node.children();
                if node.kind == NodeKind::Directory
                    && !children.is_empty()
                    && self.expanded.contains(&node.path)
                {
                    stack.extend(children.iter().rev().map(|child| (child, depth + 1)));
                }
            }
        }

        self.nodes = nodes;
        self.generation += 1;
        trace!(
            rows = self.nodes.len(),
            expanded = self.expanded.len(),
            generation = self.generation,
            "flattened visible rows"
        );
    }

    /// Keep only expanded paths that name a directory row of `root`.
    ///
    /// Paths of the synthetic root and of directories folded away by
    /// compression are dropped.
    pub fn retain_addressable(&mut self, root: Option<&Arc<TreeNode>>) {
        let mut addressable = HashSet::new();
        if let Some(root) = root {
            let mut stack: Vec<&Arc<TreeNode>> = root.children().iter().collect();
            while let Some(node) = stack.pop() {
                if node.is_expandable() {
                    addressable.insert(node.path.as_str());
                    stack.extend(node.children());
                }
            }
        }
        self.expanded.retain(|path| addressable.contains(path.as_str()));
    }
}

/// Walk down from `root` toward `path`, one path segment at a time.
///
/// At each level the child whose path equals `path` is the result; a child
/// whose path is a whole-segment prefix of `path` is descended into and
/// passed to `visit`. Folded rows match on their full path. The root itself
/// is never visited.
pub fn find_node(
    root: &Arc<TreeNode>,
    path: &str,
    visit: &mut dyn FnMut(&TreeNode),
) -> Option<Arc<TreeNode>> {
    let mut current = root;
    loop {
        let mut next = None;
        for child in current.children() {
            if child.path == path {
                return Some(Arc::clone(child));
            }
            if is_ancestor_path(&child.path, path) {
                next = Some(child);
                break;
            }
        }

        let child = next?;
        visit(child);
        current = child;
    }
}

/// Whether `ancestor` is a whole-segment prefix of `path`.
pub fn is_ancestor_path(ancestor: &str, path: &str) -> bool {
    !ancestor.is_empty()
        && path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::filter::compress_children;
    use crate::tree::node::TreeBuilder;

    /// root
    /// ├── a/
    /// │   ├── a1/
    /// │   │   └── deep.txt
    /// │   └── a2.txt
    /// ├── b/
    /// │   └── b1.txt
    /// └── c.txt
    fn sample() -> Arc<TreeNode> {
        let mut t = TreeBuilder::new();
        let deep = t.file("a/a1/deep.txt");
        let a1 = t.directory("a/a1", vec![deep]);
        let a2 = t.file("a/a2.txt");
        let a = t.directory("a", vec![a1, a2]);
        let b1 = t.file("b/b1.txt");
        let b = t.directory("b", vec![b1]);
        let c = t.file("c.txt");
        t.root("root", vec![a, b, c])
    }

    fn paths(layer: &ExpansionLayer) -> Vec<&str> {
        layer.nodes().iter().map(|n| n.path.as_str()).collect()
    }

    fn child<'a>(node: &'a Arc<TreeNode>, index: usize) -> &'a Arc<TreeNode> {
        &node.children()[index]
    }

    #[test]
    fn flatten_shows_only_top_level_when_collapsed() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        layer.flatten(Some(&root));
        assert_eq!(paths(&layer), vec!["a", "b", "c.txt"]);
        assert!(layer.nodes().iter().all(|n| layer.depths()[&n.id] == 0));
    }

    #[test]
    fn flatten_without_root_is_empty() {
        let mut layer = ExpansionLayer::new();
        layer.flatten(None);
        assert!(layer.nodes().is_empty());
        assert!(layer.depths().is_empty());
    }

    #[test]
    fn expanding_inserts_direct_children_after_node() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        layer.flatten(Some(&root));
        layer.toggle(Some(&root), child(&root, 0), false);
        assert_eq!(paths(&layer), vec!["a", "a/a1", "a/a2.txt", "b", "c.txt"]);
        let a1 = child(child(&root, 0), 0);
        assert_eq!(layer.depths()[&a1.id], 1);
    }

    #[test]
    fn recursive_toggle_expands_whole_subtree_with_one_flatten() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        layer.flatten(Some(&root));
        let before = layer.generation();
        layer.toggle(Some(&root), child(&root, 0), true);
        assert_eq!(layer.generation(), before + 1);
        assert_eq!(
            paths(&layer),
            vec!["a", "a/a1", "a/a1/deep.txt", "a/a2.txt", "b", "c.txt"]
        );
        let deep = child(child(child(&root, 0), 0), 0);
        assert_eq!(layer.depths()[&deep.id], 2);
    }

    #[test]
    fn recursive_toggle_collapses_subtree() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        layer.toggle(Some(&root), child(&root, 0), true);
        layer.toggle(Some(&root), child(&root, 0), true);
        assert!(layer.expanded().is_empty());
        assert_eq!(paths(&layer), vec!["a", "b", "c.txt"]);
    }

    #[test]
    fn expanding_a_file_is_a_noop() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        layer.set_expanded(Some(&root), child(&root, 2), true);
        assert!(layer.expanded().is_empty());
        assert_eq!(paths(&layer), vec!["a", "b", "c.txt"]);
    }

    #[test]
    fn collapse_hides_descendants_but_keeps_inner_state() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        layer.toggle(Some(&root), child(&root, 0), true);
        layer.set_expanded(Some(&root), child(&root, 0), false);
        assert_eq!(paths(&layer), vec!["a", "b", "c.txt"]);
        assert!(layer.expanded().contains("a/a1"));
    }

    #[test]
    fn locate_finds_node_and_expands_path_on_the_way() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        let found = layer.locate_and_expand(Some(&root), "a/a1/deep.txt", false);
        assert_eq!(found.unwrap().path, "a/a1/deep.txt");
        assert!(layer.expanded().contains("a"));
        assert!(layer.expanded().contains("a/a1"));
        assert!(paths(&layer).contains(&"a/a1/deep.txt"));
    }

    #[test]
    fn locate_expands_target_directory() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        let found = layer.locate_and_expand(Some(&root), "b", true);
        assert_eq!(found.unwrap().path, "b");
        assert_eq!(paths(&layer), vec!["a", "b", "b/b1.txt", "c.txt"]);
    }

    #[test]
    fn locate_missing_path_returns_none() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        assert!(layer.locate_and_expand(Some(&root), "a/nope.txt", true).is_none());
        assert!(layer.locate_and_expand(Some(&root), "", false).is_none());
        assert!(layer.locate_and_expand(None, "a", false).is_none());
    }

    #[test]
    fn locate_does_not_match_partial_segments() {
        let mut t = TreeBuilder::new();
        let f = t.file("ab/x.txt");
        let ab = t.directory("ab", vec![f]);
        let root = t.root("r", vec![ab]);
        let mut layer = ExpansionLayer::new();
        assert!(layer.locate_and_expand(Some(&root), "a/x.txt", false).is_none());
        assert!(layer.expanded().is_empty());
    }

    #[test]
    fn locate_resolves_compressed_rows_by_full_path() {
        let mut t = TreeBuilder::new();
        let index = t.file("src/lib/index.ts");
        let lib = t.directory("src/lib", vec![index]);
        let src = t.directory("src", vec![lib]);
        let root = compress_children(&t.root("r", vec![src]));

        let mut layer = ExpansionLayer::new();
        let found = layer.locate_and_expand(Some(&root), "src/lib/index.ts", true);
        assert_eq!(found.unwrap().name, "index.ts");
        assert!(layer.expanded().contains("src/lib"));
        assert_eq!(paths(&layer), vec!["src/lib", "src/lib/index.ts"]);
    }

    #[test]
    fn find_node_visits_intermediate_directories_only() {
        let root = sample();
        let mut visited = Vec::new();
        let found = find_node(&root, "a/a1/deep.txt", &mut |n: &TreeNode| {
            visited.push(n.path.clone())
        });
        assert!(found.is_some());
        assert_eq!(visited, vec!["a", "a/a1"]);
    }

    #[test]
    fn retain_addressable_drops_unknown_paths() {
        let root = sample();
        let mut layer = ExpansionLayer::new();
        layer.insert_path("");
        layer.insert_path("a");
        layer.insert_path("gone");
        layer.insert_path("c.txt");
        layer.retain_addressable(Some(&root));
        let expanded: Vec<&String> = layer.expanded().iter().collect();
        assert_eq!(expanded, vec!["a"]);
    }
}
