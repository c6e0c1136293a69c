use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::expansion::ExpansionLayer;
use super::filter::FilterLayer;
use super::focus::FocusLayer;
use super::node::{has_unique_ids, NodeId, TreeBuilder, TreeNode};
use crate::search::SearchQuery;

/// Construction options for [`VisibleNodesGenerator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Fold chains of single-directory directories into one row.
    pub compress: bool,
}

/// Holds the fully loaded source tree. Never changes after construction.
#[derive(Debug)]
pub struct TreeLayer {
    root: Arc<TreeNode>,
}

impl TreeLayer {
    pub fn new(root: Arc<TreeNode>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Arc<TreeNode> {
        &self.root
    }
}

/// Read-only view of the rows a list renderer should paint.
///
/// Borrowed from the generator, so it cannot outlive the next mutating call.
#[derive(Debug, Clone, Copy)]
pub struct VisibleNodes<'a> {
    pub nodes: &'a [Arc<TreeNode>],
    pub depths: &'a HashMap<NodeId, usize>,
    pub expanded_nodes: &'a HashSet<String>,
    pub focused_node: Option<&'a Arc<TreeNode>>,
}

impl<'a> VisibleNodes<'a> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn depth_of(&self, node: &TreeNode) -> Option<usize> {
        self.depths.get(&node.id).copied()
    }

    pub fn is_expanded(&self, node: &TreeNode) -> bool {
        self.expanded_nodes.contains(&node.path)
    }

    /// Matched by path, so a filtered or compressed copy of the focused
    /// node counts as focused.
    pub fn is_focused(&self, node: &TreeNode) -> bool {
        self.focused_node.is_some_and(|focused| focused.path == node.path)
    }

    /// Row index of `node`, matched by path.
    pub fn position_of(&self, node: &TreeNode) -> Option<usize> {
        self.position_of_path(&node.path)
    }

    pub fn position_of_path(&self, path: &str) -> Option<usize> {
        self.nodes.iter().position(|row| row.path == path)
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused_node.and_then(|focused| self.position_of(focused))
    }

    /// Nearest preceding row one level up, i.e. the visible parent.
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        let depth = self.depth_of(self.nodes.get(index)?)?;
        (0..index)
            .rev()
            .find(|&i| self.depth_of(&self.nodes[i]).is_some_and(|d| d < depth))
    }

    /// Whether no later sibling follows the row at `index`.
    pub fn is_last_sibling(&self, index: usize) -> bool {
        let Some(depth) = self.nodes.get(index).and_then(|n| self.depth_of(n)) else {
            return true;
        };
        self.nodes[index + 1..]
            .iter()
            .filter_map(|row| self.depth_of(row))
            .find(|&d| d <= depth)
            .map_or(true, |d| d < depth)
    }
}

/// Coordinates the tree, filter, expansion and focus layers and serves the
/// combined [`VisibleNodes`] snapshot.
#[derive(Debug)]
pub struct VisibleNodesGenerator {
    options: GeneratorOptions,
    tree: TreeLayer,
    filter: FilterLayer,
    expansion: ExpansionLayer,
    focus: FocusLayer,
}

impl VisibleNodesGenerator {
    /// Build all layers and run an unfiltered search.
    ///
    /// A tree whose ids repeat, e.g. one assembled from subtrees of separate
    /// builders, is renumbered first. Rows then carry the new ids, so nodes
    /// should be taken from the generator rather than the caller's tree.
    pub fn new(root: Arc<TreeNode>, options: GeneratorOptions) -> Self {
        let root = if has_unique_ids(&root) {
            root
        } else {
            let mut builder = TreeBuilder::new();
            let renumbered = builder.renumber(&root);
            debug!(nodes = builder.len(), "renumbered tree with repeated node ids");
            renumbered
        };
        let mut generator = Self {
            options,
            tree: TreeLayer::new(root),
            filter: FilterLayer::new(options.compress),
            expansion: ExpansionLayer::new(),
            focus: FocusLayer::new(),
        };
        generator.search(None);
        generator
    }

    pub fn options(&self) -> GeneratorOptions {
        self.options
    }

    /// The tree supplied at construction.
    pub fn source_root(&self) -> &Arc<TreeNode> {
        self.tree.root()
    }

    /// The derived tree rows are generated from.
    pub fn root(&self) -> Option<&Arc<TreeNode>> {
        self.filter.root()
    }

    /// Number of times the rows have been rebuilt.
    pub fn generation(&self) -> u64 {
        self.expansion.generation()
    }

    /// Re-derive the tree for `predicate`.
    ///
    /// Clears expansion and focus, expands every directory holding a match,
    /// and rebuilds the rows. `None` clears the filter.
    pub fn search(&mut self, predicate: Option<&dyn Fn(&TreeNode) -> bool>) {
        let expansion = &mut self.expansion;
        expansion.clear();
        self.filter.apply_filter(
            self.tree.root(),
            predicate,
            &mut |ancestor: &TreeNode| expansion.insert_path(ancestor.path.clone()),
        );

        let root = self.filter.root();
        self.expansion.retain_addressable(root);
        self.expansion.flatten(root);
        self.focus.clear();

        debug!(
            rows = self.expansion.nodes().len(),
            expanded = self.expansion.expanded().len(),
            "search applied"
        );
    }

    pub fn search_query(&mut self, query: Option<&SearchQuery>) {
        match query {
            Some(query) => self.search(Some(&|node: &TreeNode| query.matches(node))),
            None => self.search(None),
        }
    }

    pub fn set_expanded(&mut self, node: &TreeNode, expand: bool) {
        debug!(path = %node.path, expand, "set expanded");
        self.expansion.set_expanded(self.filter.root(), node, expand);
    }

    pub fn toggle(&mut self, node: &TreeNode, recursive: bool) {
        debug!(path = %node.path, recursive, "toggle");
        self.expansion.toggle(self.filter.root(), node, recursive);
    }

    /// Locate `path` in the derived tree, expanding it and the directories
    /// leading to it. Returns `None` when the path is not in the derived tree,
    /// e.g. because the active search filtered it out.
    pub fn locate_and_expand(&mut self, path: &str, expand_ancestors: bool) -> Option<Arc<TreeNode>> {
        let found = self
            .expansion
            .locate_and_expand(self.filter.root(), path, expand_ancestors);
        debug!(path, found = found.is_some(), "locate and expand");
        found
    }

    pub fn set_focus(&mut self, node: Option<Arc<TreeNode>>) {
        self.focus.set_focus(node);
    }

    pub fn is_expanded(&self, node: &TreeNode) -> bool {
        self.expansion.is_expanded(node)
    }

    pub fn visible_nodes(&self) -> VisibleNodes<'_> {
        VisibleNodes {
            nodes: self.expansion.nodes(),
            depths: self.expansion.depths(),
            expanded_nodes: self.expansion.expanded(),
            focused_node: self.focus.focused(),
        }
    }
}
