//! Search-filtering and singleton-chain compression over the source tree.
//!
//! Both passes share structure with their input: a subtree that comes out
//! untouched is the same `Arc` that went in, and the result types say so
//! explicitly.

use std::sync::Arc;

use tracing::debug;

use super::node::{NodeKind, TreeNode};

/// Outcome of filtering one subtree.
#[derive(Debug, Clone)]
pub enum Filtered {
    /// Neither the node nor anything below it matched.
    Excluded,
    /// The node matched itself and is included as-is (same `Arc`).
    Kept(Arc<TreeNode>),
    /// A copy of the node restricted to the children that survived.
    Narrowed(Arc<TreeNode>),
}

impl Filtered {
    pub fn into_node(self) -> Option<Arc<TreeNode>> {
        match self {
            Filtered::Excluded => None,
            Filtered::Kept(node) | Filtered::Narrowed(node) => Some(node),
        }
    }
}

/// Outcome of compressing one subtree.
#[derive(Debug, Clone)]
pub enum Compressed {
    Unchanged,
    Changed(TreeNode),
}

impl Compressed {
    /// The node to place in the derived tree: `original` when unchanged.
    pub fn resolve(self, original: &Arc<TreeNode>) -> Arc<TreeNode> {
        match self {
            Compressed::Unchanged => Arc::clone(original),
            Compressed::Changed(node) => Arc::new(node),
        }
    }
}

/// Recursively restrict `node` to the nodes accepted by `predicate`, keeping
/// every ancestor needed to reach them.
///
/// `on_ancestor_of_match` runs once for each directory that has a matching
/// descendant, after that directory's children were processed.
pub fn search(
    node: &Arc<TreeNode>,
    predicate: &dyn Fn(&TreeNode) -> bool,
    on_ancestor_of_match: &mut dyn FnMut(&TreeNode),
) -> Filtered {
    if node.kind == NodeKind::Directory {
        if let Some(children) = &node.contents {
            let mut child_match = children.iter().any(|child| predicate(child));
            let mut contents = Vec::new();

            for child in children {
                match search(child, predicate, on_ancestor_of_match) {
                    Filtered::Excluded => {}
                    Filtered::Kept(child) => contents.push(child),
                    Filtered::Narrowed(child) => {
                        child_match = true;
                        contents.push(child);
                    }
                }
            }

            if child_match {
                on_ancestor_of_match(node);
            }

            if !contents.is_empty() {
                return Filtered::Narrowed(Arc::new(node.with_contents(contents)));
            }
        }
    }

    if predicate(node) {
        Filtered::Kept(Arc::clone(node))
    } else {
        Filtered::Excluded
    }
}

/// Fold chains of single-directory directories into one node.
///
/// Walks down while the current directory holds exactly one child that is
/// itself a directory. The node where the walk stops is renamed to the
/// `/`-joined chain (`prefix` included) and its children are compressed one
/// by one, each starting a fresh chain.
pub fn compress(node: &Arc<TreeNode>, prefix: &[&str]) -> Compressed {
    let mut chain: Vec<&str> = prefix.to_vec();
    let mut current = node;

    while let Some([only]) = current.contents.as_deref() {
        if only.kind != NodeKind::Directory {
            break;
        }
        chain.push(&current.name);
        current = only;
    }

    let mut children_changed = false;
    let contents = current.contents.as_ref().map(|children| {
        let mut compressed = Vec::with_capacity(children.len());
        for child in children {
            match compress(child, &[]) {
                Compressed::Unchanged => compressed.push(Arc::clone(child)),
                Compressed::Changed(child) => {
                    children_changed = true;
                    compressed.push(Arc::new(child));
                }
            }
        }
        compressed
    });

    if chain.is_empty() && !children_changed {
        return Compressed::Unchanged;
    }

    let mut folded = TreeNode::clone(current);
    if !chain.is_empty() {
        chain.push(&current.name);
        folded.name = chain.join("/");
    }
    if children_changed {
        folded.contents = contents;
    }
    Compressed::Changed(folded)
}

/// Compress each top-level child of `root`. The root itself is never folded.
pub fn compress_children(root: &Arc<TreeNode>) -> Arc<TreeNode> {
    let Some(children) = &root.contents else {
        return Arc::clone(root);
    };

    let mut changed = false;
    let contents: Vec<Arc<TreeNode>> = children
        .iter()
        .map(|child| {
            let outcome = compress(child, &[]);
            changed |= matches!(outcome, Compressed::Changed(_));
            outcome.resolve(child)
        })
        .collect();

    if changed {
        Arc::new(root.with_contents(contents))
    } else {
        Arc::clone(root)
    }
}

/// Derives the filtered, optionally compressed tree from the source tree.
#[derive(Debug, Default)]
pub struct FilterLayer {
    compress: bool,
    root: Option<Arc<TreeNode>>,
}

impl FilterLayer {
    pub fn new(compress: bool) -> Self {
        Self {
            compress,
            root: None,
        }
    }

    /// The derived root, or `None` when the active filter excluded everything.
    pub fn root(&self) -> Option<&Arc<TreeNode>> {
        self.root.as_ref()
    }

    /// Replace the derived tree. Without a predicate the source root is used
    /// unfiltered.
    pub fn apply_filter(
        &mut self,
        source: &Arc<TreeNode>,
        predicate: Option<&dyn Fn(&TreeNode) -> bool>,
        on_ancestor_of_match: &mut dyn FnMut(&TreeNode),
    ) {
        let filtered = match predicate {
            Some(predicate) => search(source, predicate, on_ancestor_of_match).into_node(),
            None => Some(Arc::clone(source)),
        };

        self.root = match filtered {
            Some(root) if self.compress => Some(compress_children(&root)),
            other => other,
        };

        debug!(
            filtered = predicate.is_some(),
            compress = self.compress,
            empty = self.root.is_none(),
            "derived tree rebuilt"
        );
    }
}
