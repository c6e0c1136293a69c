use std::collections::HashSet;
use std::sync::Arc;

/// Stable identifier assigned to a node when the source tree is built.
///
/// Filtered and compressed copies keep the id of the node they were derived
/// from, so id-keyed maps stay valid across derived versions of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Type of tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// A node in a file tree.
///
/// `contents` is `Some` only for directories. A directory whose contents were
/// never materialized carries `None` and cannot be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: NodeId,
    /// Slash-delimited path, unique within one tree.
    pub path: String,
    /// Display label. Compression rewrites it to a multi-segment name.
    pub name: String,
    pub kind: NodeKind,
    pub contents: Option<Vec<Arc<TreeNode>>>,
}

impl TreeNode {
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Only nodes carrying a contents list may be added to the expansion set.
    pub fn is_expandable(&self) -> bool {
        self.contents.is_some()
    }

    /// Child nodes, or an empty slice for files and unloaded directories.
    pub fn children(&self) -> &[Arc<TreeNode>] {
        self.contents.as_deref().unwrap_or(&[])
    }

    /// Shallow copy of this node with a replacement contents list.
    pub fn with_contents(&self, contents: Vec<Arc<TreeNode>>) -> TreeNode {
        TreeNode {
            id: self.id,
            path: self.path.clone(),
            name: self.name.clone(),
            kind: self.kind,
            contents: Some(contents),
        }
    }

    /// Total number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children()
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Whether no id appears twice in the tree below and including `root`.
pub fn has_unique_ids(root: &TreeNode) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !seen.insert(node.id) {
            return false;
        }
        stack.extend(node.children().iter().map(|child| child.as_ref()));
    }
    true
}

/// Last `/`-separated segment of a path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Builds tree nodes, handing out sequential ids.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    next_id: u32,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ids handed out so far.
    pub fn len(&self) -> usize {
        self.next_id as usize
    }

    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }

    pub fn node(
        &mut self,
        path: impl Into<String>,
        name: impl Into<String>,
        kind: NodeKind,
        contents: Option<Vec<Arc<TreeNode>>>,
    ) -> Arc<TreeNode> {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Arc::new(TreeNode {
            id,
            path: path.into(),
            name: name.into(),
            kind,
            contents,
        })
    }

    /// The synthetic root. It has an empty path and is never a visible row.
    pub fn root(&mut self, name: impl Into<String>, contents: Vec<Arc<TreeNode>>) -> Arc<TreeNode> {
        self.node("", name, NodeKind::Directory, Some(contents))
    }

    pub fn directory(&mut self, path: &str, contents: Vec<Arc<TreeNode>>) -> Arc<TreeNode> {
        self.node(path, base_name(path), NodeKind::Directory, Some(contents))
    }

    /// A directory whose contents have not been loaded.
    pub fn unloaded_directory(&mut self, path: &str) -> Arc<TreeNode> {
        self.node(path, base_name(path), NodeKind::Directory, None)
    }

    pub fn file(&mut self, path: &str) -> Arc<TreeNode> {
        self.node(path, base_name(path), NodeKind::File, None)
    }

    /// Rebuild `node` and everything below it with ids from this builder.
    /// Children get their ids before their parent, as when built bottom-up.
    pub fn renumber(&mut self, node: &TreeNode) -> Arc<TreeNode> {
        let contents = node
            .contents
            .as_ref()
            .map(|children| children.iter().map(|child| self.renumber(child)).collect());
        self.node(node.path.clone(), node.name.clone(), node.kind, contents)
    }
}
