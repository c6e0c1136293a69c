use std::sync::Arc;

use super::node::TreeNode;

/// The single focused node, if any.
///
/// Focus is not validated against the derived tree; a search clears it.
#[derive(Debug, Default)]
pub struct FocusLayer {
    focused: Option<Arc<TreeNode>>,
}

impl FocusLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&Arc<TreeNode>> {
        self.focused.as_ref()
    }

    pub fn set_focus(&mut self, node: Option<Arc<TreeNode>>) {
        self.focused = node;
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }
}
