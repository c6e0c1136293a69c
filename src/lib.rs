//! Flattened, virtualizable rows for large file trees.
//!
//! [`tree::VisibleNodesGenerator`] turns a fully loaded tree into the ordered
//! list of rows a list renderer paints, layering search filtering,
//! singleton-directory compression, expand/collapse and focus on top of it.

pub mod config;
pub mod error;
pub mod fs;
pub mod search;
pub mod tree;

pub use error::{AppError, Result};
pub use search::{SearchMode, SearchQuery};
pub use tree::{GeneratorOptions, NodeId, NodeKind, TreeNode, VisibleNodes, VisibleNodesGenerator};
