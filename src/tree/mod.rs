//! Visible-row generation for large file trees.
//!
//! Layers, lowest first:
//!
//! | layer     | changes when        | recomputes                          |
//! |-----------|---------------------|-------------------------------------|
//! | tree      | construction only   | nothing                             |
//! | filter    | `search`            | derived (filtered, compressed) tree |
//! | expansion | expand/collapse     | rows and depths                     |
//! | focus     | focus moves         | nothing                             |
//!
//! A change to a lower layer resets the layers above it; a change to a
//! higher layer leaves the lower ones alone.

pub mod expansion;
pub mod filter;
pub mod focus;
pub mod generator;
pub mod node;

pub use generator::{GeneratorOptions, VisibleNodes, VisibleNodesGenerator};
pub use node::{NodeId, NodeKind, TreeBuilder, TreeNode};
