//! Tree providers: materialize a [`TreeNode`] tree from a directory on disk
//! or from a JSON tree listing.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::tree::node::{base_name, NodeKind, TreeBuilder, TreeNode};

/// Options for reading a directory tree from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Include entries whose name starts with a dot.
    pub show_hidden: bool,
    /// List directories before files.
    pub dirs_first: bool,
    /// Directories this many levels below the root are left unloaded.
    pub max_depth: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            dirs_first: true,
            max_depth: None,
        }
    }
}

struct Entry {
    name: String,
    is_dir: bool,
}

/// Read `path` recursively into a fully loaded tree.
///
/// Node paths are relative to `path`, `/`-separated; the root's path is
/// empty. Symlinks are listed as files and never followed. Entries that
/// cannot be read are skipped, and a subdirectory that cannot be listed is
/// kept as an unloaded directory.
pub fn load_directory(path: &Path, options: &LoadOptions) -> Result<Arc<TreeNode>> {
    let metadata = fs::metadata(path)
        .map_err(|_| AppError::InvalidPath(format!("{} does not exist", path.display())))?;
    if !metadata.is_dir() {
        return Err(AppError::InvalidPath(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    let mut builder = TreeBuilder::new();
    let contents = load_children(&mut builder, path, "", 0, options)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    let root = builder.root(name, contents);

    info!(root = %path.display(), nodes = builder.len(), "loaded directory tree");
    Ok(root)
}

fn load_children(
    builder: &mut TreeBuilder,
    dir: &Path,
    prefix: &str,
    depth: usize,
    options: &LoadOptions,
) -> Result<Vec<Arc<TreeNode>>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if !options.show_hidden && name.starts_with('.') {
            continue;
        }
        entries.push(Entry {
            name,
            is_dir: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| compare_entries(a, b, options.dirs_first));

    let mut children = Vec::with_capacity(entries.len());
    for entry in entries {
        let child_path = join_path(prefix, &entry.name);
        let node = if !entry.is_dir {
            builder.file(&child_path)
        } else if options.max_depth.is_some_and(|max| depth + 1 >= max) {
            builder.unloaded_directory(&child_path)
        } else {
            match load_children(builder, &dir.join(&entry.name), &child_path, depth + 1, options) {
                Ok(contents) => builder.directory(&child_path, contents),
                Err(e) => {
                    debug!(path = %child_path, error = %e, "directory left unloaded");
                    builder.unloaded_directory(&child_path)
                }
            }
        };
        children.push(node);
    }
    Ok(children)
}

fn compare_entries(a: &Entry, b: &Entry, dirs_first: bool) -> Ordering {
    let mut cmp = Ordering::Equal;
    if dirs_first {
        cmp = b.is_dir.cmp(&a.is_dir);
    }
    cmp.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

// ── JSON tree listings ───────────────────────────────────────────────────────

/// Node type in a JSON listing: `tree` (directory) or `blob` (file).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawKind {
    #[serde(alias = "directory", alias = "dir")]
    Tree,
    #[serde(alias = "file")]
    Blob,
}

/// One node of a JSON tree listing.
///
/// A `tree` node without `contents` is loaded as an unloaded directory.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: RawKind,
    #[serde(default)]
    pub contents: Option<Vec<RawNode>>,
}

/// A listing is either a full root node or just its top-level children.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTree {
    Root(RawNode),
    Listing(Vec<RawNode>),
}

/// Decode a JSON tree listing.
pub fn parse_json(text: &str) -> Result<Arc<TreeNode>> {
    let raw: RawTree = serde_json::from_str(text)?;
    let mut builder = TreeBuilder::new();
    let root = match raw {
        RawTree::Root(node) => build_raw(&mut builder, node),
        RawTree::Listing(nodes) => {
            let contents = nodes
                .into_iter()
                .map(|node| build_raw(&mut builder, node))
                .collect();
            builder.root("", contents)
        }
    };
    debug!(nodes = builder.len(), "decoded tree listing");
    Ok(root)
}

/// Read and decode a JSON tree listing from a file.
pub fn load_json(path: &Path) -> Result<Arc<TreeNode>> {
    let text = fs::read_to_string(path)
        .map_err(|_| AppError::InvalidPath(format!("{} cannot be read", path.display())))?;
    parse_json(&text)
}

fn build_raw(builder: &mut TreeBuilder, raw: RawNode) -> Arc<TreeNode> {
    let name = raw
        .name
        .unwrap_or_else(|| base_name(&raw.path).to_string());
    match raw.kind {
        RawKind::Blob => builder.node(raw.path, name, NodeKind::File, None),
        RawKind::Tree => {
            let contents = raw.contents.map(|children| {
                children
                    .into_iter()
                    .map(|child| build_raw(builder, child))
                    .collect()
            });
            builder.node(raw.path, name, NodeKind::Directory, contents)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        File::create(dir.path().join("file_a.txt")).unwrap();
        File::create(dir.path().join("File_b.rs")).unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        fs::create_dir(dir.path().join("alpha").join("nested")).unwrap();
        File::create(dir.path().join("alpha").join("inner.txt")).unwrap();
        File::create(dir.path().join("alpha").join("nested").join("deep.txt")).unwrap();
        dir
    }

    fn child_names(node: &TreeNode) -> Vec<&str> {
        node.children().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn loads_dirs_first_case_insensitive() {
        let dir = setup_test_dir();
        let root = load_directory(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(child_names(&root), vec!["alpha", "beta", "file_a.txt", "File_b.rs"]);
        assert_eq!(root.path, "");
    }

    #[test]
    fn paths_are_relative_and_slash_separated() {
        let dir = setup_test_dir();
        let root = load_directory(dir.path(), &LoadOptions::default()).unwrap();
        let alpha = &root.children()[0];
        assert_eq!(alpha.path, "alpha");
        let nested = alpha.children().iter().find(|c| c.name == "nested").unwrap();
        assert_eq!(nested.path, "alpha/nested");
        assert_eq!(nested.children()[0].path, "alpha/nested/deep.txt");
    }

    #[test]
    fn hidden_entries_are_optional() {
        let dir = setup_test_dir();
        let options = LoadOptions {
            show_hidden: true,
            ..Default::default()
        };
        let root = load_directory(dir.path(), &options).unwrap();
        assert!(child_names(&root).contains(&".hidden"));
    }

    #[test]
    fn mixed_order_without_dirs_first() {
        let dir = setup_test_dir();
        let options = LoadOptions {
            dirs_first: false,
            ..Default::default()
        };
        let root = load_directory(dir.path(), &options).unwrap();
        assert_eq!(child_names(&root), vec!["alpha", "beta", "file_a.txt", "File_b.rs"]);
        let alpha = &root.children()[0];
        assert_eq!(child_names(alpha), vec!["inner.txt", "nested"]);
    }

    #[test]
    fn max_depth_leaves_deeper_directories_unloaded() {
        let dir = setup_test_dir();
        let options = LoadOptions {
            max_depth: Some(1),
            ..Default::default()
        };
        let root = load_directory(dir.path(), &options).unwrap();
        let alpha = &root.children()[0];
        assert!(alpha.is_directory());
        assert!(!alpha.is_expandable());
    }

    #[test]
    fn empty_directory_has_empty_contents() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();
        let root = load_directory(dir.path(), &LoadOptions::default()).unwrap();
        let empty = &root.children()[0];
        assert!(empty.is_expandable());
        assert!(empty.children().is_empty());
    }

    #[test]
    fn missing_root_is_invalid_path() {
        let err = load_directory(Path::new("/nonexistent/tree"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidPath(_)));
    }

    #[test]
    fn file_root_is_invalid_path() {
        let dir = setup_test_dir();
        let err = load_directory(&dir.path().join("file_a.txt"), &LoadOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn parses_json_root_node() {
        let json = r#"{
            "path": "",
            "type": "tree",
            "contents": [
                { "path": "src", "type": "tree", "contents": [
                    { "path": "src/main.rs", "type": "blob" }
                ]},
                { "path": "vendor", "type": "tree" },
                { "path": "README.md", "name": "Read me", "type": "file" }
            ]
        }"#;
        let root = parse_json(json).unwrap();
        assert_eq!(child_names(&root), vec!["src", "vendor", "Read me"]);
        assert_eq!(root.children()[0].children()[0].name, "main.rs");
        assert!(!root.children()[1].is_expandable());
        assert_eq!(root.children()[2].kind, NodeKind::File);
    }

    #[test]
    fn parses_json_listing_of_top_level_nodes() {
        let json = r#"[
            { "path": "a", "type": "dir", "contents": [] },
            { "path": "b.txt", "type": "blob" }
        ]"#;
        let root = parse_json(json).unwrap();
        assert_eq!(root.path, "");
        assert_eq!(child_names(&root), vec!["a", "b.txt"]);
    }

    #[test]
    fn bad_json_is_tree_format_error() {
        let err = parse_json(r#"{ "path": "x" }"#).unwrap_err();
        assert!(matches!(err, AppError::TreeFormat(_)));
    }

    #[test]
    fn load_json_from_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("tree.json");
        fs::write(&file, r#"[{ "path": "only.txt", "type": "blob" }]"#).unwrap();
        let root = load_json(&file).unwrap();
        assert_eq!(child_names(&root), vec!["only.txt"]);
    }
}
