//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--no-compress`, `--mode`, etc.)
//! 2. `$TREE_EXPLORER_CONFIG` environment variable (path to config file)
//! 3. Project-local `.tree-explorer.toml` in the current working directory
//! 4. Global `~/.config/tree-explorer/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::fs::LoadOptions;
use crate::search::SearchMode;
use crate::tree::GeneratorOptions;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Starting directory (overridden by CLI positional arg).
    pub default_path: Option<String>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
}

/// Tree loading and display settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    /// Fold chains of single-directory directories into one row.
    pub compress: Option<bool>,
    /// Directories always listed first.
    pub dirs_first: Option<bool>,
    /// Include dot-files when loading a directory.
    pub show_hidden: Option<bool>,
    /// Use nerd font icons (false = ASCII fallback).
    pub use_icons: Option<bool>,
    /// Directories deeper than this are left unloaded.
    pub max_depth: Option<usize>,
}

/// Search bar settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// Match mode: "substring", "regex", "fuzzy".
    pub mode: Option<String>,
    /// Match case exactly.
    pub case_sensitive: Option<bool>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_fg: Option<String>,
    pub tree_focused_bg: Option<String>,
    pub tree_focused_fg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub tree_guide_fg: Option<String>,
    pub match_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub tree: TreeConfig,
    pub search: SearchConfig,
    pub theme: ThemeConfig,
}

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; `load` handles it separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("TREE_EXPLORER_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".tree-explorer.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("tree-explorer").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: other
                    .general
                    .default_path
                    .clone()
                    .or(self.general.default_path),
                mouse: other.general.mouse.or(self.general.mouse),
            },
            tree: TreeConfig {
                compress: other.tree.compress.or(self.tree.compress),
                dirs_first: other.tree.dirs_first.or(self.tree.dirs_first),
                show_hidden: other.tree.show_hidden.or(self.tree.show_hidden),
                use_icons: other.tree.use_icons.or(self.tree.use_icons),
                max_depth: other.tree.max_depth.or(self.tree.max_depth),
            },
            search: SearchConfig {
                mode: other.search.mode.clone().or(self.search.mode),
                case_sensitive: other.search.case_sensitive.or(self.search.case_sensitive),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Whether mouse support is enabled.
    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    /// Whether singleton directory chains are folded.
    pub fn compress(&self) -> bool {
        self.tree.compress.unwrap_or(true)
    }

    /// Whether directories are listed before files.
    pub fn dirs_first(&self) -> bool {
        self.tree.dirs_first.unwrap_or(true)
    }

    /// Whether dot-files are loaded.
    pub fn show_hidden(&self) -> bool {
        self.tree.show_hidden.unwrap_or(false)
    }

    /// Whether to use nerd font icons.
    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(false)
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.tree.max_depth
    }

    pub fn search_mode(&self) -> SearchMode {
        SearchMode::from_str(self.search.mode.as_deref().unwrap_or("substring"))
    }

    pub fn case_sensitive(&self) -> bool {
        self.search.case_sensitive.unwrap_or(false)
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            show_hidden: self.show_hidden(),
            dirs_first: self.dirs_first(),
            max_depth: self.max_depth(),
        }
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            compress: self.compress(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
