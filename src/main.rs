mod app;
mod components;
mod event;
mod handler;
mod print;
mod theme;
mod tui;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::info;

use tree_explorer::config::{AppConfig, GeneralConfig, SearchConfig, TreeConfig};
use tree_explorer::fs::{load_directory, load_json};
use tree_explorer::{AppError, Result, TreeNode};

use crate::app::App;
use crate::event::{Event, EventHandler};
use crate::tui::{install_panic_hook, Tui};

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum LogLevel {
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Silent,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<tracing::Level> {
        match self {
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Silent => None,
        }
    }
}

/// Explore a file tree: search, compressed directory chains, expand/collapse.
#[derive(Parser, Debug)]
#[command(name = "tx", version, about)]
struct Cli {
    /// Directory to explore (defaults to config `default_path`, then `.`)
    path: Option<PathBuf>,

    /// Load the tree from a JSON listing instead of the filesystem
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show single-directory chains as separate rows
    #[arg(long)]
    no_compress: bool,

    /// Include dot-files
    #[arg(long)]
    hidden: bool,

    /// Initial search text
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,

    /// Search mode
    #[arg(long, value_parser = ["substring", "regex", "fuzzy"])]
    mode: Option<String>,

    /// Path to expand to and focus, relative to the tree root
    #[arg(long, value_name = "PATH")]
    reveal: Option<String>,

    /// Print the visible rows and exit
    #[arg(long)]
    print: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Write logs here while the explorer is running
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Disable mouse capture
    #[arg(long)]
    no_mouse: bool,
}

impl Cli {
    /// Flags that override config file values.
    fn config_overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: self.no_mouse.then_some(false),
                ..Default::default()
            },
            tree: TreeConfig {
                compress: self.no_compress.then_some(false),
                show_hidden: self.hidden.then_some(true),
                ..Default::default()
            },
            search: SearchConfig {
                mode: self.mode.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Print mode logs to stderr. The explorer owns the screen, so it only logs
/// when given a file.
fn setup_tracing(cli: &Cli) -> Result<()> {
    let Some(level) = cli.log_level.to_tracing_level() else {
        return Ok(());
    };
    if cli.print {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .without_time()
            .compact()
            .with_writer(std::io::stderr)
            .init();
    } else if let Some(path) = &cli.log_file {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .compact()
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn load_tree(cli: &Cli, config: &AppConfig) -> Result<Arc<TreeNode>> {
    if let Some(json) = &cli.json {
        return load_json(json);
    }
    let path = cli
        .path
        .clone()
        .or_else(|| config.general.default_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let path = path
        .canonicalize()
        .map_err(|_| AppError::InvalidPath(format!("{} does not exist", path.display())))?;
    load_directory(&path, &config.load_options())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(&cli)?;

    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.config_overrides()));
    let root = load_tree(&cli, &config)?;
    let mut app = App::new(root, &config, cli.reveal.clone());

    if let Some(text) = &cli.search {
        app.set_search_text(text);
    }
    app.reveal();

    if cli.print {
        print!("{}", print::render_rows(app.visible()));
        if let Some(message) = app.status_message.as_ref().filter(|m| m.is_error) {
            eprintln!("tx: {}", message.text);
        }
        return Ok(());
    }

    info!(rows = app.visible().len(), "starting explorer");
    install_panic_hook();
    let mut tui = Tui::new(config.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    let result = run(&mut tui, &mut events, &mut app).await;
    tui.restore()?;
    result
}

async fn run(tui: &mut Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        tui.draw(app)?;
        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(app, mouse),
            Event::Tick => app.clear_expired_status(),
            Event::Resize => {}
        }
    }
    Ok(())
}
