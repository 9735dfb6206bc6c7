mod app;
mod browser;
mod components;
mod config;
mod error;
mod event;
mod handler;
mod panel;
mod persist;
mod theme;
mod tui;
mod ui;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::warn;

use crate::app::App;
use crate::browser::remote::HttpPackageProvider;
use crate::browser::watcher::RootWatcher;
use crate::browser::BrowserEnv;
use crate::config::{AppConfig, RemoteConfig, WatcherConfig};
use crate::event::{Event, EventHandler};
use crate::panel::controller::{PanelController, PanelKind};
use crate::panel::host::MultiPanelHost;
use crate::persist::StateStore;
use crate::tui::{install_panic_hook, Tui};

/// A terminal asset browser: local project tree, remote packages,
/// multi-panel.
#[derive(Parser, Debug)]
#[command(name = "hangar", version, about)]
struct Cli {
    /// Project root to browse (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the remote package service
    #[arg(long)]
    remote_url: Option<String>,

    /// Disable the filesystem watcher (auto-refresh)
    #[arg(long)]
    no_watcher: bool,
}

impl Cli {
    /// CLI flags as a partial config layered over the file configs.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            remote: RemoteConfig {
                url: self.remote_url.clone(),
                ..Default::default()
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Per-project state file path, keyed by a hash of the project root so two
/// projects never share expansion sets.
fn state_path(project_root: &Path) -> Option<PathBuf> {
    let base = dirs::state_dir().or_else(dirs::data_local_dir)?;
    let mut hasher = DefaultHasher::new();
    project_root.hash(&mut hasher);
    let name = project_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    Some(
        base.join("hangar")
            .join(format!("{name}-{:016x}", hasher.finish()))
            .join("state.json"),
    )
}

fn init_tracing() {
    let Some(base) = dirs::state_dir().or_else(dirs::data_local_dir) else {
        return;
    };
    let log_dir = base.join("hangar");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::options()
        .create(true)
        .append(true)
        .open(log_dir.join("hangar.log"))
    else {
        return;
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hangar=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(file)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();

    let project_root = cli.path.canonicalize().map_err(|_| {
        error::AppError::InvalidPath(format!("{} does not exist", cli.path.display()))
    })?;

    init_tracing();
    let cfg = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    let theme = theme::resolve_theme(&cfg.theme);

    let mut roots = vec![project_root.clone()];
    for extra in cfg.extra_roots() {
        match extra.canonicalize() {
            Ok(path) => roots.push(path),
            Err(err) => warn!(path = %extra.display(), %err, "extra root skipped"),
        }
    }

    let store = match state_path(&project_root) {
        Some(path) => StateStore::load(&path),
        None => StateStore::in_memory(),
    };

    let env = BrowserEnv {
        rules: cfg.rules(),
        manifests: Default::default(),
        scan_depth: cfg.search_max_depth(),
    };

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("hangar")
        .join("packages");
    let provider = Arc::new(HttpPackageProvider::new(cfg.remote_url(), cache_dir));

    let categories = cfg.categories();
    let host = {
        let roots = roots.clone();
        let categories = categories.clone();
        MultiPanelHost::restore(
            &store,
            &[PanelKind::Tree, PanelKind::CloudTree],
            |id, kind| {
                PanelController::new(id, kind, roots.clone(), categories.clone(), &store)
            },
        )
    };

    install_panic_hook();
    let mut tui = Tui::new(cfg.mouse_enabled())?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let event_tx = events.sender();

    let mut app = App::new(
        env,
        host,
        store,
        theme,
        provider,
        event_tx.clone(),
        roots.clone(),
        categories,
        cfg.page_size(),
        cfg.search_max_depth(),
    );
    if let Some(cmd) = cfg.open_command() {
        app.open_command = cmd.to_string();
    }

    if cfg.watcher_enabled() {
        let ignore_patterns: Vec<String> = browser::watcher::DEFAULT_IGNORE_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        for root in &roots {
            match RootWatcher::new(
                root,
                Duration::from_millis(cfg.debounce_ms()),
                ignore_patterns.clone(),
                browser::watcher::DEFAULT_FLOOD_THRESHOLD,
                event_tx.clone(),
            ) {
                Ok(watcher) => app.watchers.push(watcher),
                Err(err) => {
                    warn!(root = %root.display(), %err, "watcher unavailable");
                    app.set_status(format!("watcher unavailable for {}", root.display()));
                }
            }
        }
    }

    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(&mut app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(&mut app, key),
            Event::Mouse(mouse) => handler::handle_mouse_event(&mut app, mouse),
            Event::Tick => app.on_tick(),
            Event::Resize(_, _) => {}
            Event::SubtreeStale(paths) => app.on_subtree_stale(paths),
            Event::PackagePage {
                panel,
                tag,
                generation,
                result,
            } => app.on_package_page(&panel, tag, generation, result),
            Event::Manifest { package, result } => app.on_manifest(package, result),
        }

        if app.should_quit {
            break;
        }
    }

    tui.restore()?;
    Ok(())
}
