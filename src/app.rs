//! Application state: the panel host, dialogs, clipboard, transient status
//! messages, and the glue between panel activations and background fetches.
//!
//! All mutation happens here on the main loop. Background tasks (remote
//! fetches, the watcher) only send events; their results are applied when
//! the loop drains them, guarded by the generation tokens the panels issued.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::browser::clipboard::{ClipboardOp, ClipboardState};
use crate::browser::node::NodeKind;
use crate::browser::ops::{self, DropAction, DropEntry};
use crate::browser::remote::{PackageProvider, PackageRecord};
use crate::browser::watcher::RootWatcher;
use crate::browser::BrowserEnv;
use crate::config::CategoryConfig;
use crate::error::{AppError, Result};
use crate::event::Event;
use crate::panel::controller::{Activation, PanelController, PanelEvent, PanelKind};
use crate::panel::host::MultiPanelHost;
use crate::persist::StateStore;
use crate::theme::ThemeColors;

/// How long a transient status message stays on the bar.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Input mode of the application.
#[derive(Debug, Clone, PartialEq)]
pub enum AppMode {
    Normal,
    /// The search line is focused; keystrokes retype the active query.
    SearchInput,
    Dialog(DialogKind),
}

/// Modal dialogs. Input dialogs carry the context the confirmation needs so
/// that the selection may move while the dialog is open.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogKind {
    CreateFile { dir: PathBuf },
    CreateDirectory { dir: PathBuf },
    Rename { original: PathBuf },
    DeleteConfirm { target: PathBuf },
    MoveConfirm { entries: Vec<DropEntry>, dest: PathBuf },
    Error { message: String },
}

/// Text-input state shared by all input dialogs.
#[derive(Debug, Clone, Default)]
pub struct DialogState {
    pub input: String,
    /// Byte offset of the cursor within `input`.
    pub cursor_position: usize,
}

struct StatusMessage {
    text: String,
    is_error: bool,
    shown_at: Instant,
}

fn default_open_command() -> String {
    if cfg!(target_os = "macos") {
        "open".to_string()
    } else {
        "xdg-open".to_string()
    }
}

pub struct App {
    pub env: BrowserEnv,
    pub host: MultiPanelHost,
    pub store: StateStore,
    pub clipboard: ClipboardState,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub theme: ThemeColors,
    pub should_quit: bool,
    /// Watchers over the local roots; empty when disabled.
    pub watchers: Vec<RootWatcher>,
    /// Command files are handed to on activation.
    pub open_command: String,
    provider: Arc<dyn PackageProvider>,
    event_tx: UnboundedSender<Event>,
    root_paths: Vec<PathBuf>,
    categories_cfg: Vec<CategoryConfig>,
    page_size: usize,
    search_max_depth: usize,
    status: Option<StatusMessage>,
}

impl App {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        env: BrowserEnv,
        mut host: MultiPanelHost,
        store: StateStore,
        theme: ThemeColors,
        provider: Arc<dyn PackageProvider>,
        event_tx: UnboundedSender<Event>,
        root_paths: Vec<PathBuf>,
        categories_cfg: Vec<CategoryConfig>,
        page_size: usize,
        search_max_depth: usize,
    ) -> Self {
        for panel in &mut host.panels {
            panel.rebuild(&env);
        }
        Self {
            env,
            host,
            store,
            clipboard: ClipboardState::new(),
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            theme,
            should_quit: false,
            watchers: Vec::new(),
            open_command: default_open_command(),
            provider,
            event_tx,
            root_paths,
            categories_cfg,
            page_size,
            search_max_depth,
            status: None,
        }
    }

    /// Persist everything and flag the main loop to exit.
    pub fn quit(&mut self) {
        for panel in &mut self.host.panels {
            panel.expansion.flush(&mut self.store);
        }
        self.host.persist_layout(&mut self.store);
        if let Err(err) = self.store.flush() {
            warn!(%err, "state flush on exit failed");
        }
        self.should_quit = true;
    }

    // ── Status messages ──────────────────────────────────────────────────────

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!(%text, "status error");
        self.status = Some(StatusMessage {
            text,
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    pub fn status_message(&self) -> Option<(&str, bool)> {
        self.status
            .as_ref()
            .map(|s| (s.text.as_str(), s.is_error))
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    /// Periodic housekeeping: expire the status message and run debounced
    /// persistence.
    pub fn on_tick(&mut self) {
        if let Some(status) = &self.status {
            if status.shown_at.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
        for panel in &mut self.host.panels {
            panel.expansion.maybe_flush(&mut self.store);
        }
        if let Err(err) = self.store.flush() {
            warn!(%err, "state flush failed");
        }
    }

    // ── Watcher ──────────────────────────────────────────────────────────────

    pub fn watcher_paused(&self) -> bool {
        !self.watchers.is_empty() && self.watchers.iter().all(|w| !w.is_active())
    }

    pub fn toggle_watcher(&mut self) {
        if self.watchers.is_empty() {
            self.set_status("watcher is disabled");
            return;
        }
        if self.watcher_paused() {
            for watcher in &self.watchers {
                watcher.resume();
            }
            self.set_status("watcher resumed");
        } else {
            for watcher in &self.watchers {
                watcher.pause();
            }
            self.set_status("watcher paused");
        }
    }

    /// Apply a stale-subtree batch from the watcher: refresh the containing
    /// directories in every panel, keeping expansion and selection.
    pub fn on_subtree_stale(&mut self, paths: Vec<PathBuf>) {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for path in paths {
            let dir = if path.is_dir() {
                path
            } else {
                match path.parent() {
                    Some(parent) => parent.to_path_buf(),
                    None => continue,
                }
            };
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        if dirs.is_empty() {
            return;
        }
        for panel in &mut self.host.panels {
            panel.refresh_subtrees(&dirs, &self.env);
        }
    }

    // ── Remote responses ─────────────────────────────────────────────────────

    /// Apply a finished category page fetch. Stale generations are dropped
    /// by the panel; fresh pages fan out to grid panels.
    pub fn on_package_page(
        &mut self,
        panel_id: &str,
        tag: String,
        generation: u64,
        result: std::result::Result<Vec<PackageRecord>, String>,
    ) {
        let Some(index) = self.host.panels.iter().position(|p| p.id == panel_id) else {
            return;
        };
        match result {
            Ok(page) => {
                let landed = self.host.panels[index].apply_package_page(
                    &tag,
                    generation,
                    page,
                    self.page_size,
                    &self.env,
                );
                if landed {
                    self.host
                        .broadcast(index, &[PanelEvent::PackagesLoaded(tag)], &self.env);
                }
            }
            Err(message) => {
                self.host.panels[index].fail_package_page(&tag, generation);
                self.set_error(format!("package fetch failed: {message}"));
            }
        }
    }

    /// Apply a finished manifest fetch and rebuild so the optimistically
    /// opened package fills in.
    pub fn on_manifest(
        &mut self,
        package: String,
        result: std::result::Result<Vec<String>, String>,
    ) {
        match result {
            Ok(files) => {
                self.env.manifests.insert(package, files);
                for panel in &mut self.host.panels {
                    panel.rebuild(&self.env);
                }
            }
            Err(message) => {
                self.set_error(format!("manifest fetch failed for {package}: {message}"));
            }
        }
    }

    // ── Navigation and activation ────────────────────────────────────────────

    pub fn select_next(&mut self) {
        self.host.active_panel().select_next();
    }

    pub fn select_prev(&mut self) {
        self.host.active_panel().select_prev();
    }

    pub fn expand_selected(&mut self) {
        self.host.active_panel().expand_selected(&self.env);
    }

    pub fn collapse_selected(&mut self) {
        self.host.active_panel().collapse_selected(&self.env);
    }

    /// Activate the selected row, fan out panel events, and spawn whatever
    /// background fetch the activation asked for.
    pub fn activate_selected(&mut self) {
        let origin = self.host.active;
        let (activation, events) = self.host.panels[origin].activate_selected(&self.env);
        self.host.broadcast(origin, &events, &self.env);

        match activation {
            Activation::None => {}
            Activation::OpenFile(path) => self.open_file(&path),
            Activation::OpenPackageFile { package, path } => {
                self.open_package_file(&package, &path)
            }
            Activation::FetchManifest { package } => {
                let provider = Arc::clone(&self.provider);
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = provider
                        .manifest_files(&package)
                        .await
                        .map_err(|err| err.to_string());
                    let _ = tx.send(Event::Manifest { package, result });
                });
            }
            Activation::FetchPage {
                tag,
                offset,
                generation,
            } => {
                let provider = Arc::clone(&self.provider);
                let tx = self.event_tx.clone();
                let panel = self.host.panels[origin].id.clone();
                let page_size = self.page_size;
                tokio::spawn(async move {
                    let result = provider
                        .find(&tag, page_size, offset)
                        .await
                        .map_err(|err| err.to_string());
                    let _ = tx.send(Event::PackagePage {
                        panel,
                        tag,
                        generation,
                        result,
                    });
                });
            }
        }
    }

    /// Hand a local file to the configured opener. The child runs detached
    /// from the terminal; a thread reaps it so no zombie lingers.
    fn open_file(&mut self, path: &Path) {
        let spawned = Command::new(&self.open_command)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(mut child) => {
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
                self.set_status(format!("opening {}", path.display()));
            }
            Err(err) => self.set_error(format!("{}: {err}", self.open_command)),
        }
    }

    /// Open a package file through the provider's local cache. Files not
    /// cached yet cannot be opened.
    fn open_package_file(&mut self, package: &str, relative: &str) {
        match self.provider.resolve_local_path(package, relative) {
            Some(local) => self.open_file(&local),
            None => self.set_status(format!("{relative} is not cached locally")),
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────────

    pub fn add_panel(&mut self, kind: PanelKind) {
        let id = self.host.next_panel_id();
        let mut panel = PanelController::new(
            id,
            kind,
            self.root_paths.clone(),
            self.categories_cfg.clone(),
            &self.store,
        );
        panel.rebuild(&self.env);
        self.host.insert(panel);
    }

    pub fn close_panel(&mut self) {
        match self.host.remove_active() {
            Some(mut removed) => removed.expansion.flush(&mut self.store),
            None => self.set_status("the last panel stays open"),
        }
    }

    // ── Search ───────────────────────────────────────────────────────────────

    pub fn begin_search(&mut self) {
        self.mode = AppMode::SearchInput;
        let depth = self.search_max_depth;
        self.host.active_panel().submit_search("", &self.env, depth);
    }

    pub fn search_input_char(&mut self, c: char) {
        let mut query = self.host.active_panel_ref().search.query().to_string();
        query.push(c);
        let depth = self.search_max_depth;
        self.host
            .active_panel()
            .submit_search(&query, &self.env, depth);
    }

    pub fn search_backspace(&mut self) {
        let mut query = self.host.active_panel_ref().search.query().to_string();
        query.pop();
        let depth = self.search_max_depth;
        self.host
            .active_panel()
            .submit_search(&query, &self.env, depth);
    }

    /// Leave the search line but keep the filtered view.
    pub fn accept_search(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Leave search entirely and restore the pre-search expansion state.
    pub fn cancel_search(&mut self) {
        self.mode = AppMode::Normal;
        self.host.active_panel().clear_search(&self.env);
    }

    // ── Dialogs ──────────────────────────────────────────────────────────────

    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        if let DialogKind::Rename { original } = &kind {
            let name = original
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.dialog_state.cursor_position = name.len();
            self.dialog_state.input = name;
        }
        self.mode = AppMode::Dialog(kind);
    }

    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if pos == 0 {
            return;
        }
        let prev = self.dialog_state.input[..pos]
            .chars()
            .next_back()
            .map(|c| c.len_utf8())
            .unwrap_or(0);
        self.dialog_state.input.remove(pos - prev);
        self.dialog_state.cursor_position = pos - prev;
    }

    pub fn dialog_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if pos == 0 {
            return;
        }
        let prev = self.dialog_state.input[..pos]
            .chars()
            .next_back()
            .map(|c| c.len_utf8())
            .unwrap_or(0);
        self.dialog_state.cursor_position = pos - prev;
    }

    pub fn dialog_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if pos >= self.dialog_state.input.len() {
            return;
        }
        let next = self.dialog_state.input[pos..]
            .chars()
            .next()
            .map(|c| c.len_utf8())
            .unwrap_or(0);
        self.dialog_state.cursor_position = pos + next;
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    /// Confirm the open dialog. Validation failures reopen as an error
    /// dialog; nothing here is fatal.
    pub fn confirm_dialog(&mut self) {
        let AppMode::Dialog(kind) = std::mem::replace(&mut self.mode, AppMode::Normal) else {
            return;
        };
        let input = std::mem::take(&mut self.dialog_state).input;

        let result = match kind {
            DialogKind::CreateFile { dir } => self.create_in(&dir, &input, false),
            DialogKind::CreateDirectory { dir } => self.create_in(&dir, &input, true),
            DialogKind::Rename { original } => self.rename(&original, &input),
            DialogKind::DeleteConfirm { target } => self.delete(&target),
            DialogKind::MoveConfirm { entries, dest } => {
                self.run_drop(&entries, &dest);
                Ok(())
            }
            DialogKind::Error { .. } => Ok(()),
        };
        if let Err(err) = result {
            self.open_dialog(DialogKind::Error {
                message: err.to_string(),
            });
        }
    }

    // ── Context actions ──────────────────────────────────────────────────────

    /// Directory the next create or paste lands in: the selected folder
    /// itself, or the parent of a selected file.
    pub fn target_dir(&self) -> Option<PathBuf> {
        let panel = self.host.active_panel_ref();
        let row = panel.selected_row()?;
        match row.kind {
            NodeKind::LocalFolder => Some(PathBuf::from(&row.key)),
            NodeKind::LocalFile => Path::new(&row.key).parent().map(|p| p.to_path_buf()),
            _ => panel.local_roots().first().cloned(),
        }
    }

    /// The selected row's local path, when it has one.
    pub fn selected_local_path(&self) -> Option<PathBuf> {
        let row = self.host.active_panel_ref().selected_row()?;
        match row.kind {
            NodeKind::LocalFolder | NodeKind::LocalFile => Some(PathBuf::from(&row.key)),
            _ => None,
        }
    }

    pub fn prompt_create_file(&mut self) {
        match self.target_dir() {
            Some(dir) => self.open_dialog(DialogKind::CreateFile { dir }),
            None => self.set_error("no local folder selected"),
        }
    }

    pub fn prompt_create_dir(&mut self) {
        match self.target_dir() {
            Some(dir) => self.open_dialog(DialogKind::CreateDirectory { dir }),
            None => self.set_error("no local folder selected"),
        }
    }

    pub fn prompt_rename(&mut self) {
        match self.selected_local_path() {
            Some(original) => self.open_dialog(DialogKind::Rename { original }),
            None => self.set_error("only local assets can be renamed"),
        }
    }

    pub fn prompt_delete(&mut self) {
        match self.selected_local_path() {
            Some(target) => self.open_dialog(DialogKind::DeleteConfirm { target }),
            None => self.set_error("only local assets can be deleted"),
        }
    }

    fn create_in(&mut self, dir: &Path, name: &str, is_dir: bool) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidName("name cannot be empty".to_string()));
        }
        if trimmed.contains('/') || trimmed.contains('\\') {
            return Err(AppError::InvalidName(
                "name cannot contain path separators".to_string(),
            ));
        }
        let path = dir.join(trimmed);
        if is_dir {
            ops::create_dir(&path)?;
        } else {
            ops::create_file(&path)?;
        }
        self.refresh_dirs(&[dir.to_path_buf()]);
        self.set_status(format!("created {trimmed}"));
        Ok(())
    }

    fn rename(&mut self, original: &Path, new_name: &str) -> Result<()> {
        let target = ops::validate_new_name(original, new_name)?;
        ops::rename_path(original, &target)?;
        if let Some(parent) = original.parent() {
            self.refresh_dirs(&[parent.to_path_buf()]);
        }
        self.set_status(format!("renamed to {}", new_name.trim()));
        Ok(())
    }

    fn delete(&mut self, target: &Path) -> Result<()> {
        ops::delete(target)?;
        if let Some(parent) = target.parent() {
            self.refresh_dirs(&[parent.to_path_buf()]);
        }
        self.set_status(format!("deleted {}", target.display()));
        Ok(())
    }

    // ── Clipboard ────────────────────────────────────────────────────────────

    pub fn clipboard_copy(&mut self) {
        match self.selected_local_path() {
            Some(path) => {
                self.clipboard.set(vec![path], ClipboardOp::Copy);
                self.set_status("1 item copied");
            }
            None => self.set_error("only local assets can be copied"),
        }
    }

    pub fn clipboard_cut(&mut self) {
        match self.selected_local_path() {
            Some(path) => {
                self.clipboard.set(vec![path], ClipboardOp::Cut);
                self.set_status("1 item cut");
            }
            None => self.set_error("only local assets can be cut"),
        }
    }

    pub fn clipboard_summary(&self) -> Option<String> {
        let op = self.clipboard.operation?;
        let verb = match op {
            ClipboardOp::Copy => "copied",
            ClipboardOp::Cut => "cut",
        };
        Some(format!("{} item(s) {verb}", self.clipboard.len()))
    }

    /// Paste the clipboard into the target directory. Folder moves are gated
    /// behind a confirmation dialog; everything else runs immediately.
    pub fn paste(&mut self) {
        if self.clipboard.is_empty() {
            self.set_status("clipboard is empty");
            return;
        }
        let Some(dest) = self.target_dir() else {
            self.set_error("no local destination");
            return;
        };
        let entries = self.clipboard.as_drop_entries();
        self.drop_entries(entries, dest);
    }

    pub fn drop_entries(&mut self, entries: Vec<DropEntry>, dest: PathBuf) {
        let plan = ops::classify_drop(entries);
        if !plan.immediate.is_empty() {
            self.run_drop(&plan.immediate, &dest);
        }
        if !plan.needs_confirm.is_empty() {
            self.open_dialog(DialogKind::MoveConfirm {
                entries: plan.needs_confirm,
                dest,
            });
        }
    }

    /// Execute drop entries with the watcher muted; the explicit refresh
    /// afterwards covers the sources and the destination.
    fn run_drop(&mut self, entries: &[DropEntry], dest: &Path) {
        for watcher in &self.watchers {
            watcher.pause();
        }
        let (done, errors) = ops::apply_drop(entries, dest);
        for watcher in &self.watchers {
            watcher.resume();
        }

        let mut dirs: Vec<PathBuf> = vec![dest.to_path_buf()];
        for entry in entries {
            if let Some(parent) = entry.path.parent() {
                let parent = parent.to_path_buf();
                if !dirs.contains(&parent) {
                    dirs.push(parent);
                }
            }
        }
        self.refresh_dirs(&dirs);

        if entries.iter().any(|e| e.action == DropAction::Move) {
            self.clipboard.clear();
        }
        if errors.is_empty() {
            self.set_status(format!("{done} item(s) transferred"));
        } else {
            self.set_error(errors.join("; "));
        }
    }

    fn refresh_dirs(&mut self, dirs: &[PathBuf]) {
        for panel in &mut self.host.panels {
            panel.refresh_subtrees(dirs, &self.env);
        }
    }
}
