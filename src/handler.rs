//! Key and mouse dispatch, routed by the current input mode.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, AppMode, DialogKind};
use crate::panel::controller::PanelKind;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    match &app.mode {
        AppMode::Normal => handle_normal_key(app, key),
        AppMode::SearchInput => handle_search_key(app, key),
        AppMode::Dialog(_) => handle_dialog_key(app, key),
    }
}

/// Handle a mouse event. The wheel moves the selection in the focused panel.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.mode != AppMode::Normal {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollDown => app.select_next(),
        MouseEventKind::ScrollUp => app.select_prev(),
        _ => {}
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Char('l') | KeyCode::Right => app.expand_selected(),
        KeyCode::Enter => app.activate_selected(),

        KeyCode::Char('/') => app.begin_search(),
        // Clears a filter kept after Enter in the search line.
        KeyCode::Esc => app.cancel_search(),

        KeyCode::Tab => app.host.focus_next(),
        KeyCode::BackTab => app.host.focus_prev(),
        KeyCode::Char('n') => app.add_panel(PanelKind::Tree),
        KeyCode::Char('g') => app.add_panel(PanelKind::Grid),
        KeyCode::Char('C') => app.add_panel(PanelKind::CloudTree),
        KeyCode::Char('w') => app.close_panel(),
        KeyCode::Char('t') => app.host.toggle_mode(),
        KeyCode::Char('<') => app.host.swap_left(),
        KeyCode::Char('>') => app.host.swap_right(),

        KeyCode::Char('a') => app.prompt_create_file(),
        KeyCode::Char('A') => app.prompt_create_dir(),
        KeyCode::Char('r') => app.prompt_rename(),
        KeyCode::Char('d') => app.prompt_delete(),

        KeyCode::Char('y') => app.clipboard_copy(),
        KeyCode::Char('x') => app.clipboard_cut(),
        KeyCode::Char('p') => app.paste(),

        KeyCode::Char('W') => app.toggle_watcher(),
        _ => {}
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.accept_search(),
        KeyCode::Backspace => app.search_backspace(),
        // The selection stays usable while typing.
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_prev(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_input_char(c)
        }
        _ => {}
    }
}

fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    let confirm_only = matches!(
        app.mode,
        AppMode::Dialog(DialogKind::DeleteConfirm { .. })
            | AppMode::Dialog(DialogKind::MoveConfirm { .. })
            | AppMode::Dialog(DialogKind::Error { .. })
    );
    if confirm_only {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_dialog(),
            KeyCode::Char('n') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        }
        return;
    }
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Enter => app.confirm_dialog(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_cursor_left(),
        KeyCode::Right => app.dialog_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.dialog_input_char(c)
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::node::ExclusionRules;
    use crate::browser::remote::{ManifestCache, PackageProvider, PackageRecord};
    use crate::browser::BrowserEnv;
    use crate::error::Result;
    use crate::panel::controller::PanelController;
    use crate::panel::host::{DisplayMode, MultiPanelHost};
    use crate::persist::StateStore;
    use async_trait::async_trait;
    use std::fs::File;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct StubProvider;

    #[async_trait]
    impl PackageProvider for StubProvider {
        async fn find(
            &self,
            _query: &str,
            _page_size: usize,
            _offset: usize,
        ) -> Result<Vec<PackageRecord>> {
            Ok(Vec::new())
        }

        async fn manifest_files(&self, _package_id: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn resolve_local_path(&self, _package_id: &str, _relative: &str) -> Option<PathBuf> {
            None
        }
    }

    fn make_app(dir: &TempDir) -> App {
        let env = BrowserEnv {
            rules: ExclusionRules::default(),
            manifests: ManifestCache::default(),
            scan_depth: 15,
        };
        let store = StateStore::in_memory();
        let root = dir.path().to_path_buf();
        let panel = PanelController::new(
            "panel0",
            PanelKind::Tree,
            vec![root.clone()],
            Vec::new(),
            &store,
        );
        let host = MultiPanelHost::new(vec![panel], DisplayMode::SideBySide);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        App::new(
            env,
            host,
            store,
            crate::theme::dark_theme(),
            Arc::new(StubProvider),
            tx,
            vec![root],
            Vec::new(),
            20,
            15,
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::from(code));
    }

    #[test]
    fn q_quits() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn navigation_moves_the_selection() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("a.txt")).unwrap();
        File::create(dir.path().join("b.txt")).unwrap();
        let mut app = make_app(&dir);

        assert_eq!(app.host.active_panel_ref().selected, 0);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.host.active_panel_ref().selected, 2);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.host.active_panel_ref().selected, 1);
    }

    #[test]
    fn slash_enters_search_and_typing_filters() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("needle.txt")).unwrap();
        File::create(dir.path().join("other.txt")).unwrap();
        let mut app = make_app(&dir);

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode, AppMode::SearchInput);
        for c in "needle".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        let names: Vec<&str> = app
            .host
            .active_panel_ref()
            .rows
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert!(names.contains(&"needle.txt"));
        assert!(!names.contains(&"other.txt"));

        // Enter keeps the filter; Esc back in normal mode clears it.
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.host.active_panel_ref().search.is_active());
        press(&mut app, KeyCode::Esc);
        assert!(!app.host.active_panel_ref().search.is_active());
    }

    #[test]
    fn dialog_keys_edit_the_input() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);

        press(&mut app, KeyCode::Char('a'));
        assert!(matches!(
            app.mode,
            AppMode::Dialog(DialogKind::CreateFile { .. })
        ));
        for c in "hi.mdl".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.dialog_state.input, "hi.md");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.dialog_state.input.is_empty());
    }

    #[test]
    fn confirm_dialog_accepts_y_and_rejects_n() {
        let dir = TempDir::new().unwrap();
        let doomed = dir.path().join("doomed.txt");
        File::create(&doomed).unwrap();
        let mut app = make_app(&dir);
        app.host
            .active_panel()
            .select_key(&crate::browser::node::key_for_path(&doomed));

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert!(doomed.exists());

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(!doomed.exists());
    }

    #[test]
    fn tab_cycles_panel_focus() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.host.active, 1);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.host.active, 0);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.host.active, 1);
    }

    #[test]
    fn angle_brackets_reorder_panels() {
        let dir = TempDir::new().unwrap();
        let mut app = make_app(&dir);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.host.active, 1);

        press(&mut app, KeyCode::Char('<'));
        let ids: Vec<&str> = app.host.panels.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["panel1", "panel0"]);
        assert_eq!(app.host.active, 0);

        // Already leftmost, nothing moves.
        press(&mut app, KeyCode::Char('<'));
        assert_eq!(app.host.active, 0);

        press(&mut app, KeyCode::Char('>'));
        let ids: Vec<&str> = app.host.panels.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["panel0", "panel1"]);
        assert_eq!(app.host.active, 1);
    }
}
