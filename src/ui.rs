//! Frame layout: tab strip, panel areas, search line, status bar, and the
//! dialog overlay on top.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::dialog::DialogWidget;
use crate::components::grid::GridWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::panel::controller::{PanelController, PanelKind};
use crate::panel::host::DisplayMode;
use crate::theme::ThemeColors;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let show_tabs = app.host.mode == DisplayMode::Tabbed;
    let show_search =
        app.mode == AppMode::SearchInput || app.host.active_panel_ref().search.is_active();

    let mut constraints: Vec<Constraint> = Vec::new();
    if show_tabs {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(3));
    if show_search {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Length(1));
    let chunks = Layout::vertical(constraints).split(area);

    let mut next = 0;
    let tab_area = show_tabs.then(|| {
        let a = chunks[next];
        next += 1;
        a
    });
    let main = chunks[next];
    next += 1;
    let search_area = show_search.then(|| {
        let a = chunks[next];
        next += 1;
        a
    });
    let status_area = chunks[next];

    // Keep every panel's selection inside its viewport before borrowing the
    // host immutably for painting.
    let panel_height = main.height.saturating_sub(2) as usize;
    for panel in &mut app.host.panels {
        panel.update_scroll(panel_height);
    }

    if let Some(tab_area) = tab_area {
        render_tab_strip(app, frame, tab_area);
    }

    match app.host.mode {
        DisplayMode::SideBySide => {
            let count = app.host.panels.len() as u32;
            let constraints: Vec<Constraint> =
                (0..count).map(|_| Constraint::Ratio(1, count)).collect();
            let areas = Layout::horizontal(constraints).split(main);
            for (i, panel) in app.host.panels.iter().enumerate() {
                render_panel(frame, areas[i], panel, i == app.host.active, &app.theme);
            }
        }
        DisplayMode::Tabbed => {
            let panel = app.host.active_panel_ref();
            render_panel(frame, main, panel, true, &app.theme);
        }
    }

    if let Some(search_area) = search_area {
        render_search_line(app, frame, search_area);
    }
    render_status_bar(app, frame, status_area);

    if matches!(app.mode, AppMode::Dialog(_)) {
        frame.render_widget(
            DialogWidget::new(&app.mode, &app.dialog_state, &app.theme),
            area,
        );
    }
}

fn panel_title(kind: PanelKind) -> &'static str {
    match kind {
        PanelKind::Tree => "Assets",
        PanelKind::Grid => "Grid",
        PanelKind::CloudTree => "Cloud",
    }
}

fn render_panel(
    frame: &mut Frame,
    area: Rect,
    panel: &PanelController,
    focused: bool,
    theme: &ThemeColors,
) {
    let border_style = if focused {
        Style::default().fg(theme.border_focused_fg)
    } else {
        Style::default().fg(theme.border_fg)
    };
    let block = Block::default()
        .title(format!(" {} ", panel_title(panel.kind)))
        .borders(Borders::ALL)
        .border_style(border_style);

    match panel.kind {
        PanelKind::Grid => {
            let widget = GridWidget::new(&panel.rows, panel.selected, theme).block(block);
            frame.render_widget(widget, area);
        }
        PanelKind::Tree | PanelKind::CloudTree => {
            let widget =
                TreeWidget::new(&panel.rows, panel.selected, panel.scroll, theme).block(block);
            frame.render_widget(widget, area);
        }
    }
}

fn render_tab_strip(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (i, panel) in app.host.panels.iter().enumerate() {
        let style = if i == app.host.active {
            Style::default()
                .fg(app.theme.border_focused_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.dim_fg)
        };
        spans.push(Span::styled(
            format!(" {}:{} ", i + 1, panel_title(panel.kind)),
            style,
        ));
    }
    frame.render_widget(Line::from(spans), area);
}

fn render_search_line(app: &App, frame: &mut Frame, area: Rect) {
    let search = &app.host.active_panel_ref().search;
    let prompt_style = if app.mode == AppMode::SearchInput {
        Style::default()
            .fg(app.theme.info_fg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.dim_fg)
    };
    let line = Line::from(vec![
        Span::styled("/", prompt_style),
        Span::styled(
            search.query().to_string(),
            Style::default().fg(app.theme.tree_fg),
        ),
        Span::styled(
            format!("  ({} matches)", search.match_count()),
            Style::default().fg(app.theme.dim_fg),
        ),
    ]);
    frame.render_widget(line, area);
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let selection = app
        .host
        .active_panel_ref()
        .selected_row()
        .map(|r| r.key.clone())
        .unwrap_or_default();
    let status = app.status_message().map(|(t, e)| (t.to_string(), e));
    let search_info = {
        let search = &app.host.active_panel_ref().search;
        search
            .is_active()
            .then(|| format!("{} matches", search.match_count()))
    };
    let clipboard_info = app.clipboard_summary();

    let mut widget =
        StatusBarWidget::new(&selection, &app.theme).watcher_paused(app.watcher_paused());
    if let Some((message, is_error)) = &status {
        widget = widget.status_message(message, *is_error);
    }
    if let Some(info) = &search_info {
        widget = widget.search_info(info);
    }
    if let Some(info) = &clipboard_info {
        widget = widget.clipboard_info(info);
    }
    frame.render_widget(widget, area);
}
