use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::browser::ops::DropAction;
use crate::theme::ThemeColors;

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind,
            _ => return,
        };

        match kind {
            DialogKind::CreateFile { .. } => {
                render_input_dialog("New Asset File", self.dialog_state, self.theme, area, buf);
            }
            DialogKind::CreateDirectory { .. } => {
                render_input_dialog("New Folder", self.dialog_state, self.theme, area, buf);
            }
            DialogKind::Rename { .. } => {
                render_input_dialog("Rename", self.dialog_state, self.theme, area, buf);
            }
            DialogKind::DeleteConfirm { target } => {
                let name = target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| target.display().to_string());
                render_confirm_dialog(
                    " Delete Confirmation ",
                    "Delete the following?",
                    &[name],
                    self.theme,
                    area,
                    buf,
                );
            }
            DialogKind::MoveConfirm { entries, .. } => {
                let names: Vec<String> = entries
                    .iter()
                    .map(|e| {
                        let name = e
                            .path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| e.path.display().to_string());
                        match e.action {
                            DropAction::Move => format!("{name} (move)"),
                            DropAction::Copy => format!("{name} (copy)"),
                        }
                    })
                    .collect();
                render_confirm_dialog(
                    " Move Confirmation ",
                    "Move these folders?",
                    &names,
                    self.theme,
                    area,
                    buf,
                );
            }
            DialogKind::Error { message } => {
                render_error_dialog(message, self.theme, area, buf);
            }
        }
    }
}

fn render_input_dialog(
    title: &str,
    state: &DialogState,
    theme: &ThemeColors,
    area: Rect,
    buf: &mut Buffer,
) {
    let dialog_width = 50.min(area.width.saturating_sub(4));
    let dialog_height = 5;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .style(Style::default().bg(theme.dialog_bg))
        .border_style(Style::default().fg(theme.dialog_border_fg))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    // Input line with a block cursor.
    let input = &state.input;
    let cursor_pos = state.cursor_position;
    let max_width = inner.width as usize;

    let (before, cursor_char, after) = if cursor_pos < input.len() {
        let ch = &input[cursor_pos..cursor_pos + 1];
        (&input[..cursor_pos], ch, &input[cursor_pos + 1..])
    } else {
        (input.as_str(), " ", "")
    };

    // Truncate from the left when the input outgrows the dialog.
    let total_len = before.len() + 1 + after.len();
    let before_display = if total_len > max_width && before.len() > max_width.saturating_sub(2) {
        let skip = before.len().saturating_sub(max_width.saturating_sub(2));
        &before[skip..]
    } else {
        before
    };

    let input_style = Style::default().fg(theme.tree_fg);
    let cursor_style = Style::default()
        .bg(theme.tree_selected_bg)
        .fg(theme.tree_selected_fg)
        .add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled(before_display, input_style),
        Span::styled(cursor_char, cursor_style),
        Span::styled(after, input_style),
    ]);
    buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

    let hint = "[Enter] Confirm  [Esc] Cancel";
    let hint_line = Line::from(Span::styled(
        hint,
        Style::default()
            .fg(theme.dim_fg)
            .add_modifier(Modifier::DIM),
    ));
    if inner.height > 1 {
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint_line, inner.width);
    }
}

fn render_confirm_dialog(
    title: &str,
    header: &str,
    items: &[String],
    theme: &ThemeColors,
    area: Rect,
    buf: &mut Buffer,
) {
    let max_name_len = items.iter().map(|n| n.len()).max().unwrap_or(10);
    let dialog_width = (max_name_len as u16 + 10)
        .max(40)
        .min(area.width.saturating_sub(4));
    let dialog_height = (items.len() as u16 + 6).min(area.height.saturating_sub(2));
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().bg(theme.dialog_bg))
        .border_style(Style::default().fg(theme.error_fg))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let header_line = Line::from(Span::styled(
        header.to_string(),
        Style::default()
            .fg(theme.warning_fg)
            .add_modifier(Modifier::BOLD),
    ));
    buf.set_line(inner.x, inner.y, &header_line, inner.width);

    let max_items = (inner.height.saturating_sub(3)) as usize;
    for (i, name) in items.iter().take(max_items).enumerate() {
        let line = Line::from(Span::styled(
            format!("  • {}", name),
            Style::default().fg(theme.tree_fg),
        ));
        buf.set_line(inner.x, inner.y + 2 + i as u16, &line, inner.width);
    }

    let hint = "[y] Yes  [n/Esc] Cancel";
    let hint_line = Line::from(Span::styled(
        hint,
        Style::default()
            .fg(theme.dim_fg)
            .add_modifier(Modifier::DIM),
    ));
    buf.set_line(inner.x, inner.y + inner.height - 1, &hint_line, inner.width);
}

fn render_error_dialog(message: &str, theme: &ThemeColors, area: Rect, buf: &mut Buffer) {
    let dialog_width = (message.len() as u16 + 6)
        .max(30)
        .min(area.width.saturating_sub(4));
    let dialog_height = 5;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .style(Style::default().bg(theme.dialog_bg))
        .border_style(Style::default().fg(theme.error_fg))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let msg_line = Line::from(Span::styled(message, Style::default().fg(theme.error_fg)));
    buf.set_line(inner.x, inner.y + inner.height / 2, &msg_line, inner.width);

    let hint = "[Enter/Esc] Dismiss";
    let hint_line = Line::from(Span::styled(
        hint,
        Style::default()
            .fg(theme.dim_fg)
            .add_modifier(Modifier::DIM),
    ));
    if inner.height > 1 {
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint_line, inner.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ops::DropEntry;
    use crate::theme::dark_theme;
    use std::path::PathBuf;

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn input_dialog_renders_title_and_input() {
        let mode = AppMode::Dialog(DialogKind::CreateFile {
            dir: PathBuf::from("/proj/assets"),
        });
        let state = DialogState {
            input: "tree.mdl".to_string(),
            cursor_position: 8,
        };
        let theme = dark_theme();
        let widget = DialogWidget::new(&mode, &state, &theme);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("New Asset File"));
        assert!(content.contains("tree.mdl"));
    }

    #[test]
    fn dialog_colors_come_from_the_theme() {
        let mode = AppMode::Dialog(DialogKind::Rename {
            original: PathBuf::from("/proj/assets/old.mdl"),
        });
        let state = DialogState::default();
        let theme = dark_theme();
        let widget = DialogWidget::new(&mode, &state, &theme);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        // Top-left border cell of the centered 50x5 dialog.
        let cell = buf.cell((15, 9)).unwrap();
        assert_eq!(cell.fg, theme.dialog_border_fg);
        assert_eq!(cell.bg, theme.dialog_bg);
    }

    #[test]
    fn delete_confirm_lists_target() {
        let mode = AppMode::Dialog(DialogKind::DeleteConfirm {
            target: PathBuf::from("/proj/assets/old.mdl"),
        });
        let state = DialogState::default();
        let theme = dark_theme();
        let widget = DialogWidget::new(&mode, &state, &theme);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Delete"));
        assert!(content.contains("old.mdl"));
    }

    #[test]
    fn move_confirm_lists_entries_with_actions() {
        let mode = AppMode::Dialog(DialogKind::MoveConfirm {
            entries: vec![DropEntry {
                path: PathBuf::from("/proj/props"),
                action: DropAction::Move,
            }],
            dest: PathBuf::from("/proj/archive"),
        });
        let state = DialogState::default();
        let theme = dark_theme();
        let widget = DialogWidget::new(&mode, &state, &theme);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Move"));
        assert!(content.contains("props (move)"));
    }

    #[test]
    fn error_dialog_renders_message() {
        let mode = AppMode::Dialog(DialogKind::Error {
            message: "name cannot be empty".to_string(),
        });
        let state = DialogState::default();
        let theme = dark_theme();
        let widget = DialogWidget::new(&mode, &state, &theme);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("Error"));
        assert!(content.contains("name cannot be empty"));
    }

    #[test]
    fn normal_mode_renders_nothing() {
        let mode = AppMode::Normal;
        let state = DialogState::default();
        let theme = dark_theme();
        let widget = DialogWidget::new(&mode, &state, &theme);
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.trim().is_empty());
    }
}
