use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Status bar: selected key on the left, transient messages, clipboard and
/// watcher indicators, key hints on the right.
pub struct StatusBarWidget<'a> {
    selection: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    search_info: Option<&'a str>,
    clipboard_info: Option<&'a str>,
    watcher_paused: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(selection: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            selection,
            theme,
            status_message: None,
            is_error: false,
            search_info: None,
            clipboard_info: None,
            watcher_paused: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn search_info(mut self, info: &'a str) -> Self {
        self.search_info = Some(info);
        self
    }

    pub fn clipboard_info(mut self, info: &'a str) -> Self {
        self.clipboard_info = Some(info);
        self
    }

    pub fn watcher_paused(mut self, paused: bool) -> Self {
        self.watcher_paused = paused;
        self
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let width = area.width as usize;

        // A transient message takes the whole bar.
        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default()
                    .bg(self.theme.status_bg)
                    .fg(self.theme.info_fg)
            };
            let display: String = if msg.len() >= width {
                msg[..width].to_string()
            } else {
                format!("{msg:<width$}")
            };
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let key_hints = " /:find  a:new  r:ren  d:del  p:paste ";
        let hints_len = key_hints.len();
        let remaining = width.saturating_sub(hints_len);

        let selection_display = if self.selection.len() > remaining {
            let budget = remaining;
            if budget > 3 {
                format!(
                    "...{}",
                    &self.selection[self.selection.len() - (budget - 3)..]
                )
            } else {
                self.selection[..budget].to_string()
            }
        } else {
            self.selection.to_string()
        };

        let mut spans = vec![Span::styled(
            selection_display,
            Style::default().fg(self.theme.status_fg),
        )];

        if let Some(info) = self.search_info {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                info.to_string(),
                Style::default().fg(self.theme.info_fg),
            ));
        }
        if let Some(info) = self.clipboard_info {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                info.to_string(),
                Style::default()
                    .fg(self.theme.tree_remote_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if self.watcher_paused {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                "[watcher paused]",
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.len()).sum();
        let pad = width.saturating_sub(used).saturating_sub(hints_len);
        if pad > 0 {
            spans.push(Span::raw(" ".repeat(pad)));
        }
        spans.push(Span::styled(
            key_hints,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));

        // Span styles are patched over the bar background.
        let line = Line::from(spans).style(Style::default().bg(self.theme.status_bg));
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
