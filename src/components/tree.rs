use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::browser::node::NodeKind;
use crate::panel::controller::Row;
use crate::theme::ThemeColors;

/// Tree widget that renders panel rows with box-drawing characters.
pub struct TreeWidget<'a> {
    rows: &'a [Row],
    selected: usize,
    scroll: usize,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(rows: &'a [Row], selected: usize, scroll: usize, theme: &'a ThemeColors) -> Self {
        Self {
            rows,
            selected,
            scroll,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the indentation prefix with box-drawing characters.
    ///
    /// Continuation lines depend on whether each ancestor was the last
    /// sibling at its depth, found by walking backwards through the rows.
    fn build_prefix(row: &Row, rows: &[Row], row_index: usize) -> String {
        if row.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();
        for d in 1..row.depth {
            let mut ancestor_is_last = false;
            for j in (0..row_index).rev() {
                if rows[j].depth == d {
                    ancestor_is_last = rows[j].is_last_sibling;
                    break;
                }
                if rows[j].depth < d {
                    break;
                }
            }
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }
        parts.push(if row.is_last_sibling { "└──" } else { "├──" });
        parts.join("")
    }

    fn indicator(row: &Row) -> &'static str {
        match row.kind {
            NodeKind::LoadMore { .. } => "… ",
            NodeKind::LocalFile | NodeKind::PackageFile { .. } => "  ",
            _ if row.expanded => "▾ ",
            _ if row.has_children => "▸ ",
            _ => "· ",
        }
    }

    fn row_style(&self, row: &Row) -> Style {
        match row.kind {
            NodeKind::LocalFolder => Style::default()
                .fg(self.theme.tree_dir_fg)
                .add_modifier(Modifier::BOLD),
            NodeKind::LocalFile => Style::default().fg(self.theme.tree_file_fg),
            NodeKind::Category { .. } => Style::default()
                .fg(self.theme.tree_remote_fg)
                .add_modifier(Modifier::BOLD),
            NodeKind::PackageFolder { .. } | NodeKind::PackageSubFolder { .. } => {
                Style::default().fg(self.theme.tree_remote_fg)
            }
            NodeKind::PackageFile { .. } => Style::default().fg(self.theme.dim_fg),
            NodeKind::LoadMore { .. } => Style::default()
                .fg(self.theme.info_fg)
                .add_modifier(Modifier::ITALIC),
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if self.rows.is_empty() || visible_height == 0 {
            return;
        }

        let visible = self
            .rows
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(visible_height);

        for (i, (idx, row)) in visible.enumerate() {
            let y = inner_area.y + i as u16;
            if y >= inner_area.y + inner_area.height {
                break;
            }

            let prefix = Self::build_prefix(row, self.rows, idx);
            let indicator = Self::indicator(row);
            let style = if idx == self.selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                self.row_style(row)
            };

            let line = Line::from(Span::styled(
                format!("{prefix}{indicator}{}", row.name),
                style,
            ));
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn row(name: &str, kind: NodeKind, depth: usize, expanded: bool, is_last: bool) -> Row {
        Row {
            key: format!("/{name}"),
            name: name.to_string(),
            kind,
            depth,
            expanded,
            has_children: true,
            is_last_sibling: is_last,
        }
    }

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
    fn renders_connectors_and_names() {
        let rows = vec![
            row("root", NodeKind::LocalFolder, 0, true, true),
            row("assets", NodeKind::LocalFolder, 1, false, false),
            row("readme.txt", NodeKind::LocalFile, 1, false, true),
        ];
        let theme = theme::dark_theme();
        let widget = TreeWidget::new(&rows, 0, 0, &theme);
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("root"));
        assert!(content.contains("├──"));
        assert!(content.contains("└──"));
        assert!(content.contains("readme.txt"));
    }

    #[test]
    fn selection_gets_highlight_background() {
        let rows = vec![
            row("root", NodeKind::LocalFolder, 0, true, true),
            row("a.txt", NodeKind::LocalFile, 1, false, true),
        ];
        let theme = theme::dark_theme();
        let widget = TreeWidget::new(&rows, 1, 0, &theme);
        let area = Rect::new(0, 0, 40, 2);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let cell = buf.cell((0, 1)).unwrap();
        assert_eq!(cell.bg, theme.tree_selected_bg);
    }

    #[test]
    fn scroll_skips_leading_rows() {
        let rows: Vec<Row> = (0..10)
            .map(|i| row(&format!("f{i}"), NodeKind::LocalFile, 0, false, true))
            .collect();
        let theme = theme::dark_theme();
        let widget = TreeWidget::new(&rows, 9, 8, &theme);
        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = buffer_to_string(&buf, area);
        assert!(content.contains("f8"));
        assert!(content.contains("f9"));
        assert!(!content.contains("f0"));
    }

    #[test]
    fn empty_rows_do_not_panic() {
        let theme = theme::dark_theme();
        let widget = TreeWidget::new(&[], 0, 0, &theme);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }
}
