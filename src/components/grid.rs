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

/// Fixed cell width of one grid tile, including padding.
const CELL_WIDTH: u16 = 20;

/// Grid widget: renders a panel's leaf rows as name tiles in columns.
///
/// The root row (depth 0) is the folder or package set being shown; it is
/// drawn as a header line, everything below it fills the grid.
pub struct GridWidget<'a> {
    rows: &'a [Row],
    selected: usize,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> GridWidget<'a> {
    pub fn new(rows: &'a [Row], selected: usize, theme: &'a ThemeColors) -> Self {
        Self {
            rows,
            selected,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn tile_style(&self, row: &Row) -> Style {
        match row.kind {
            NodeKind::LocalFolder | NodeKind::Category { .. } => Style::default()
                .fg(self.theme.tree_dir_fg)
                .add_modifier(Modifier::BOLD),
            NodeKind::PackageFolder { .. } | NodeKind::PackageSubFolder { .. } => {
                Style::default().fg(self.theme.tree_remote_fg)
            }
            NodeKind::PackageFile { .. } => Style::default().fg(self.theme.dim_fg),
            NodeKind::LoadMore { .. } => Style::default()
                .fg(self.theme.info_fg)
                .add_modifier(Modifier::ITALIC),
            _ => Style::default().fg(self.theme.tree_file_fg),
        }
    }
}

impl<'a> Widget for GridWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };
        if inner.width == 0 || inner.height == 0 || self.rows.is_empty() {
            return;
        }

        // Header: the root being browsed.
        let header = Line::from(Span::styled(
            self.rows[0].name.clone(),
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(inner.x, inner.y, &header, inner.width);

        let columns = (inner.width / CELL_WIDTH).max(1) as usize;
        let grid_top = inner.y + 1;
        let grid_height = inner.height.saturating_sub(1) as usize;

        for (i, (idx, row)) in self.rows.iter().enumerate().skip(1).enumerate() {
            let col = i % columns;
            let line_index = i / columns;
            if line_index >= grid_height {
                break;
            }
            let x = inner.x + (col as u16) * CELL_WIDTH;
            let y = grid_top + line_index as u16;

            let style = if idx == self.selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                self.tile_style(row)
            };

            let mut name = row.name.clone();
            let budget = (CELL_WIDTH as usize).saturating_sub(2);
            if name.chars().count() > budget {
                name = name.chars().take(budget.saturating_sub(1)).collect();
                name.push('…');
            }
            let line = Line::from(Span::styled(name, style));
            let cell_width = CELL_WIDTH.min(inner.x + inner.width - x);
            buf.set_line(x, y, &line, cell_width);
        }
    }
}
