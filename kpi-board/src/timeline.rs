//! Roadmap widget.
//!
//! Renders a precomputed [`TimelineLayout`] as a Gantt chart: a month header
//! whose columns follow the bucket percentages, and one bar per KPI record.

use kpi_board::board::BoardView;
use kpi_board::models::KpiRecord;
use kpi_board::roadmap::{Bar, TimelineLayout};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::theme::{colors, kpi_color, styles};

/// Unicode block characters for bar rendering
const BLOCK_FULL: char = '█';
const BLOCK_THIN: char = '▏';

const GRID_LINE: char = '┆';
const SELECTED_MARKER: char = '▶';

/// Width of the label column (marker + global KPI + sub KPI)
const NAME_COL_WIDTH: u16 = 30;
const CHIP_WIDTH: usize = 10;

/// Roadmap widget state
#[derive(Debug, Clone, Default)]
pub struct TimelineState {
    /// Selected record index
    pub selected: Option<usize>,
    /// First visible row
    pub row_offset: usize,
}

impl TimelineState {
    /// Move selection up
    pub fn select_previous(&mut self, total: usize) {
        if total == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i > 0 => i - 1,
            Some(_) => total - 1,
            None => 0,
        });
    }

    /// Move selection down
    pub fn select_next(&mut self, total: usize) {
        if total == 0 {
            self.selected = None;
            return;
        }
        self.selected = Some(match self.selected {
            Some(i) if i < total - 1 => i + 1,
            Some(_) => 0,
            None => 0,
        });
    }

    /// Keep the selection valid after the record collection changed
    pub fn clamp(&mut self, total: usize) {
        self.selected = match self.selected {
            _ if total == 0 => None,
            Some(i) => Some(i.min(total - 1)),
            None => Some(0),
        };
        self.row_offset = self.row_offset.min(total.saturating_sub(1));
    }

    /// Scroll so the selected row is inside a viewport of `rows` rows
    pub fn ensure_visible(&mut self, rows: usize) {
        let Some(selected) = self.selected else {
            return;
        };
        if rows == 0 {
            return;
        }
        if selected < self.row_offset {
            self.row_offset = selected;
        } else if selected >= self.row_offset + rows {
            self.row_offset = selected + 1 - rows;
        }
    }
}

/// Convert a percentage of the span into a column count
fn pct_to_cols(pct: f64, width: u16) -> u16 {
    let cols = (pct / 100.0 * width as f64).round();
    cols.clamp(0.0, width as f64) as u16
}

/// Starting column and length of a bar, at least one column wide
fn bar_columns(bar: &Bar, width: u16) -> (u16, u16) {
    if width == 0 {
        return (0, 0);
    }
    let start = pct_to_cols(bar.left_pct, width).min(width - 1);
    let len = pct_to_cols(bar.width_pct, width).max(1).min(width - start);
    (start, len)
}

/// Pad or truncate to exactly `width` characters
pub fn fit(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        if width > 0 {
            cut.push('…');
        }
        cut
    } else {
        format!("{:width$}", text, width = width)
    }
}

/// Roadmap widget
pub struct TimelineWidget<'a> {
    records: &'a [KpiRecord],
    board: &'a BoardView,
    state: &'a TimelineState,
}

impl<'a> TimelineWidget<'a> {
    pub fn new(records: &'a [KpiRecord], board: &'a BoardView, state: &'a TimelineState) -> Self {
        Self {
            records,
            board,
            state,
        }
    }

    /// Render month labels and the axis line
    fn render_header(&self, layout: &TimelineLayout, area: Rect, buf: &mut Buffer) {
        let mut col: u16 = 0;
        let mut consumed = 0.0;

        for bucket in &layout.month_buckets {
            let start = pct_to_cols(consumed, area.width);
            consumed += bucket.width_pct;
            let end = pct_to_cols(consumed, area.width);
            let bucket_width = end.saturating_sub(start);

            let label: String = bucket.label.chars().take(bucket_width as usize).collect();
            if start < area.width {
                buf.set_string(
                    area.x + start,
                    area.y,
                    &label,
                    Style::default()
                        .fg(colors::PURPLE)
                        .add_modifier(Modifier::BOLD),
                );
            }
            col = col.max(end);
        }

        for c in 0..col.min(area.width) {
            let pos = (area.x + c, area.y + 1);
            buf[pos].set_char('─');
            buf[pos].set_style(Style::default().fg(colors::BORDER));
        }
    }

    /// Dashed vertical lines at month boundaries
    fn render_grid(&self, layout: &TimelineLayout, area: Rect, buf: &mut Buffer) {
        let mut consumed = 0.0;
        for (i, bucket) in layout.month_buckets.iter().enumerate() {
            if i > 0 {
                let col = pct_to_cols(consumed, area.width);
                if col < area.width {
                    for row in 0..area.height {
                        let pos = (area.x + col, area.y + row);
                        buf[pos].set_char(GRID_LINE);
                        buf[pos].set_style(Style::default().fg(colors::BORDER_DIM));
                    }
                }
            }
            consumed += bucket.width_pct;
        }
    }

    /// Render the label column and the bar of one record on line `y`
    fn render_row(
        &self,
        record: &KpiRecord,
        layout: &TimelineLayout,
        (names, bars): (Rect, Rect),
        y: u16,
        is_selected: bool,
        buf: &mut Buffer,
    ) {
        let color = self
            .board
            .card_for(record.id)
            .map(|c| kpi_color(c.color_slot))
            .unwrap_or(colors::FG_DIM);

        let marker = if is_selected { SELECTED_MARKER } else { '│' };
        buf.set_string(
            names.x,
            y,
            marker.to_string(),
            Style::default().fg(if is_selected { colors::YELLOW } else { color }),
        );

        let chip: String = record.global_kpi.chars().take(CHIP_WIDTH).collect();
        buf.set_string(
            names.x + 2,
            y,
            format!("{:width$}", chip, width = CHIP_WIDTH),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        );

        let name_x = names.x + CHIP_WIDTH as u16 + 3;
        let name_width = names.width.saturating_sub(CHIP_WIDTH as u16 + 3) as usize;
        let name_style = if is_selected {
            Style::default()
                .fg(colors::BG_DARK)
                .bg(color)
                .add_modifier(Modifier::BOLD)
        } else {
            styles::text()
        };
        buf.set_string(name_x, y, fit(record.display_name(), name_width), name_style);

        let Some(bar) = layout.bar_for(record.id) else {
            buf.set_string(bars.x, y, "sin fechas", styles::text_hint());
            return;
        };

        let (start, len) = bar_columns(bar, bars.width);
        let glyph = if len == 1 && bar.duration_days <= 0 {
            BLOCK_THIN
        } else {
            BLOCK_FULL
        };
        let bar_style = if is_selected {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        for c in start..start + len {
            let pos = (bars.x + c, y);
            buf[pos].set_char(glyph);
            buf[pos].set_style(bar_style);
        }

        if is_selected {
            let hint = format!(" {} días", bar.duration_days);
            let hint_x = start + len;
            if hint_x as usize + hint.chars().count() <= bars.width as usize {
                buf.set_string(bars.x + hint_x, y, hint, styles::warning());
            }
        }
    }
}

impl Widget for TimelineWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Roadmap ")
            .title_style(
                Style::default()
                    .fg(colors::PURPLE)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_style(styles::border())
            .style(Style::default().bg(colors::BG_DARK));

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(layout) = self.board.layout.as_ref() else {
            let msg = "No hay datos disponibles";
            let x = inner.x + inner.width.saturating_sub(msg.len() as u16) / 2;
            buf.set_string(x, inner.y + inner.height / 2, msg, styles::text_dim());
            return;
        };

        if inner.width <= NAME_COL_WIDTH + 10 || inner.height < 3 {
            return; // Too small to render
        }

        let bars_x = inner.x + NAME_COL_WIDTH;
        let bars_width = inner.width - NAME_COL_WIDTH - 1;

        self.render_header(layout, Rect::new(bars_x, inner.y, bars_width, 2), buf);

        let rows_area = Rect::new(inner.x, inner.y + 2, inner.width, inner.height - 2);
        let names = Rect::new(rows_area.x, rows_area.y, NAME_COL_WIDTH - 1, rows_area.height);
        let bars = Rect::new(bars_x, rows_area.y, bars_width, rows_area.height);

        self.render_grid(layout, bars, buf);

        for (row, (index, record)) in self
            .records
            .iter()
            .enumerate()
            .skip(self.state.row_offset)
            .take(rows_area.height as usize)
            .enumerate()
        {
            let is_selected = self.state.selected == Some(index);
            let y = rows_area.y + row as u16;
            self.render_row(record, layout, (names, bars), y, is_selected, buf);
        }

        // Navigation hints in the bottom border
        if self.state.row_offset > 0 {
            buf.set_string(area.x + 1, area.y + area.height - 1, "▲ k", styles::text_hint());
        }
        if self.state.row_offset + (rows_area.height as usize) < self.records.len() {
            buf.set_string(
                area.x + area.width.saturating_sub(5),
                area.y + area.height - 1,
                "j ▼",
                styles::text_hint(),
            );
        }
    }
}
