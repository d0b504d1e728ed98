//! UI rendering module.
//!
//! This module handles all the TUI rendering using ratatui,
//! implementing the Kanagawa Dragon aesthetic for the roadmap and KPI cards.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use kpi_board::board::CardView;
use kpi_board::calendar::format_display_date;
use kpi_board::level::Achievement;
use kpi_board::models::KpiRecord;

use crate::app::{App, LogLevel, Tab};
use crate::theme::{colors, kpi_color, level_color, styles};
use crate::timeline::{fit, TimelineWidget};

/// Rows taken by one card, borders included
const CARD_HEIGHT: u16 = 9;

/// Minimum width before the cards grid switches to two columns
const TWO_COLUMN_WIDTH: u16 = 100;

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Fill background with theme color
    let bg_block = Block::default().style(Style::default().bg(colors::BG_DARK));
    frame.render_widget(bg_block, area);

    // Create main layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar / tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(5), // Log area
        ])
        .split(area);

    render_tabs(frame, app, chunks[0]);

    let content = if app.error_banner.is_some() {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(6)])
            .split(chunks[1]);
        render_error_banner(frame, app, split[0]);
        split[1]
    } else {
        chunks[1]
    };

    render_main_content(frame, app, content);
    render_logs(frame, app, chunks[2]);

    // Overlays
    if app.show_detail {
        render_detail_popup(frame, app, area);
    }

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

/// Render the tab bar with the sync status on the right
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .map(|tab| {
            let style = if *tab == app.active_tab {
                styles::tab_active()
            } else {
                styles::tab_inactive()
            };
            Line::from(Span::styled(format!(" {} ", tab.name()), style))
        })
        .collect();

    let status_color = if app.is_loading {
        colors::STATUS_PENDING
    } else {
        colors::STATUS_SYNCED
    };
    let status = Line::from(vec![
        Span::styled("● ", Style::default().fg(status_color)),
        Span::styled(format!("{} ", app.status_text()), styles::text_dim()),
    ])
    .right_aligned();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .title(" KPI Board ")
                .title_style(styles::title())
                .title_top(status)
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .select(match app.active_tab {
            Tab::Roadmap => 0,
            Tab::Cards => 1,
        })
        .style(styles::text())
        .highlight_style(styles::tab_active())
        .divider(Span::styled(" | ", styles::border_dim()));

    frame.render_widget(tabs, area);
}

/// Render the main content area based on active tab
fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if !app.has_loaded {
        let message = if app.is_loading {
            "Cargando datos..."
        } else {
            "No hay datos disponibles"
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border())
            .style(Style::default().bg(colors::BG_DARK));
        frame.render_widget(block, area);
        render_empty_state(frame, area, message);
        return;
    }

    match app.active_tab {
        Tab::Roadmap => render_roadmap_view(frame, app, area),
        Tab::Cards => render_cards_view(frame, app, area),
    }
}

fn render_roadmap_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    // Borders plus the two header lines
    let rows = chunks[0].height.saturating_sub(4) as usize;
    let mut state = app.timeline_state.clone();
    state.ensure_visible(rows);

    let widget = TimelineWidget::new(app.records(), &app.board, &state);
    frame.render_widget(widget, chunks[0]);

    render_record_summary(frame, app, chunks[1]);
}

/// Side panel describing the selected record
fn render_record_summary(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Detalle ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border())
        .style(Style::default().bg(colors::BG_DARK));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(record) = app.selected_record() else {
        render_empty_state(frame, area, "No hay datos disponibles");
        return;
    };

    let paragraph = Paragraph::new(detail_lines(app, record))
        .style(styles::text())
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// First card index of the page that contains `selected`
fn page_start(selected: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    (selected / per_page) * per_page
}

/// Render the cards grid, paged so the selected card is always visible
fn render_cards_view(frame: &mut Frame, app: &App, area: Rect) {
    let mut block = Block::default()
        .title(" Proyectos y KPIs ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border())
        .style(Style::default().bg(colors::BG_DARK));
    if let Some(url) = &app.sheet_url {
        block = block.title_bottom(
            Line::from(Span::styled(format!(" Hoja: {} ", url), styles::text_hint())).right_aligned(),
        );
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let records = app.records();
    if records.is_empty() {
        render_empty_state(frame, area, "No hay datos disponibles");
        return;
    }

    let columns: u16 = if inner.width >= TWO_COLUMN_WIDTH { 2 } else { 1 };
    let rows = (inner.height / CARD_HEIGHT).max(1);
    let per_page = (rows * columns) as usize;
    let selected = app.timeline_state.selected.unwrap_or(0);
    let start = page_start(selected, per_page);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints((0..rows).map(|_| Constraint::Length(CARD_HEIGHT)))
        .split(inner);

    for (offset, (record, card)) in records
        .iter()
        .zip(app.board.cards.iter())
        .enumerate()
        .skip(start)
        .take(per_page)
        .map(|(i, pair)| (i - start, pair))
    {
        let row = offset / columns as usize;
        let col = offset % columns as usize;
        let col_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..columns).map(|_| Constraint::Ratio(1, columns as u32)))
            .split(row_areas[row]);

        let is_selected = start + offset == selected;
        render_card(frame, record, card, col_areas[col], is_selected);
    }

    let total_pages = records.len().div_ceil(per_page);
    if total_pages > 1 {
        let indicator = format!(" {}/{} ", start / per_page + 1, total_pages);
        let x = area.x + 2;
        let y = area.y + area.height - 1;
        frame.render_widget(
            Paragraph::new(indicator).style(styles::text_hint()),
            Rect::new(x, y, 10.min(area.width.saturating_sub(2)), 1),
        );
    }
}

/// Render a single KPI card
fn render_card(frame: &mut Frame, record: &KpiRecord, card: &CardView, area: Rect, is_selected: bool) {
    let accent = kpi_color(card.color_slot);
    let bg = if is_selected {
        colors::BG_HIGHLIGHT
    } else {
        colors::BG_MEDIUM
    };

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", record.global_kpi),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(if is_selected {
            Style::default().fg(accent)
        } else {
            styles::border_dim()
        })
        .style(Style::default().bg(bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let mut lines = vec![
        Line::from(Span::styled(
            fit(record.display_name(), width),
            styles::title(),
        )),
        Line::from(vec![
            Span::styled("Responsable ", styles::label()),
            Span::styled(or_dash(&record.stakeholder).to_string(), styles::text_dim()),
            Span::styled("  Área ", styles::label()),
            Span::styled(or_dash(&record.area).to_string(), styles::text_dim()),
        ]),
    ];

    if !record.is_binary() {
        lines.push(Line::from(vec![
            Span::styled("Línea base ", styles::label()),
            Span::styled(card.baseline.to_string(), styles::text()),
            Span::styled("  Meta ", styles::label()),
            Span::styled(card.target.to_string(), styles::text()),
        ]));
    }

    let achievement_color = level_color(card.achievement.level()).unwrap_or(colors::FG_DIM);
    lines.push(Line::from(vec![
        Span::styled("Logro ", styles::label()),
        Span::styled(
            card.achieved.to_string(),
            Style::default()
                .fg(achievement_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", card.achievement.label()), Style::default().fg(achievement_color)),
    ]));

    lines.push(Line::from(""));
    lines.push(ladder_line(record, card));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Binary ladder: "N1 Pendiente" and "N3 Liberado", only the current one lit
fn binary_ladder(achievement: Achievement) -> [(u8, &'static str, bool); 2] {
    let level = achievement.level();
    [(1, "Pendiente", level == 1), (3, "Liberado", level == 3)]
}

fn ladder_cell(index: u8, text: String, reached: bool) -> Span<'static> {
    let style = match level_color(index) {
        Some(color) if reached => Style::default()
            .fg(colors::BG_DARK)
            .bg(color)
            .add_modifier(Modifier::BOLD),
        _ => Style::default().fg(colors::FG_DIM).bg(colors::LEVEL_INACTIVE),
    };
    Span::styled(format!(" N{} {} ", index, text), style)
}

fn ladder_line(record: &KpiRecord, card: &CardView) -> Line<'static> {
    let cells: Vec<Span<'static>> = if record.is_binary() {
        binary_ladder(card.achievement)
            .into_iter()
            .map(|(index, text, reached)| ladder_cell(index, text.to_string(), reached))
            .collect()
    } else {
        card.ladder
            .iter()
            .map(|step| ladder_cell(step.index, step.threshold.to_string(), step.reached))
            .collect()
    };

    if cells.is_empty() {
        return Line::from(Span::styled("Sin niveles definidos", styles::text_hint()));
    }

    let mut spans = Vec::with_capacity(cells.len() * 2);
    for cell in cells {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(cell);
    }
    Line::from(spans)
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "-"
    } else {
        text
    }
}

/// Lines shared by the side panel and the detail popup
fn detail_lines<'a>(app: &'a App, record: &'a KpiRecord) -> Vec<Line<'a>> {
    let card = app.board.card_for(record.id);
    let accent = card
        .map(|c| kpi_color(c.color_slot))
        .unwrap_or(colors::FG_DIM);

    let description = if record.formula.trim().is_empty() {
        Span::styled("Sin descripción disponible.", styles::text_hint())
    } else {
        Span::styled(record.formula.as_str(), styles::text())
    };

    let mut lines = vec![
        Line::from(Span::styled(
            record.global_kpi.as_str(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(record.display_name(), styles::title())),
        Line::from(""),
        Line::from(Span::styled("Descripción", styles::label())),
        Line::from(description),
        Line::from(""),
        Line::from(vec![
            Span::styled("Fechas ", styles::label()),
            Span::styled(
                format!(
                    "{} — {}",
                    format_display_date(&record.start_date),
                    format_display_date(&record.end_date)
                ),
                styles::text(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Responsable ", styles::label()),
            Span::styled(or_dash(&record.stakeholder), styles::text()),
        ]),
        Line::from(vec![
            Span::styled("Área ", styles::label()),
            Span::styled(or_dash(&record.area), styles::text()),
        ]),
    ];

    if let Some(card) = card {
        let color = level_color(card.achievement.level()).unwrap_or(colors::FG_DIM);
        lines.push(Line::from(vec![
            Span::styled("Nivel ", styles::label()),
            Span::styled(card.achievement.label(), Style::default().fg(color)),
        ]));
    }

    if let Some(bar) = app.board.layout.as_ref().and_then(|l| l.bar_for(record.id)) {
        lines.push(Line::from(vec![
            Span::styled("Duración ", styles::label()),
            Span::styled(format!("{} días", bar.duration_days), styles::text()),
        ]));
    }

    if !record.comments.trim().is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Comentarios", styles::label())));
        lines.push(Line::from(Span::styled(record.comments.as_str(), styles::text_dim())));
    }

    lines
}

/// 70% of the screen, kept between 40 and 90 columns
fn detail_popup_width(screen_width: u16) -> u16 {
    (u32::from(screen_width) * 70 / 100).clamp(40, 90) as u16
}

/// Render the detail popup for the selected record
fn render_detail_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(record) = app.selected_record() else {
        return;
    };

    let popup_width = detail_popup_width(area.width);
    let popup_height = 20;
    let popup_area = centered_rect(popup_width, popup_height, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Detalle del KPI ")
        .title_style(styles::title_accent())
        .borders(Borders::ALL)
        .border_style(styles::border_focused())
        .style(Style::default().bg(colors::BG_MEDIUM));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let paragraph = Paragraph::new(detail_lines(app, record))
        .style(styles::text())
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);

    let hint = Paragraph::new("ESC para cerrar")
        .style(styles::text_hint())
        .alignment(Alignment::Center);
    let hint_area = Rect::new(
        popup_area.x,
        popup_area.y + popup_area.height.saturating_sub(1),
        popup_area.width,
        1,
    );
    frame.render_widget(hint, hint_area);
}

/// Render the connection error banner
fn render_error_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(banner) = app.error_banner.as_ref() else {
        return;
    };

    let block = Block::default()
        .title(format!(" {} ", banner.title))
        .title_style(
            Style::default()
                .fg(Color::White)
                .bg(colors::RED)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::RED))
        .style(Style::default().bg(Color::Rgb(0x2A, 0x18, 0x18)));

    let text = Paragraph::new(Line::from(vec![
        Span::styled(banner.message.as_str(), styles::text()),
        Span::styled("  (r reintentar, ESC ocultar)", styles::text_hint()),
    ]))
    .block(block)
    .wrap(Wrap { trim: true });

    frame.render_widget(text, area);
}

/// Render the "Registro" log area
fn render_logs(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .logs
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let (prefix, style) = match entry.level {
                LogLevel::Info => ("i", styles::info()),
                LogLevel::Success => ("+", styles::success()),
                LogLevel::Warning => ("!", styles::warning()),
                LogLevel::Error => ("x", styles::error()),
            };
            let age = entry.timestamp.elapsed().as_secs();

            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", prefix), style),
                Span::styled(&entry.message, styles::text_dim()),
                Span::styled(format!("  hace {}s", age), styles::text_hint()),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(" Registro ")
            .title_style(Style::default().fg(colors::FG_DIM))
            .borders(Borders::ALL)
            .border_style(styles::border_dim())
            .style(Style::default().bg(colors::BG_DARK)),
    );

    frame.render_widget(list, area);
}

/// Render a centered message inside a bordered area
fn render_empty_state(frame: &mut Frame, area: Rect, message: &str) {
    let paragraph = Paragraph::new(message)
        .style(styles::text_dim())
        .alignment(Alignment::Center);

    let inner = Block::default().borders(Borders::ALL).inner(area);
    let y = inner.y + inner.height / 2;
    let centered = Rect::new(inner.x, y, inner.width, 1);

    frame.render_widget(paragraph, centered);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(52, 16, area);

    frame.render_widget(Clear, popup_area);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:14}", k), Style::default().fg(colors::BLUE)),
            Span::raw(what),
        ])
    };
    let section = |name: &'static str| {
        Line::from(Span::styled(
            name,
            Style::default()
                .fg(colors::PURPLE)
                .add_modifier(Modifier::BOLD),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            "Atajos de teclado",
            Style::default()
                .fg(colors::BLUE)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Navegación"),
        key("Tab", "Cambiar vista"),
        key("j/k ↑/↓", "Seleccionar KPI"),
        key("g/G", "Primero / último"),
        key("Enter", "Ver detalle"),
        key("Esc", "Cerrar / ocultar error"),
        Line::from(""),
        section("General"),
        key("r", "Sincronizar datos"),
        key("?", "Esta ayuda"),
        key("q/Ctrl+C", "Salir"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(" Ayuda ")
                .title_style(styles::title())
                .borders(Borders::ALL)
                .border_style(styles::border())
                .style(Style::default().bg(colors::BG_MEDIUM)),
        )
        .style(styles::text());

    frame.render_widget(paragraph, popup_area);
}

/// Helper to create a centered rectangle
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
