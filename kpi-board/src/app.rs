//! Application state and event handling.
//!
//! This module implements the Elm Architecture pattern for state management,
//! with a centralized App struct holding all application state. The dashboard
//! snapshot and its precomputed [`BoardView`] are always replaced together.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use kpi_board::api::{ApiCommand, ApiMessage};
use kpi_board::models::{DashboardData, KpiRecord};
use kpi_board::{BoardView, ValueFormatter};

use crate::timeline::TimelineState;

/// Active tab in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    /// Gantt view of every record (default)
    #[default]
    Roadmap,
    /// One card per record with its level ladder
    Cards,
}

impl Tab {
    /// Move to the next tab
    pub fn next(&self) -> Self {
        match self {
            Tab::Roadmap => Tab::Cards,
            Tab::Cards => Tab::Roadmap,
        }
    }

    /// Get the display name of the tab
    pub fn name(&self) -> &'static str {
        match self {
            Tab::Roadmap => "Roadmap",
            Tab::Cards => "Proyectos y KPIs",
        }
    }

    pub fn all() -> [Tab; 2] {
        [Tab::Roadmap, Tab::Cards]
    }
}

/// Connection error shown above the active view
#[derive(Debug, Clone)]
pub struct ErrorBanner {
    pub title: String,
    pub message: String,
}

impl ErrorBanner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: "Error de Conexión".to_string(),
            message: message.into(),
        }
    }
}

/// Log entry for the "Registro" panel
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: Instant,
    pub message: String,
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogEntry {
    fn with_level(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Instant::now(),
            message: message.into(),
            level,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(LogLevel::Error, message)
    }
}

/// Main application state
#[derive(Debug)]
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// Currently active tab
    pub active_tab: Tab,

    /// Last successfully loaded snapshot
    pub data: DashboardData,

    /// Classification, formatting and layout of `data`
    pub board: BoardView,

    formatter: ValueFormatter,

    /// Record selection, shared by both views
    pub timeline_state: TimelineState,

    /// Current connection error (if any)
    pub error_banner: Option<ErrorBanner>,

    /// Log messages
    pub logs: Vec<LogEntry>,
    /// Maximum number of log entries to keep
    max_logs: usize,

    /// Whether a fetch is in flight
    pub is_loading: bool,

    /// Whether any snapshot has been received yet
    pub has_loaded: bool,

    /// Show the detail popup for the selected record
    pub show_detail: bool,

    /// Show help overlay
    pub show_help: bool,

    /// Link to the backing spreadsheet
    pub sheet_url: Option<String>,
}

impl App {
    /// Create a new application instance
    pub fn new(formatter: ValueFormatter, sheet_url: Option<String>) -> Self {
        let mut app = Self {
            should_quit: false,
            active_tab: Tab::default(),
            data: DashboardData::default(),
            board: BoardView::default(),
            formatter,
            timeline_state: TimelineState::default(),
            error_banner: None,
            logs: Vec::new(),
            max_logs: 100,
            is_loading: true,
            has_loaded: false,
            show_detail: false,
            show_help: false,
            sheet_url,
        };

        app.log(LogEntry::info("KPI Board iniciado"));
        app.log(LogEntry::info("Cargando datos..."));
        app
    }

    /// Add a log entry
    pub fn log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
        if self.logs.len() > self.max_logs {
            self.logs.remove(0);
        }
    }

    pub fn records(&self) -> &[KpiRecord] {
        &self.data.kpis
    }

    pub fn selected_record(&self) -> Option<&KpiRecord> {
        self.timeline_state
            .selected
            .and_then(|i| self.data.kpis.get(i))
    }

    /// Handle API messages
    pub fn handle_api_message(&mut self, message: ApiMessage) {
        match message {
            ApiMessage::DashboardLoaded(data) => {
                let count = data.kpis.len();
                self.board = BoardView::build(&data, &self.formatter);
                self.data = data;
                self.is_loading = false;
                self.has_loaded = true;
                self.error_banner = None;
                self.timeline_state.clamp(count);
                if count == 0 {
                    self.show_detail = false;
                }

                info!(count, "Dashboard snapshot applied");
                self.log(LogEntry::success(format!("{} KPIs cargados", count)));

                let placed = self.board.layout.as_ref().map_or(0, |l| l.bars.len());
                if placed < count {
                    self.log(LogEntry::warning(format!(
                        "{} KPIs sin fechas válidas fuera del roadmap",
                        count - placed
                    )));
                }
            }
            ApiMessage::FetchFailed(error) => {
                self.is_loading = false;
                warn!(%error, "Keeping previous dashboard snapshot");
                self.log(LogEntry::error(format!("Error de Conexión: {}", error)));
                self.error_banner = Some(ErrorBanner::new(error));
            }
        }
    }

    /// Handle key events and return optional API command
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ApiCommand> {
        // Handle help overlay
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter) {
                self.show_help = false;
            }
            return None;
        }

        if self.show_detail {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.show_detail = false;
            }
            return None;
        }

        let total = self.data.kpis.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                Some(ApiCommand::Shutdown)
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                Some(ApiCommand::Shutdown)
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                None
            }
            KeyCode::Char('r') => {
                if self.is_loading {
                    return None;
                }
                self.is_loading = true;
                self.log(LogEntry::info("Sincronizando..."));
                Some(ApiCommand::Refresh)
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.active_tab = self.active_tab.next();
                None
            }
            KeyCode::Esc => {
                self.error_banner = None;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.timeline_state.select_next(total);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.timeline_state.select_previous(total);
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                if total > 0 {
                    self.timeline_state.selected = Some(0);
                }
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                if total > 0 {
                    self.timeline_state.selected = Some(total - 1);
                }
                None
            }
            KeyCode::Enter => {
                self.show_detail = self.selected_record().is_some();
                None
            }
            _ => None,
        }
    }

    /// Get the status bar text
    pub fn status_text(&self) -> String {
        if self.is_loading {
            return "Sincronizando...".to_string();
        }
        match self.data.generated_day() {
            Some(day) if self.has_loaded => format!("Actualizado: {}", day.display()),
            _ => "Sin sincronizar".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpi_board::models::{CellValue, Metadata};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot(names: &[&str]) -> DashboardData {
        DashboardData {
            metadata: Metadata {
                generated_at: "2025-03-07T09:30:00.000Z".to_string(),
                count: names.len(),
                version: "3.0.0".to_string(),
            },
            kpis: names
                .iter()
                .enumerate()
                .map(|(i, name)| KpiRecord {
                    id: i as i64 + 1,
                    sub_kpi: name.to_string(),
                    global_kpi: "Operación".to_string(),
                    start_date: "2025-01-01".to_string(),
                    end_date: "2025-01-31".to_string(),
                    achieved_value: CellValue::Number(5.0),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn app() -> App {
        App::new(ValueFormatter::default(), None)
    }

    #[test]
    fn test_initial_state_is_loading() {
        let app = app();
        assert!(app.is_loading);
        assert!(!app.has_loaded);
        assert_eq!(app.status_text(), "Sincronizando...");
    }

    #[test]
    fn test_loaded_snapshot_rebuilds_board() {
        let mut app = app();
        app.handle_api_message(ApiMessage::DashboardLoaded(snapshot(&["Uptime", "Latencia"])));

        assert_eq!(app.records().len(), 2);
        assert_eq!(app.board.cards.len(), 2);
        assert!(app.board.layout.is_some());
        assert_eq!(app.timeline_state.selected, Some(0));
        assert_eq!(app.status_text(), "Actualizado: 07/03/2025");
    }

    #[test]
    fn test_failed_refresh_keeps_previous_records() {
        let mut app = app();
        app.handle_api_message(ApiMessage::DashboardLoaded(snapshot(&["Uptime"])));

        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), Some(ApiCommand::Refresh));
        app.handle_api_message(ApiMessage::FetchFailed("timeout".to_string()));

        assert_eq!(app.records()[0].sub_kpi, "Uptime");
        assert_eq!(app.board.cards.len(), 1);
        assert!(!app.is_loading);
        let banner = app.error_banner.as_ref().unwrap();
        assert_eq!(banner.title, "Error de Conexión");
        assert_eq!(banner.message, "timeout");
        assert_eq!(app.logs.last().unwrap().level, LogLevel::Error);
    }

    #[test]
    fn test_undated_records_are_reported() {
        let mut app = app();
        let mut data = snapshot(&["Uptime", "Latencia"]);
        data.kpis[1].end_date = "pronto".to_string();
        app.handle_api_message(ApiMessage::DashboardLoaded(data));

        let last = app.logs.last().unwrap();
        assert_eq!(last.level, LogLevel::Warning);
        assert!(last.message.starts_with("1 KPIs"));
    }

    #[test]
    fn test_success_clears_error_banner() {
        let mut app = app();
        app.handle_api_message(ApiMessage::FetchFailed("timeout".to_string()));
        app.handle_api_message(ApiMessage::DashboardLoaded(snapshot(&["Uptime"])));
        assert!(app.error_banner.is_none());
    }

    #[test]
    fn test_refresh_is_not_sent_twice() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), None);
        app.handle_api_message(ApiMessage::DashboardLoaded(snapshot(&[])));
        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), Some(ApiCommand::Refresh));
    }

    #[test]
    fn test_detail_popup_needs_a_selection() {
        let mut app = app();
        app.handle_api_message(ApiMessage::DashboardLoaded(snapshot(&[])));
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.show_detail);

        app.handle_api_message(ApiMessage::DashboardLoaded(snapshot(&["Uptime", "Latencia"])));
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Enter));
        assert!(app.show_detail);
        assert_eq!(app.selected_record().unwrap().sub_kpi, "Latencia");

        // Navigation is swallowed while the popup is open
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.timeline_state.selected, Some(1));
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.show_detail);
    }

    #[test]
    fn test_tab_and_quit() {
        let mut app = app();
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.active_tab, Tab::Cards);
        assert_eq!(app.active_tab.name(), "Proyectos y KPIs");
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.active_tab, Tab::Roadmap);

        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), Some(ApiCommand::Shutdown));
        assert!(app.should_quit);
    }
}
