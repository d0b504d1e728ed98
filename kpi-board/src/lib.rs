//! KPI Board core library.
//!
//! Pure classification, formatting and roadmap geometry over KPI records,
//! plus the typed client that fetches those records from the sheet exporter.

pub mod api;
pub mod board;
pub mod calendar;
pub mod config;
pub mod format;
pub mod level;
pub mod models;
pub mod roadmap;

pub use board::BoardView;
pub use format::{FormattedValue, ValueFormatter};
pub use level::{classify, Achievement};
pub use models::{CellValue, DashboardData, KpiRecord, TargetType};
pub use roadmap::{compute_layout, TimelineLayout};
