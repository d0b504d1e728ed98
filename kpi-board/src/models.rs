//! Domain models for the KPI dashboard feed.
//!
//! These structs match the JSON produced by the spreadsheet endpoint and use
//! serde for deserialization. Spreadsheet cells are loosely typed, so numeric
//! columns are modelled as [`CellValue`] and parsed on demand.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::calendar::CalendarDay;

/// Sentinel text marking a binary KPI as released
pub const RELEASED_SENTINEL: &str = "Liberado";

/// Version reported by the empty dashboard shown before the first fetch
pub const INITIAL_VERSION: &str = "3.0.0";

// ============================================
// Cells
// ============================================

/// A raw spreadsheet cell: a number, some text, or nothing at all
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Parse the cell the way a lenient float parser would.
    ///
    /// Text cells yield the longest numeric prefix (`"12 issues"` is 12),
    /// empty cells never parse.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_nan() => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_leading_float(s),
            CellValue::Empty => None,
        }
    }

    /// True for `Empty` and for blank text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", display_number(*n)),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => CellValue::Empty,
            Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            Value::String(s) => CellValue::Text(s),
            other => CellValue::Text(other.to_string()),
        })
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Empty => serializer.serialize_none(),
        }
    }
}

/// Format a float without a trailing `.0` and without a negative zero
pub fn display_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{}", n)
}

/// Parse the longest leading float literal of `s`.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

// ============================================
// KPI records
// ============================================

/// Classification mode of a KPI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetType {
    /// Continuous threshold ladder
    #[default]
    Gradual,
    /// Two-state pending/released
    Binary,
}

impl TargetType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            TargetType::Gradual => "Gradual",
            TargetType::Binary => "Binario",
        }
    }
}

impl From<&str> for TargetType {
    fn from(value: &str) -> Self {
        match value.trim() {
            "Binario" | "Binary" => TargetType::Binary,
            _ => TargetType::Gradual,
        }
    }
}

impl<'de> Deserialize<'de> for TargetType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(TargetType::from).unwrap_or_default())
    }
}

impl Serialize for TargetType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_wire())
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// Threshold ladder `n1..n5`; any subset may be blank
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    #[serde(default)]
    pub n1: CellValue,
    #[serde(default)]
    pub n2: CellValue,
    #[serde(default)]
    pub n3: CellValue,
    #[serde(default)]
    pub n4: CellValue,
    #[serde(default)]
    pub n5: CellValue,
}

impl Levels {
    /// `(index, cell)` pairs in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &CellValue)> {
        [&self.n1, &self.n2, &self.n3, &self.n4, &self.n5]
            .into_iter()
            .enumerate()
            .map(|(i, cell)| (i as u8 + 1, cell))
    }
}

/// One KPI row from the dashboard sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub id: i64,
    #[serde(default)]
    pub sub_kpi: String,
    #[serde(default, rename = "kpi_global")]
    pub global_kpi: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default, rename = "inicio")]
    pub start_date: String,
    #[serde(default, rename = "entrega")]
    pub end_date: String,
    #[serde(default)]
    pub baseline: CellValue,
    #[serde(default)]
    pub target: CellValue,
    #[serde(default, rename = "logro_val")]
    pub achieved_value: CellValue,
    #[serde(default, rename = "logro_display")]
    pub achieved_display: CellValue,
    #[serde(default, rename = "tipo_target")]
    pub target_type: TargetType,
    #[serde(default, rename = "comentarios")]
    pub comments: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub stakeholder: String,
    #[serde(default, rename = "niveles")]
    pub levels: Levels,
}

impl KpiRecord {
    pub fn display_name(&self) -> &str {
        if self.sub_kpi.trim().is_empty() {
            "Sin nombre"
        } else {
            &self.sub_kpi
        }
    }

    pub fn start_day(&self) -> Option<CalendarDay> {
        CalendarDay::parse(&self.start_date)
    }

    pub fn end_day(&self) -> Option<CalendarDay> {
        CalendarDay::parse(&self.end_date)
    }

    pub fn is_binary(&self) -> bool {
        self.target_type == TargetType::Binary
    }
}

// ============================================
// Dashboard payload
// ============================================

/// Feed metadata written by the sheet exporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub version: String,
}

/// Whole dashboard payload; always replaced as a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub metadata: Metadata,
    #[serde(default)]
    pub kpis: Vec<KpiRecord>,
}

impl Default for DashboardData {
    fn default() -> Self {
        Self {
            metadata: Metadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                count: 0,
                version: INITIAL_VERSION.to_string(),
            },
            kpis: Vec::new(),
        }
    }
}

impl DashboardData {
    /// Day the feed was generated, if the timestamp is readable
    pub fn generated_day(&self) -> Option<CalendarDay> {
        CalendarDay::parse(&self.metadata.generated_at)
    }
}
