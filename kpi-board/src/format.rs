//! Cell value formatting.
//!
//! Sheet cells mix ratios, counts and free text. A value is shown as a
//! percentage only when the KPI's own wording says it is a percentage and the
//! number looks like a fractional ratio; integers are never rescaled, so a
//! count of `1` is not shown as `100%`.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::models::{display_number, CellValue, KpiRecord};

/// Substrings in a KPI's wording that mark its values as percentages
pub const DEFAULT_PERCENT_MARKERS: &[&str] = &["porcentaje", "tasa", "%", "rate"];

/// Placeholder for blank cells
pub const PLACEHOLDER: &str = "-";

/// A cell ready for display
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedValue {
    /// Ratio rendered as a whole percentage
    Percent(i64),
    /// Integral number
    Integer(f64),
    /// Original cell, untouched
    Raw(CellValue),
    /// Nothing to show
    Placeholder,
}

impl fmt::Display for FormattedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormattedValue::Percent(p) => write!(f, "{}%", p),
            FormattedValue::Integer(n) => write!(f, "{}", display_number(*n)),
            FormattedValue::Raw(cell) => write!(f, "{}", cell),
            FormattedValue::Placeholder => write!(f, "{}", PLACEHOLDER),
        }
    }
}

impl Serialize for FormattedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Formats cells using a configurable list of percentage markers
#[derive(Debug, Clone)]
pub struct ValueFormatter {
    markers: Vec<String>,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PERCENT_MARKERS.iter().copied())
    }
}

impl ValueFormatter {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Whether the record's wording marks its values as percentages
    pub fn is_percentage(&self, record: &KpiRecord) -> bool {
        let context = format!("{}{}{}", record.sub_kpi, record.formula, record.global_kpi)
            .to_lowercase();
        self.markers.iter().any(|marker| context.contains(marker.as_str()))
    }

    /// Format `raw`, a cell belonging to `record`
    pub fn format(&self, raw: &CellValue, record: &KpiRecord) -> FormattedValue {
        if matches!(raw, CellValue::Number(n) if n.is_nan()) {
            return FormattedValue::Placeholder;
        }

        let number = match raw.as_number() {
            Some(n) if !raw.is_blank() => n,
            _ => {
                return if raw.is_blank() {
                    FormattedValue::Placeholder
                } else {
                    FormattedValue::Raw(raw.clone())
                };
            }
        };

        let is_integer = number.is_finite() && number.fract() == 0.0;

        if !is_integer
            && number != 0.0
            && number.abs() <= 1.0
            && self.is_percentage(record)
        {
            return FormattedValue::Percent(js_round(number * 100.0));
        }

        if is_integer {
            return FormattedValue::Integer(number);
        }

        FormattedValue::Raw(raw.clone())
    }
}

/// Round half towards positive infinity
fn js_round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_record() -> KpiRecord {
        KpiRecord {
            sub_kpi: "Conversión".to_string(),
            formula: "Tasa de pedidos sobre sesiones".to_string(),
            global_kpi: "Ventas".to_string(),
            ..Default::default()
        }
    }

    fn count_record() -> KpiRecord {
        KpiRecord {
            sub_kpi: "Incidencias críticas".to_string(),
            formula: "conteo mensual".to_string(),
            global_kpi: "Calidad".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ratio_with_percent_wording() {
        let f = ValueFormatter::default();
        let record = rate_record();
        assert_eq!(f.format(&0.5.into(), &record).to_string(), "50%");
        assert_eq!(f.format(&"0.125".into(), &record).to_string(), "13%");
        assert_eq!(f.format(&(-0.25).into(), &record).to_string(), "-25%");
    }

    #[test]
    fn test_integers_and_zero_are_never_rescaled() {
        let f = ValueFormatter::default();
        let record = rate_record();
        assert_eq!(f.format(&1.0.into(), &record), FormattedValue::Integer(1.0));
        assert_eq!(f.format(&1.0.into(), &record).to_string(), "1");
        assert_eq!(f.format(&0.0.into(), &record).to_string(), "0");
        assert_eq!(f.format(&"-1".into(), &record).to_string(), "-1");
    }

    #[test]
    fn test_fraction_without_percent_wording_is_raw() {
        let f = ValueFormatter::default();
        let record = count_record();
        assert_eq!(f.format(&0.5.into(), &record).to_string(), "0.5");
        assert_eq!(f.format(&"3.75 hrs".into(), &record).to_string(), "3.75 hrs");
    }

    #[test]
    fn test_fraction_above_one_keeps_original_text() {
        let f = ValueFormatter::default();
        assert_eq!(f.format(&"1.50".into(), &rate_record()).to_string(), "1.50");
        assert_eq!(f.format(&2.75.into(), &rate_record()).to_string(), "2.75");
    }

    #[test]
    fn test_numeric_prefix_drops_trailing_text_for_integers() {
        let f = ValueFormatter::default();
        assert_eq!(f.format(&"12 issues".into(), &count_record()).to_string(), "12");
        assert_eq!(f.format(&"12,5".into(), &rate_record()).to_string(), "12");
    }

    #[test]
    fn test_nan_renders_as_placeholder() {
        let f = ValueFormatter::default();
        let nan = CellValue::Number(f64::NAN);
        assert_eq!(f.format(&nan, &rate_record()), FormattedValue::Placeholder);
        assert_eq!(f.format(&nan, &count_record()).to_string(), "-");
    }

    #[test]
    fn test_blank_and_text_cells() {
        let f = ValueFormatter::default();
        let record = rate_record();
        assert_eq!(f.format(&CellValue::Empty, &record), FormattedValue::Placeholder);
        assert_eq!(f.format(&"".into(), &record).to_string(), "-");
        assert_eq!(f.format(&"Liberado".into(), &record).to_string(), "Liberado");
    }

    #[test]
    fn test_markers_match_any_field_case_insensitively() {
        let f = ValueFormatter::default();
        let record = KpiRecord {
            global_kpi: "Bounce RATE".to_string(),
            ..Default::default()
        };
        assert!(f.is_percentage(&record));
        assert!(!f.is_percentage(&count_record()));
    }

    #[test]
    fn test_custom_markers() {
        let f = ValueFormatter::new(["Ratio", ""]);
        assert_eq!(f.markers(), ["ratio".to_string()]);
        let record = KpiRecord {
            formula: "ratio de cumplimiento".to_string(),
            ..Default::default()
        };
        assert_eq!(f.format(&0.9.into(), &record).to_string(), "90%");
        assert_eq!(f.format(&0.9.into(), &rate_record()).to_string(), "0.9");
    }
}
