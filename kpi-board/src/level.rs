//! Achievement level classification.
//!
//! Binary KPIs are either pending (level 1) or released (level 3). Gradual
//! KPIs are placed on their `n1..n5` threshold ladder; the direction of the
//! ladder is inferred from the first and last thresholds that parse.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::models::{CellValue, KpiRecord, TargetType, RELEASED_SENTINEL};

/// Result of classifying a KPI record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Achievement {
    /// Binary KPI released
    Completed,
    /// Binary KPI not yet released
    Pending,
    /// Not enough data to place the value on the ladder
    NotAvailable,
    /// Value is worse than the lowest threshold
    OutOfRange,
    /// Value reached ladder level 1..=5
    Level(u8),
}

impl Achievement {
    pub fn level(&self) -> u8 {
        match self {
            Achievement::Completed => 3,
            Achievement::Pending => 1,
            Achievement::NotAvailable | Achievement::OutOfRange => 0,
            Achievement::Level(n) => *n,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Achievement::Completed => "Completado".to_string(),
            Achievement::Pending => "Pendiente".to_string(),
            Achievement::NotAvailable => "N/A".to_string(),
            Achievement::OutOfRange => "Fuera de rango".to_string(),
            Achievement::Level(n) => format!("Nivel {}", n),
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Achievement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("Achievement", 2)?;
        state.serialize_field("level", &self.level())?;
        state.serialize_field("label", &self.label())?;
        state.end()
    }
}

/// Classify a record into its achievement level
pub fn classify(record: &KpiRecord) -> Achievement {
    match record.target_type {
        TargetType::Binary => classify_binary(&record.achieved_value),
        TargetType::Gradual => classify_gradual(record),
    }
}

fn classify_binary(achieved: &CellValue) -> Achievement {
    if achieved.as_text() == Some(RELEASED_SENTINEL) {
        Achievement::Completed
    } else {
        Achievement::Pending
    }
}

fn classify_gradual(record: &KpiRecord) -> Achievement {
    let Some(achieved) = record.achieved_value.as_number() else {
        return Achievement::NotAvailable;
    };

    let thresholds: Vec<(u8, f64)> = record
        .levels
        .iter()
        .filter_map(|(index, cell)| cell.as_number().map(|value| (index, value)))
        .collect();

    let (Some(&(_, first)), Some(&(_, last))) = (thresholds.first(), thresholds.last()) else {
        return Achievement::NotAvailable;
    };
    if thresholds.len() < 2 {
        return Achievement::NotAvailable;
    }

    let higher_is_better = last > first;

    thresholds
        .iter()
        .rev()
        .find(|(_, threshold)| {
            if higher_is_better {
                achieved >= *threshold
            } else {
                achieved <= *threshold
            }
        })
        .map(|&(index, _)| Achievement::Level(index))
        .unwrap_or(Achievement::OutOfRange)
}
