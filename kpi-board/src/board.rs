//! Precomputed view of a dashboard snapshot.
//!
//! Classification, formatting and layout are recomputed from scratch every
//! time a new record collection arrives; renderers only read from here.

use std::collections::HashMap;

use serde::Serialize;

use crate::format::{FormattedValue, ValueFormatter};
use crate::level::{classify, Achievement};
use crate::models::{DashboardData, KpiRecord};
use crate::roadmap::{compute_layout, TimelineLayout};

/// Number of distinct colors available for global KPIs
pub const PALETTE_SIZE: usize = 7;

/// One rung of a card's level ladder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LadderStep {
    pub index: u8,
    pub threshold: FormattedValue,
    pub reached: bool,
}

/// Everything a card needs to render one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub record_id: i64,
    pub achievement: Achievement,
    pub baseline: FormattedValue,
    pub target: FormattedValue,
    pub achieved: FormattedValue,
    /// Present thresholds only; empty for binary KPIs
    pub ladder: Vec<LadderStep>,
    pub color_slot: usize,
}

/// Presentation-ready dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardView {
    pub cards: Vec<CardView>,
    pub layout: Option<TimelineLayout>,
}

impl BoardView {
    pub fn build(data: &DashboardData, formatter: &ValueFormatter) -> Self {
        let slots = color_slots(&data.kpis);

        let cards = data
            .kpis
            .iter()
            .map(|record| {
                let color_slot = slots.get(record.global_kpi.as_str()).copied().unwrap_or(0);
                card_view(record, formatter, color_slot)
            })
            .collect();

        Self {
            cards,
            layout: compute_layout(&data.kpis),
        }
    }

    pub fn card_for(&self, record_id: i64) -> Option<&CardView> {
        self.cards.iter().find(|c| c.record_id == record_id)
    }
}

fn card_view(record: &KpiRecord, formatter: &ValueFormatter, color_slot: usize) -> CardView {
    let achievement = classify(record);

    let ladder = if record.is_binary() {
        Vec::new()
    } else {
        record
            .levels
            .iter()
            .filter(|(_, cell)| !cell.is_blank())
            .map(|(index, cell)| LadderStep {
                index,
                threshold: formatter.format(cell, record),
                reached: index <= achievement.level(),
            })
            .collect()
    };

    CardView {
        record_id: record.id,
        achievement,
        baseline: formatter.format(&record.baseline, record),
        target: formatter.format(&record.target, record),
        achieved: formatter.format(&record.achieved_display, record),
        ladder,
        color_slot,
    }
}

/// Map each distinct global KPI, in order of first appearance, to a color slot
pub fn color_slots(records: &[KpiRecord]) -> HashMap<&str, usize> {
    let mut slots = HashMap::new();
    for record in records {
        let next = slots.len();
        slots.entry(record.global_kpi.as_str()).or_insert(next % PALETTE_SIZE);
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Levels, Metadata, TargetType};

    fn data(kpis: Vec<KpiRecord>) -> DashboardData {
        DashboardData {
            metadata: Metadata {
                generated_at: "2025-02-01T10:00:00Z".to_string(),
                count: kpis.len(),
                version: "3.0.0".to_string(),
            },
            kpis,
        }
    }

    fn gradual(id: i64, global: &str) -> KpiRecord {
        KpiRecord {
            id,
            global_kpi: global.to_string(),
            sub_kpi: "Tasa de rebote".to_string(),
            start_date: "2025-01-01".to_string(),
            end_date: "2025-02-15".to_string(),
            achieved_value: 0.35.into(),
            achieved_display: 0.35.into(),
            baseline: 0.5.into(),
            target: 0.3.into(),
            levels: Levels {
                n1: 0.45.into(),
                n2: 0.4.into(),
                n3: "".into(),
                n4: 0.35.into(),
                n5: 0.3.into(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_card_view_for_gradual_record() {
        let board = BoardView::build(&data(vec![gradual(1, "SEO")]), &ValueFormatter::default());
        let card = board.card_for(1).unwrap();

        assert_eq!(card.achievement, Achievement::Level(4));
        assert_eq!(card.achieved.to_string(), "35%");
        assert_eq!(card.baseline.to_string(), "50%");

        let indices: Vec<u8> = card.ladder.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 4, 5]);
        let reached: Vec<bool> = card.ladder.iter().map(|s| s.reached).collect();
        assert_eq!(reached, vec![true, true, true, false]);
    }

    #[test]
    fn test_binary_card_has_no_ladder() {
        let record = KpiRecord {
            id: 2,
            target_type: TargetType::Binary,
            achieved_value: "Liberado".into(),
            achieved_display: "Liberado".into(),
            ..gradual(2, "Checkout")
        };
        let board = BoardView::build(&data(vec![record]), &ValueFormatter::default());
        let card = board.card_for(2).unwrap();
        assert_eq!(card.achievement, Achievement::Completed);
        assert!(card.ladder.is_empty());
        assert_eq!(card.achieved.to_string(), "Liberado");
    }

    #[test]
    fn test_color_slots_follow_first_appearance() {
        let records: Vec<KpiRecord> = ["SEO", "Ventas", "SEO", "A", "B", "C", "D", "E", "F"]
            .iter()
            .enumerate()
            .map(|(i, g)| gradual(i as i64, g))
            .collect();
        let slots = color_slots(&records);
        assert_eq!(slots["SEO"], 0);
        assert_eq!(slots["Ventas"], 1);
        assert_eq!(slots["E"], 6);
        assert_eq!(slots["F"], 0);
    }

    #[test]
    fn test_empty_board() {
        let board = BoardView::build(&DashboardData::default(), &ValueFormatter::default());
        assert!(board.cards.is_empty());
        assert!(board.layout.is_none());
    }

    #[test]
    fn test_board_serializes_for_print_mode() {
        let board = BoardView::build(&data(vec![gradual(1, "SEO")]), &ValueFormatter::default());
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["cards"][0]["achievement"]["label"], "Nivel 4");
        assert_eq!(json["cards"][0]["target"], "30%");
        assert_eq!(json["layout"]["month_buckets"][0]["label"], "Ene '25");
        assert_eq!(json["layout"]["range_start"], "2025-01-01");
    }
}
