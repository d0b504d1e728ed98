//! Roadmap geometry.
//!
//! Lays KPI records out on a month-aligned date range. All positions are
//! percentages of the total span so any renderer can scale them to its own
//! width.

use serde::Serialize;
use tracing::warn;

use crate::calendar::CalendarDay;
use crate::models::KpiRecord;

/// Narrowest bar width, so zero-length records stay visible
pub const MIN_BAR_WIDTH_PCT: f64 = 0.5;

/// One month column of the roadmap header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub label: String,
    pub start: CalendarDay,
    pub width_pct: f64,
}

/// Placement of one record on the roadmap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub record_id: i64,
    pub left_pct: f64,
    pub width_pct: f64,
    /// Days from start to end, used for the duration hint
    pub duration_days: i64,
}

/// Full roadmap layout for a record collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineLayout {
    pub range_start: CalendarDay,
    pub range_end: CalendarDay,
    pub total_days: i64,
    pub month_buckets: Vec<MonthBucket>,
    pub bars: Vec<Bar>,
}

impl TimelineLayout {
    pub fn bar_for(&self, record_id: i64) -> Option<&Bar> {
        self.bars.iter().find(|b| b.record_id == record_id)
    }
}

/// Compute the roadmap layout.
///
/// Returns `None` when no record carries a readable pair of dates; callers
/// render their own empty state in that case.
pub fn compute_layout(records: &[KpiRecord]) -> Option<TimelineLayout> {
    let spans: Vec<(i64, CalendarDay, CalendarDay)> = records
        .iter()
        .filter_map(|record| match (record.start_day(), record.end_day()) {
            (Some(start), Some(end)) => Some((record.id, start, end)),
            _ => {
                warn!(
                    record_id = record.id,
                    start = %record.start_date,
                    end = %record.end_date,
                    "Skipping record with unreadable dates"
                );
                None
            }
        })
        .collect();

    let earliest = spans.iter().flat_map(|(_, s, e)| [*s, *e]).min()?;
    let latest = spans.iter().flat_map(|(_, s, e)| [*s, *e]).max()?;

    let range_start = earliest.first_of_month();
    let range_end = latest.last_of_month();
    let total_days = range_start.days_until(range_end) + 1;
    let total = total_days as f64;

    let month_buckets = month_buckets(range_start, range_end, total);

    let bars = spans
        .into_iter()
        .map(|(record_id, start, end)| {
            let duration_days = start.days_until(end);
            let left_pct = range_start.days_until(start) as f64 / total * 100.0;
            let width_pct = ((duration_days + 1) as f64 / total * 100.0).max(MIN_BAR_WIDTH_PCT);
            Bar {
                record_id,
                left_pct,
                width_pct,
                duration_days,
            }
        })
        .collect();

    Some(TimelineLayout {
        range_start,
        range_end,
        total_days,
        month_buckets,
        bars,
    })
}

fn month_buckets(range_start: CalendarDay, range_end: CalendarDay, total: f64) -> Vec<MonthBucket> {
    let mut buckets = Vec::new();
    let mut cursor = Some(range_start);

    while let Some(month_start) = cursor.filter(|c| *c <= range_end) {
        let month_end = month_start.last_of_month().min(range_end);
        let days = month_start.days_until(month_end) + 1;
        let width_pct = days as f64 / total * 100.0;

        if width_pct > 0.0 {
            buckets.push(MonthBucket {
                label: month_start.month_label(),
                start: month_start,
                width_pct,
            });
        }
        cursor = month_start.next_month_start();
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, start: &str, end: &str) -> KpiRecord {
        KpiRecord {
            id,
            start_date: start.to_string(),
            end_date: end.to_string(),
            ..Default::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_collection_has_no_layout() {
        assert!(compute_layout(&[]).is_none());
        assert!(compute_layout(&[record(1, "", "pronto")]).is_none());
    }

    #[test]
    fn test_single_full_month() {
        let layout = compute_layout(&[record(1, "2025-03-01", "2025-03-31")]).unwrap();
        assert_eq!(layout.total_days, 31);
        assert_eq!(layout.month_buckets.len(), 1);
        assert_eq!(layout.month_buckets[0].label, "Mar '25");
        assert!(close(layout.month_buckets[0].width_pct, 100.0));

        let bar = &layout.bars[0];
        assert!(close(bar.left_pct, 0.0));
        assert!(close(bar.width_pct, 100.0));
        assert_eq!(bar.duration_days, 30);
    }

    #[test]
    fn test_range_is_padded_to_whole_months() {
        let layout = compute_layout(&[
            record(1, "2025-01-15", "2025-02-10"),
            record(2, "2025-02-20", "2025-03-05T00:00:00Z"),
        ])
        .unwrap();

        assert_eq!(layout.range_start, CalendarDay::from_ymd(2025, 1, 1).unwrap());
        assert_eq!(layout.range_end, CalendarDay::from_ymd(2025, 3, 31).unwrap());
        assert_eq!(layout.total_days, 31 + 28 + 31);

        let labels: Vec<&str> = layout.month_buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Ene '25", "Feb '25", "Mar '25"]);

        let sum: f64 = layout.month_buckets.iter().map(|b| b.width_pct).sum();
        assert!(close(sum, 100.0));
        assert!(close(layout.month_buckets[1].width_pct, 28.0 / 90.0 * 100.0));
    }

    #[test]
    fn test_bar_offsets_are_proportional() {
        let layout = compute_layout(&[
            record(1, "2025-01-01", "2025-01-10"),
            record(2, "2025-01-11", "2025-01-31"),
        ])
        .unwrap();

        let first = layout.bar_for(1).unwrap();
        let second = layout.bar_for(2).unwrap();
        assert!(close(first.left_pct, 0.0));
        assert!(close(first.width_pct, 10.0 / 31.0 * 100.0));
        assert!(close(second.left_pct, 10.0 / 31.0 * 100.0));
        assert!(close(first.left_pct + first.width_pct, second.left_pct));
    }

    #[test]
    fn test_short_and_inverted_bars_keep_minimum_width() {
        let layout = compute_layout(&[
            record(1, "2024-01-01", "2024-12-31"),
            record(2, "2024-06-10", "2024-06-01"),
        ])
        .unwrap();

        let inverted = layout.bar_for(2).unwrap();
        assert_eq!(inverted.duration_days, -9);
        assert!(close(inverted.width_pct, MIN_BAR_WIDTH_PCT));
        assert!(inverted.left_pct.is_finite());
    }

    #[test]
    fn test_unreadable_records_are_left_out() {
        let layout = compute_layout(&[
            record(1, "2025-05-02", "2025-05-20"),
            record(2, "", "2025-09-01"),
        ])
        .unwrap();

        assert_eq!(layout.bars.len(), 1);
        assert!(layout.bar_for(2).is_none());
        assert_eq!(layout.range_end, CalendarDay::from_ymd(2025, 5, 31).unwrap());
    }

    #[test]
    fn test_range_crosses_year_boundary() {
        let layout = compute_layout(&[record(1, "2024-11-20", "2025-01-05")]).unwrap();
        let labels: Vec<&str> = layout.month_buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Nov '24", "Dic '24", "Ene '25"]);
        assert_eq!(layout.total_days, 30 + 31 + 31);
    }
}
