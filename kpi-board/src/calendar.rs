//! Calendar-day arithmetic for the roadmap.
//!
//! Spreadsheet dates arrive as `YYYY-MM-DD` strings, sometimes with a
//! `T...` time suffix appended by the export. Everything here works on
//! whole days through [`NaiveDate`], which carries no time zone, so the
//! same input names the same day on every machine.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Spanish short month names used by the roadmap header
const MONTH_NAMES: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// A single calendar day with no time-of-day component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse `YYYY-MM-DD`, ignoring anything from the first `T` onwards
    pub fn parse(raw: &str) -> Option<Self> {
        let date_part = raw.trim().split('T').next()?;
        if date_part.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok().map(Self)
    }

    /// First day of this day's month
    pub fn first_of_month(&self) -> Self {
        Self(self.0.with_day(1).unwrap_or(self.0))
    }

    /// Last day of this day's month
    pub fn last_of_month(&self) -> Self {
        self.next_month_start()
            .map(|next| Self(next.0 - Duration::days(1)))
            .unwrap_or(*self)
    }

    /// First day of the following month
    pub fn next_month_start(&self) -> Option<Self> {
        let (year, month) = if self.0.month() == 12 {
            (self.0.year() + 1, 1)
        } else {
            (self.0.year(), self.0.month() + 1)
        };
        Self::from_ymd(year, month, 1)
    }

    /// Signed number of days from `self` to `other`
    pub fn days_until(&self, other: CalendarDay) -> i64 {
        (other.0 - self.0).num_days()
    }

    /// Header label such as `Ene '25`
    pub fn month_label(&self) -> String {
        let name = MONTH_NAMES[self.0.month0() as usize];
        format!("{} '{:02}", name, self.0.year().rem_euclid(100))
    }

    /// `dd/mm/yyyy`
    pub fn display(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Render a raw sheet date for humans.
///
/// Empty input renders as nothing and unparseable input is shown verbatim.
pub fn format_display_date(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    CalendarDay::parse(raw)
        .map(|day| day.display())
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_plain_and_timestamped() {
        assert_eq!(CalendarDay::parse("2025-03-14"), Some(day(2025, 3, 14)));
        assert_eq!(
            CalendarDay::parse("2025-03-14T03:00:00.000Z"),
            Some(day(2025, 3, 14))
        );
        assert_eq!(CalendarDay::parse(""), None);
        assert_eq!(CalendarDay::parse("pronto"), None);
        assert_eq!(CalendarDay::parse("2025-02-30"), None);
    }

    #[test]
    fn test_display_round_trip_keeps_the_day() {
        for raw in ["2024-01-01", "2024-12-31", "2025-06-30T23:59:59-05:00"] {
            let parsed = CalendarDay::parse(raw).unwrap();
            let expected: Vec<&str> = raw[..10].split('-').collect();
            assert_eq!(
                parsed.display(),
                format!("{}/{}/{}", expected[2], expected[1], expected[0])
            );
        }
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(day(2024, 2, 17).first_of_month(), day(2024, 2, 1));
        assert_eq!(day(2024, 2, 17).last_of_month(), day(2024, 2, 29));
        assert_eq!(day(2023, 2, 1).last_of_month(), day(2023, 2, 28));
        assert_eq!(day(2024, 12, 5).last_of_month(), day(2024, 12, 31));
        assert_eq!(day(2024, 12, 5).next_month_start(), Some(day(2025, 1, 1)));
    }

    #[test]
    fn test_days_until_is_signed() {
        assert_eq!(day(2025, 1, 1).days_until(day(2025, 1, 31)), 30);
        assert_eq!(day(2025, 1, 31).days_until(day(2025, 1, 1)), -30);
        assert_eq!(day(2025, 1, 1).days_until(day(2025, 1, 1)), 0);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(day(2025, 1, 9).month_label(), "Ene '25");
        assert_eq!(day(2030, 12, 1).month_label(), "Dic '30");
    }

    #[test]
    fn test_format_display_date() {
        assert_eq!(format_display_date(""), "");
        assert_eq!(format_display_date("2025-07-04"), "04/07/2025");
        assert_eq!(format_display_date("TBD"), "TBD");
    }
}
