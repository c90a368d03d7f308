use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{days_in_month, first_day_of_month_index};
use crate::item::TimelineItem;

/// Horizontal extent of the calendar: contiguous years and the month the
/// first year starts at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineInterval {
    pub years: Vec<i32>,
    pub start_month: u32,
}

impl TimelineInterval {
    pub fn fallback(year: i32) -> Self {
        Self {
            years: vec![year],
            start_month: 0,
        }
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    /// First day of the ruler.
    pub fn origin(&self) -> Option<NaiveDate> {
        self.first_year()
            .map(|year| first_day_of_month_index(year, self.start_month))
    }

    /// `(year, month_index)` for every month cell, from `start_month` of the
    /// first year through December of the last.
    pub fn months(&self) -> Vec<(i32, u32)> {
        self.years
            .iter()
            .enumerate()
            .flat_map(|(idx, &year)| {
                let from = if idx == 0 { self.start_month } else { 0 };
                (from..12).map(move |month| (year, month))
            })
            .collect()
    }

    pub fn total_days(&self) -> i64 {
        self.months()
            .into_iter()
            .map(|(year, month)| i64::from(days_in_month(year, month)))
            .sum()
    }

    /// Days between the ruler origin and `date`; 0 for dates before it.
    pub fn day_offset(&self, date: NaiveDate) -> i64 {
        self.origin()
            .map(|origin| (date - origin).num_days().max(0))
            .unwrap_or(0)
    }
}

/// Scans every item regardless of order for the earliest start and the
/// latest end. An empty list yields a single-year span for `today`.
pub fn compute_interval<T>(items: &[TimelineItem<T>], today: NaiveDate) -> TimelineInterval {
    let earliest = items.iter().map(|item| item.start_date).min();
    let latest = items.iter().map(|item| item.end_date).max();

    let (Some(earliest), Some(latest)) = (earliest, latest) else {
        return TimelineInterval::fallback(today.year());
    };

    let first_year = earliest.year();
    let last_year = latest.year().max(first_year);

    TimelineInterval {
        years: (first_year..=last_year).collect(),
        start_month: earliest.month0(),
    }
}

pub fn compute_interval_now<T>(items: &[TimelineItem<T>]) -> TimelineInterval {
    compute_interval(items, Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone};

    use super::*;
    use crate::item::Fields;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .expect("valid date")
    }

    fn item(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> TimelineItem<Fields> {
        TimelineItem::new(id, id, start, end)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid today")
    }

    #[test]
    fn spans_start_year_through_end_year() {
        let items = vec![item("a", at(2023, 11, 15), at(2024, 2, 10))];

        let interval = compute_interval(&items, today());

        assert_eq!(interval.years, vec![2023, 2024]);
        assert_eq!(interval.start_month, 10);
    }

    #[test]
    fn does_not_need_sorted_input() {
        let items = vec![
            item("late", at(2025, 6, 1), at(2026, 3, 1)),
            item("early", at(2022, 4, 9), at(2022, 5, 1)),
            item("middle", at(2024, 1, 1), at(2024, 1, 2)),
        ];

        let interval = compute_interval(&items, today());

        assert_eq!(interval.years, vec![2022, 2023, 2024, 2025, 2026]);
        assert_eq!(interval.start_month, 3);
    }

    #[test]
    fn empty_input_falls_back_to_current_year() {
        let items: Vec<TimelineItem<Fields>> = vec![];

        let interval = compute_interval(&items, today());

        assert_eq!(interval, TimelineInterval::fallback(2026));
        assert_eq!(interval.start_month, 0);
    }

    #[test]
    fn clock_variant_falls_back_to_this_year() {
        let items: Vec<TimelineItem<Fields>> = vec![];
        let before = Utc::now().year();

        let interval = compute_interval_now(&items);

        let after = Utc::now().year();
        assert!(interval.years == vec![before] || interval.years == vec![after]);
        assert_eq!(interval.start_month, 0);
    }

    #[test]
    fn inverted_item_still_yields_a_year() {
        let items = vec![item("bad", at(2025, 3, 1), at(2024, 12, 1))];

        let interval = compute_interval(&items, today());

        assert_eq!(interval.years, vec![2025]);
        assert_eq!(interval.start_month, 2);
    }

    #[test]
    fn counts_days_from_start_month() {
        let interval = TimelineInterval {
            years: vec![2023, 2024],
            start_month: 10,
        };

        assert_eq!(interval.months().len(), 14);
        assert_eq!(interval.months()[0], (2023, 10));
        assert_eq!(interval.months()[2], (2024, 0));
        assert_eq!(interval.total_days(), 30 + 31 + 366);
    }

    #[test]
    fn day_offset_clamps_before_origin() {
        let interval = TimelineInterval {
            years: vec![2024],
            start_month: 1,
        };
        let feb_10 = NaiveDate::from_ymd_opt(2024, 2, 10).expect("valid date");
        let mar_1 = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
        let jan_5 = NaiveDate::from_ymd_opt(2024, 1, 5).expect("valid date");

        assert_eq!(interval.day_offset(feb_10), 9);
        assert_eq!(interval.day_offset(mar_1), 29);
        assert_eq!(interval.day_offset(jan_5), 0);
    }
}
