//! Column assignment for the items of one group.
//!
//! Greedy first-fit over items taken in start order: each item lands in the
//! lowest column whose occupants it does not touch, or opens a new column.
//! This is a visual approximation and makes no optimality promise beyond
//! what first-fit gives.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use crate::calendar::ranges_overlap;
use crate::grouping::TimelineGroup;
use crate::item::{Fields, TimelineItem};
use crate::sort::sort_refs_by_start_date;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResult<'a, T = Fields> {
    pub column: usize,
    pub item: &'a TimelineItem<T>,
    #[serde(with = "crate::item::item_date_serde")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "crate::item::item_date_serde")]
    pub end_date: DateTime<Utc>,
}

/// Column for a new `[start, end]` range given what is already placed.
///
/// Columns `0..=max_column + 1` are scanned in order; a column is free when
/// the range ends strictly before, or starts strictly after, every range in
/// it.
pub fn find_placement<T>(
    placements: &[PlacementResult<'_, T>],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> usize {
    let Some(max_column) = placements.iter().map(|p| p.column).max() else {
        return 0;
    };

    (0..=max_column + 1)
        .find(|&column| {
            placements
                .iter()
                .filter(|p| p.column == column)
                .all(|p| !ranges_overlap(start, end, p.start_date, p.end_date))
        })
        .unwrap_or(max_column + 1)
}

/// Places items in the order given. Callers pass items sorted by start date;
/// the result depends on that order.
pub fn place_items<'a, T, I>(items: I) -> Vec<PlacementResult<'a, T>>
where
    T: 'a,
    I: IntoIterator<Item = &'a TimelineItem<T>>,
{
    let mut placements: Vec<PlacementResult<'a, T>> = Vec::new();

    for item in items {
        let column = find_placement(&placements, item.start_date, item.end_date);
        trace!(id = %item.id, column, "placed item");
        placements.push(PlacementResult {
            column,
            item,
            start_date: item.start_date,
            end_date: item.end_date,
        });
    }

    placements
}

/// Sorts the group's items by start date and places them.
pub fn place_group<T>(group: &TimelineGroup<T>) -> Vec<PlacementResult<'_, T>> {
    let mut ordered: Vec<&TimelineItem<T>> = group.group_items.iter().collect();
    sort_refs_by_start_date(&mut ordered);
    place_items(ordered)
}

/// Number of columns used, 0 for an empty placement.
pub fn column_count<T>(placements: &[PlacementResult<'_, T>]) -> usize {
    placements
        .iter()
        .map(|p| p.column + 1)
        .max()
        .unwrap_or(0)
}
