//! End-to-end layout: group, sort, place, count overlap, then size the
//! shared time axis.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::axis::{TimelineInterval, compute_interval};
use crate::grouping::{Grouping, SortMeta, SortedTimelineData};
use crate::item::{FieldLookup, Fields, TimelineItem};
use crate::overlap::max_overlap;
use crate::placement::{column_count, place_group};
use crate::view::{TimeView, ZoomLevel};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem<T = Fields> {
    pub column: usize,
    #[serde(flatten)]
    pub item: TimelineItem<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLayout<T = Fields> {
    pub title: String,
    pub placements: Vec<PlacedItem<T>>,
    pub column_count: usize,
    pub max_overlap: usize,
}

impl<T> GroupLayout<T> {
    /// Rows the group needs: the larger of its column count and its peak
    /// concurrency, and at least one so empty-looking groups still show.
    pub fn row_count(&self) -> usize {
        self.column_count.max(self.max_overlap).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineLayout<T = Fields> {
    pub meta: SortMeta,
    pub groups: Vec<GroupLayout<T>>,
    pub interval: TimelineInterval,
    pub zoom: ZoomLevel,
    pub view: TimeView,
    pub total_days: i64,
    pub today_offset: i64,
}

impl<T> TimelineLayout<T> {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.placements.len()).sum()
    }

    /// Pixel width of the whole grid at the chosen zoom.
    pub fn content_width(&self) -> f64 {
        self.view.span_width(self.total_days)
    }

    pub fn find_item(&self, id: &str) -> Option<(&GroupLayout<T>, &PlacedItem<T>)> {
        self.groups.iter().find_map(|group| {
            group
                .placements
                .iter()
                .find(|placed| placed.item.id == id)
                .map(|placed| (group, placed))
        })
    }
}

/// Runs the full pipeline. The interval is computed over every item, not per
/// group, so all groups share one axis.
#[tracing::instrument(skip(items), fields(count = items.len()))]
pub fn build_layout<T>(
    items: Vec<TimelineItem<T>>,
    grouping: &Grouping,
    zoom: ZoomLevel,
    today: NaiveDate,
) -> TimelineLayout<T>
where
    T: FieldLookup + Clone,
{
    let interval = compute_interval(&items, today);
    let sorted: SortedTimelineData<T> = grouping.group(items);

    let groups: Vec<GroupLayout<T>> = sorted
        .data
        .iter()
        .map(|group| {
            let placements = place_group(group);
            let columns = column_count(&placements);
            let overlap = max_overlap(&group.group_items);
            debug!(
                title = %group.group_title,
                items = group.group_items.len(),
                columns,
                overlap,
                "laid out group"
            );

            GroupLayout {
                title: group.group_title.clone(),
                placements: placements
                    .into_iter()
                    .map(|placement| PlacedItem {
                        column: placement.column,
                        item: placement.item.clone(),
                    })
                    .collect(),
                column_count: columns,
                max_overlap: overlap,
            }
        })
        .collect();

    let total_days = interval.total_days();
    let today_offset = interval.day_offset(today);

    info!(
        groups = groups.len(),
        years = interval.years.len(),
        total_days,
        zoom = %zoom,
        "built timeline layout"
    );

    TimelineLayout {
        meta: sorted.meta,
        groups,
        interval,
        zoom,
        view: zoom.view(),
        total_days,
        today_offset,
    }
}
