use crate::item::TimelineItem;

/// Copy of `items` ordered by start date, compared at millisecond precision.
/// The sort is stable, so items sharing a start keep their input order.
pub fn sort_by_start_date<T: Clone>(items: &[TimelineItem<T>]) -> Vec<TimelineItem<T>> {
    sorted_by_start_date(items.to_vec())
}

pub fn sorted_by_start_date<T>(mut items: Vec<TimelineItem<T>>) -> Vec<TimelineItem<T>> {
    items.sort_by_key(|item| item.start_date.timestamp_millis());
    items
}

pub fn sort_refs_by_start_date<T>(items: &mut [&TimelineItem<T>]) {
    items.sort_by_key(|item| item.start_date.timestamp_millis());
}
