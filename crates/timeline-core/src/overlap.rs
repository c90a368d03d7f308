use crate::item::TimelineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    // Opens sort before closes at the same instant so touching ranges count
    // as concurrent.
    Open,
    Close,
}

/// Largest number of items active at one instant within a group. Sizes the
/// group's vertical extent; placement computes its own column count.
pub fn max_overlap<T>(items: &[TimelineItem<T>]) -> usize {
    max_concurrent(items.iter().map(|item| (item.start_date, item.end_date)))
}

/// Sweep line over inclusive `(start, end)` ranges. Inverted ranges occupy
/// no time and are skipped.
pub fn max_concurrent<K, I>(ranges: I) -> usize
where
    K: Ord + Copy,
    I: IntoIterator<Item = (K, K)>,
{
    let mut events: Vec<(K, Edge)> = Vec::new();
    for (start, end) in ranges {
        if end < start {
            continue;
        }
        events.push((start, Edge::Open));
        events.push((end, Edge::Close));
    }
    events.sort_unstable();

    let mut active = 0usize;
    let mut peak = 0usize;
    for (_, edge) in events {
        match edge {
            Edge::Open => {
                active += 1;
                peak = peak.max(active);
            }
            Edge::Close => active = active.saturating_sub(1),
        }
    }

    peak
}
