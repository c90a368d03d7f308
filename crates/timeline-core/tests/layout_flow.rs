use std::fs;

use chrono::NaiveDate;
use timeline_core::config::Config;
use timeline_core::datastore::{ItemSource, JsonFileSource, resolve_items_path};
use timeline_core::grouping::{Grouping, LegacyGroupField, count_by_field, group_by_field};
use timeline_core::layout::build_layout;
use timeline_core::view::ZoomLevel;
use tempfile::tempdir;

const ITEMS: &str = r#"[
  {"id": "p1", "name": "Checkout revamp", "startDate": "2024-01-08", "endDate": "2024-03-15",
   "team": "Tech", "status": "On Track", "clientInfo": {"region": "NA"}},
  {"id": "p2", "name": "Search relevance", "startDate": "2024-02-01", "endDate": "2024-02-28",
   "team": "Tech", "status": "At Risk", "clientInfo": {"region": "EU"}},
  {"id": "p3", "name": "Spring campaign", "startDate": "2023-11-20", "endDate": "2024-01-10",
   "team": "brand", "status": "On Track", "clientInfo": {"region": "EU"}},
  {"id": "p4", "name": "Returns portal", "startDate": "2024-03-16", "endDate": "2024-05-01",
   "team": "Tech", "status": "Off Track"},
  {"id": "p5", "name": "Warehouse sync", "startDate": "2024-04-02", "endDate": "2024-04-30"}
]"#;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid today")
}

#[test]
fn json_file_through_full_layout() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("items.json");
    fs::write(&path, ITEMS).expect("write items");

    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
        "rc.data.location".to_string(),
        path.display().to_string(),
    )]);
    let resolved = resolve_items_path(&cfg, None).expect("items path");
    let items = JsonFileSource::new(resolved)
        .load_items()
        .expect("load items");
    assert_eq!(items.len(), 5);

    let layout = build_layout(items, &Grouping::parse("team"), ZoomLevel::Month, today());

    let titles: Vec<&str> = layout.groups.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["brand", "Tech", "undefined"]);
    assert_eq!(layout.interval.years, vec![2023, 2024]);
    assert_eq!(layout.interval.start_month, 10);
    assert_eq!(layout.total_days, 30 + 31 + 366);

    let tech = &layout.groups[1];
    let placed: Vec<(&str, usize)> = tech
        .placements
        .iter()
        .map(|p| (p.item.id.as_str(), p.column))
        .collect();
    assert_eq!(placed, vec![("p1", 0), ("p2", 1), ("p4", 0)]);
    assert_eq!(tech.column_count, 2);
    assert_eq!(tech.max_overlap, 2);
}

#[test]
fn jsonl_file_groups_by_nested_path() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("items.jsonl");
    let items: Vec<serde_json::Value> = serde_json::from_str(ITEMS).expect("fixture json");
    let lines: Vec<String> = items.iter().map(|v| v.to_string()).collect();
    fs::write(&path, lines.join("\n")).expect("write items");

    let items = JsonFileSource::new(&path).load_items().expect("load items");
    let data = Grouping::parse("clientInfo.region").group(items);

    let titles: Vec<&str> = data.data.iter().map(|g| g.group_title.as_str()).collect();
    assert_eq!(titles, vec!["EU", "NA", "undefined"]);
    assert_eq!(data.item_count(), 5);

    let eu_ids: Vec<&str> = data.data[0]
        .group_items
        .iter()
        .map(|item| item.id.as_str())
        .collect();
    assert_eq!(eu_ids, vec!["p3", "p2"]);
}

#[test]
fn legacy_field_names_and_counts() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("items.json");
    fs::write(&path, ITEMS).expect("write items");
    let items = JsonFileSource::new(&path).load_items().expect("load items");

    let field = LegacyGroupField::from_str_lossy("status");
    let counts = count_by_field(&items, field.as_field());
    assert_eq!(counts.get("On Track"), Some(&2));
    assert_eq!(counts.get("undefined"), Some(&1));

    let fallback = LegacyGroupField::from_str_lossy("owner");
    let data = group_by_field(items, fallback.as_field());
    assert_eq!(data.meta.sort_by, "name");
    assert_eq!(data.data.len(), 5);
    assert_eq!(data.data[0].group_title, "Checkout revamp");
}

#[test]
fn layout_json_is_stable() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("items.json");
    fs::write(&path, ITEMS).expect("write items");
    let source = JsonFileSource::new(&path);

    let first = build_layout(
        source.load_items().expect("load items"),
        &Grouping::parse("status"),
        ZoomLevel::Day,
        today(),
    );
    let second = build_layout(
        source.load_items().expect("load items"),
        &Grouping::parse("status"),
        ZoomLevel::Day,
        today(),
    );

    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}
