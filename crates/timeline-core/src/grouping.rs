//! Partitioning of a flat item list into titled groups.
//!
//! Each group's items are sorted by start date and groups are ordered by a
//! locale-style comparison on their titles, so identical input always gives
//! identical output.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use deunicode::deunicode_char;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::item::{FieldLookup, Fields, NAME_FIELD, TimelineItem};
use crate::sort::sorted_by_start_date;

/// Title used for items that lack the grouping field.
pub const MISSING_FIELD_KEY: &str = "undefined";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineGroup<T = Fields> {
    pub group_title: String,
    pub group_items: Vec<TimelineItem<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortMeta {
    pub sort_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortedTimelineData<T = Fields> {
    pub meta: SortMeta,
    pub data: Vec<TimelineGroup<T>>,
}

impl<T> SortedTimelineData<T> {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.data.iter().map(|group| group.group_items.len()).sum()
    }

    pub fn items(&self) -> impl Iterator<Item = &TimelineItem<T>> {
        self.data.iter().flat_map(|group| group.group_items.iter())
    }

    pub fn find_item(&self, id: &str) -> Option<(&TimelineGroup<T>, &TimelineItem<T>)> {
        self.data.iter().find_map(|group| {
            group
                .group_items
                .iter()
                .find(|item| item.id == id)
                .map(|item| (group, item))
        })
    }
}

/// Groups by the stringified value of a top-level field. Nested objects are
/// not descended into; use [`FieldPath`] to pre-flatten them.
pub fn group_by_field<T, I>(items: I, field: &str) -> SortedTimelineData<T>
where
    T: FieldLookup,
    I: IntoIterator<Item = TimelineItem<T>>,
{
    group_by_key(items, field, |item| field_key(item, field))
}

/// Groups by a caller-supplied key; `sort_by` is recorded in the metadata.
pub fn group_by_key<T, I, F>(items: I, sort_by: &str, mut key: F) -> SortedTimelineData<T>
where
    I: IntoIterator<Item = TimelineItem<T>>,
    F: FnMut(&TimelineItem<T>) -> String,
{
    let mut buckets: BTreeMap<String, Vec<TimelineItem<T>>> = BTreeMap::new();
    for item in items {
        buckets.entry(key(&item)).or_default().push(item);
    }

    let mut data: Vec<TimelineGroup<T>> = buckets
        .into_iter()
        .map(|(group_title, items)| TimelineGroup {
            group_title,
            group_items: sorted_by_start_date(items),
        })
        .collect();
    data.sort_by(|a, b| locale_cmp(&a.group_title, &b.group_title));

    debug!(sort_by, groups = data.len(), "grouped timeline items");

    SortedTimelineData {
        meta: SortMeta {
            sort_by: sort_by.to_string(),
        },
        data,
    }
}

pub fn field_key<T: FieldLookup>(item: &TimelineItem<T>, field: &str) -> String {
    item.field_value(field)
        .map_or_else(|| MISSING_FIELD_KEY.to_string(), |value| stringify_value(&value))
}

/// String form of a JSON value as a browser's `String(value)` renders it.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => stringify_number(number),
        Value::String(text) => text.clone(),
        Value::Array(values) => values
            .iter()
            .map(|value| match value {
                Value::Null => String::new(),
                other => stringify_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn stringify_number(number: &serde_json::Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(float) if float.is_finite() && float.fract() == 0.0 => format!("{float:.0}"),
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}

/// Collation-style title ordering, close to what a browser's
/// `localeCompare` gives for the root locale.
///
/// Primary level compares accent-stripped, case-folded text with whitespace
/// ahead of punctuation, punctuation ahead of digits and digits ahead of
/// letters. Ties fall to accents (unaccented first), then case (lowercase
/// first), then code points. `Zebra`, `Éclair`, `apple`, `_misc`, `1st` sort
/// as `_misc`, `1st`, `apple`, `Éclair`, `Zebra`.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(primary_key(b))
        .then_with(|| accent_key(a).cmp(accent_key(b)))
        .then_with(|| case_cmp(a, b))
        .then_with(|| a.cmp(b))
}

fn primary_key(s: &str) -> impl Iterator<Item = (u8, char)> + '_ {
    s.chars()
        .flat_map(|c| {
            let base = match deunicode_char(c) {
                Some(ascii) if !ascii.is_empty() => ascii.to_string(),
                _ => c.to_string(),
            };
            base.chars().collect::<Vec<_>>()
        })
        .flat_map(char::to_lowercase)
        .map(|c| (char_class(c), c))
}

fn char_class(c: char) -> u8 {
    if c.is_whitespace() {
        0
    } else if c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_ascii()) {
        1
    } else if c.is_numeric() {
        2
    } else {
        3
    }
}

fn accent_key(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars().map(|c| !c.is_ascii())
}

/// Per-value item counts for one field.
pub fn count_by_field<'a, T, I>(items: I, field: &str) -> BTreeMap<String, usize>
where
    T: FieldLookup + 'a,
    I: IntoIterator<Item = &'a TimelineItem<T>>,
{
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(field_key(item, field)).or_insert(0) += 1;
    }
    counts
}

/// Group-by fields understood by older callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegacyGroupField {
    Name,
    Status,
    Category,
    Team,
    Priority,
}

impl LegacyGroupField {
    pub fn all() -> [Self; 5] {
        [
            Self::Name,
            Self::Status,
            Self::Category,
            Self::Team,
            Self::Priority,
        ]
    }

    pub fn as_field(self) -> &'static str {
        match self {
            Self::Name => NAME_FIELD,
            Self::Status => "status",
            Self::Category => "category",
            Self::Team => "team",
            Self::Priority => "priority",
        }
    }

    /// Unknown names fall back to `name`.
    pub fn from_str_lossy(raw: &str) -> Self {
        Self::all()
            .into_iter()
            .find(|field| field.as_field() == raw.trim())
            .unwrap_or(Self::Name)
    }
}

impl fmt::Display for LegacyGroupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_field())
    }
}

/// Dotted path into nested extension values, e.g. `clientInfo.region`.
///
/// This is a caller-side key extractor: it flattens the nested value into a
/// key before [`group_by_key`] ever sees the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let segments = raw
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn resolve<T: FieldLookup>(&self, item: &TimelineItem<T>) -> Option<Value> {
        if let Some(direct) = item.field_value(&self.raw) {
            return Some(direct);
        }

        let (head, rest) = self.segments.split_first()?;
        let mut current = item.field_value(head)?;
        for segment in rest {
            current = match current {
                Value::Object(mut map) => map.remove(segment)?,
                Value::Array(mut values) => {
                    let idx: usize = segment.parse().ok()?;
                    if idx >= values.len() {
                        return None;
                    }
                    values.swap_remove(idx)
                }
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn key<T: FieldLookup>(&self, item: &TimelineItem<T>) -> String {
        self.resolve(item)
            .map_or_else(|| MISSING_FIELD_KEY.to_string(), |value| stringify_value(&value))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// How a layout request partitions its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grouping {
    Field(String),
    Path(FieldPath),
}

impl Grouping {
    /// Dotted names become [`Grouping::Path`], anything else a plain field.
    pub fn parse(raw: &str) -> Self {
        let path = FieldPath::parse(raw);
        if path.is_nested() {
            Self::Path(path)
        } else {
            Self::Field(raw.trim().to_string())
        }
    }

    pub fn sort_by(&self) -> &str {
        match self {
            Self::Field(field) => field,
            Self::Path(path) => path.as_str(),
        }
    }

    pub fn group<T, I>(&self, items: I) -> SortedTimelineData<T>
    where
        T: FieldLookup,
        I: IntoIterator<Item = TimelineItem<T>>,
    {
        match self {
            Self::Field(field) => group_by_field(items, field),
            Self::Path(path) => group_by_key(items, path.as_str(), |item| path.key(item)),
        }
    }
}

impl Default for Grouping {
    fn default() -> Self {
        Self::Field(NAME_FIELD.to_string())
    }
}
