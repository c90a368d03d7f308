use std::collections::BTreeMap;

use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::duration_in_days;

pub const ID_FIELD: &str = "id";
pub const NAME_FIELD: &str = "name";
pub const START_DATE_FIELD: &str = "startDate";
pub const END_DATE_FIELD: &str = "endDate";

/// Open extension record carried next to the four base fields.
pub type Fields = BTreeMap<String, Value>;

/// Read access to extension fields by name.
///
/// Grouping only ever needs the value of a single named field, so any
/// extension shape that can answer "what is field `name`" can be grouped.
pub trait FieldLookup {
    fn field(&self, name: &str) -> Option<Value>;
}

impl FieldLookup for Fields {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// Items with no extension record.
impl FieldLookup for () {
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem<T = Fields> {
    pub id: String,

    pub name: String,

    #[serde(with = "item_date_serde")]
    pub start_date: DateTime<Utc>,

    #[serde(with = "item_date_serde")]
    pub end_date: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: T,
}

impl<T: Default> TimelineItem<T> {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_date,
            end_date,
            extra: T::default(),
        }
    }
}

impl TimelineItem<Fields> {
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl<T> TimelineItem<T> {
    /// Whole days covered by the item, rounded up. Zero or negative for
    /// inverted ranges, which are passed through untouched.
    pub fn duration_days(&self) -> i64 {
        duration_in_days(self.start_date, self.end_date)
    }

    pub fn is_inverted(&self) -> bool {
        self.end_date < self.start_date
    }
}

impl<T: FieldLookup> TimelineItem<T> {
    /// Value of a base field or, failing that, of an extension field.
    pub fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            ID_FIELD => Some(Value::String(self.id.clone())),
            NAME_FIELD => Some(Value::String(self.name.clone())),
            START_DATE_FIELD => Some(Value::String(format_item_date(self.start_date))),
            END_DATE_FIELD => Some(Value::String(format_item_date(self.end_date))),
            other => self.extra.field(other),
        }
    }
}

pub fn format_item_date(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` timestamps and
/// bare `YYYY-MM-DD` dates. Naive forms are read as UTC.
pub fn parse_item_date(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    Err(anyhow!("unrecognized date: {raw}"))
}

pub mod item_date_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_item_date, parse_item_date};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_item_date(*dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_item_date(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    #[test]
    fn deserializes_base_and_extension_fields() {
        let raw = json!({
            "id": "A-1",
            "name": "Checkout revamp",
            "startDate": "2024-01-05",
            "endDate": "2024-02-10T12:30:00Z",
            "team": "Tech",
            "progress": 40
        });

        let item: TimelineItem = serde_json::from_value(raw).expect("valid item");
        assert_eq!(item.id, "A-1");
        assert_eq!(
            item.start_date,
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).single().expect("valid date")
        );
        assert_eq!(
            item.end_date,
            Utc.with_ymd_and_hms(2024, 2, 10, 12, 30, 0).single().expect("valid date")
        );
        assert_eq!(item.extra.get("team"), Some(&json!("Tech")));
        assert_eq!(item.extra.get("progress"), Some(&json!(40)));
        assert!(!item.extra.contains_key("startDate"));
    }

    #[test]
    fn serializes_with_camel_case_dates() {
        let item: TimelineItem = TimelineItem::new(
            "x",
            "X",
            Utc.with_ymd_and_hms(2023, 11, 15, 0, 0, 0).single().expect("valid date"),
            Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).single().expect("valid date"),
        )
        .with_field("team", "Retail");

        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["startDate"], json!("2023-11-15T00:00:00.000Z"));
        assert_eq!(value["endDate"], json!("2024-02-10T00:00:00.000Z"));
        assert_eq!(value["team"], json!("Retail"));
    }

    #[test]
    fn field_value_prefers_base_fields() {
        let item: TimelineItem = TimelineItem::new(
            "x",
            "Launch",
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single().expect("valid date"),
            Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).single().expect("valid date"),
        )
        .with_field("status", "On Track");

        assert_eq!(item.field_value("name"), Some(json!("Launch")));
        assert_eq!(
            item.field_value("startDate"),
            Some(json!("2024-03-01T00:00:00.000Z"))
        );
        assert_eq!(item.field_value("status"), Some(json!("On Track")));
        assert_eq!(item.field_value("team"), None);
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_item_date("next tuesday").is_err());
        assert!(parse_item_date("2024-13-01").is_err());
    }

    #[test]
    fn inverted_ranges_are_kept() {
        let item: TimelineItem = TimelineItem::new(
            "bad",
            "Backwards",
            Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).single().expect("valid date"),
            Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).single().expect("valid date"),
        );
        assert!(item.is_inverted());
        assert_eq!(item.duration_days(), -3);
    }
}
