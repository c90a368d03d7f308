use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{
  Deserialize,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ZoomLevel {
  Year,
  #[default]
  Month,
  Day
}

/// Pixel scale for one zoom level.
#[derive(
  Debug, Clone, Copy, PartialEq, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct TimeView {
  pub day_width:      f64,
  pub label:          &'static str,
  pub zoom_threshold: f64
}

const YEAR_VIEW: TimeView = TimeView {
  day_width:      4.5,
  label:          "Year",
  zoom_threshold: 9.0
};

const MONTH_VIEW: TimeView = TimeView {
  day_width:      8.0,
  label:          "Month",
  zoom_threshold: 8.0
};

const DAY_VIEW: TimeView = TimeView {
  day_width:      24.0,
  label:          "Day",
  zoom_threshold: 9.0
};

impl ZoomLevel {
  pub fn all() -> [Self; 3] {
    [Self::Year, Self::Month, Self::Day]
  }

  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Year => "year",
      | Self::Month => "month",
      | Self::Day => "day"
    }
  }

  pub fn label(self) -> &'static str {
    self.view().label
  }

  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key.trim() {
      | "year" => Some(Self::Year),
      | "month" => Some(Self::Month),
      | "day" => Some(Self::Day),
      | _ => None
    }
  }

  pub fn view(self) -> TimeView {
    match self {
      | Self::Year => YEAR_VIEW,
      | Self::Month => MONTH_VIEW,
      | Self::Day => DAY_VIEW
    }
  }
}

impl FromStr for ZoomLevel {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::from_key(s).ok_or_else(|| {
      anyhow!(
        "unknown zoom level: {s} \
         (expected year, month or \
         day)"
      )
    })
  }
}

impl fmt::Display for ZoomLevel {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_key())
  }
}

impl TimeView {
  /// Day labels switch to their wide
  /// form above the threshold.
  pub fn is_expanded(&self) -> bool {
    self.day_width > self.zoom_threshold
  }

  pub fn span_width(
    &self,
    days: i64
  ) -> f64 {
    days as f64 * self.day_width
  }

  pub fn offset_for(
    &self,
    day_offset: i64
  ) -> f64 {
    self.span_width(day_offset)
  }
}
