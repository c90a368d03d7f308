use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::axis::TimelineInterval;
use crate::calendar::{days_in_month, month_name};
use crate::config::Config;
use crate::grouping::{SortedTimelineData, stringify_value};
use crate::item::{TimelineItem, format_item_date};
use crate::layout::TimelineLayout;
use crate::view::ZoomLevel;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            color: cfg.color()?,
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn print_json<S: Serialize>(&self, value: &S) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, data))]
    pub fn print_groups(&self, data: &SortedTimelineData) -> anyhow::Result<()> {
        self.write_groups(io::stdout().lock(), data)
    }

    #[tracing::instrument(skip(self, layout))]
    pub fn print_layout(&self, layout: &TimelineLayout) -> anyhow::Result<()> {
        self.write_layout(io::stdout().lock(), layout)
    }

    #[tracing::instrument(skip(self, interval))]
    pub fn print_axis(&self, interval: &TimelineInterval) -> anyhow::Result<()> {
        self.write_axis(io::stdout().lock(), interval)
    }

    #[tracing::instrument(skip(self, item))]
    pub fn print_item_info(&self, group_title: &str, item: &TimelineItem) -> anyhow::Result<()> {
        self.write_item_info(io::stdout().lock(), group_title, item)
    }

    #[tracing::instrument(skip(self, counts))]
    pub fn print_counts(&self, field: &str, counts: &BTreeMap<String, usize>) -> anyhow::Result<()> {
        self.write_counts(io::stdout().lock(), field, counts)
    }

    pub fn print_zooms(&self, current: ZoomLevel) -> anyhow::Result<()> {
        self.write_zooms(io::stdout().lock(), current)
    }

    pub fn write_groups<W: Write>(
        &self,
        mut out: W,
        data: &SortedTimelineData,
    ) -> anyhow::Result<()> {
        let headers = vec![
            data.meta.sort_by.clone(),
            "ID".to_string(),
            "Name".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Days".to_string(),
        ];

        let mut rows = Vec::with_capacity(data.item_count());
        for group in &data.data {
            for (idx, item) in group.group_items.iter().enumerate() {
                let title = if idx == 0 {
                    self.paint(&group.group_title, "36")
                } else {
                    String::new()
                };
                rows.push(vec![
                    title,
                    self.paint(&item.id, "33"),
                    item.name.clone(),
                    short_date(item.start_date),
                    self.end_cell(item),
                    item.duration_days().to_string(),
                ]);
            }
        }

        write_table(&mut out, headers, rows)?;
        writeln!(
            out,
            "\n{} groups, {} items",
            data.data.len(),
            data.item_count()
        )?;
        Ok(())
    }

    pub fn write_layout<W: Write>(&self, mut out: W, layout: &TimelineLayout) -> anyhow::Result<()> {
        writeln!(
            out,
            "{} view, {} days from {} {}, {:.0}px wide",
            layout.view.label,
            layout.total_days,
            month_name(layout.interval.start_month).unwrap_or("?"),
            layout.interval.first_year().unwrap_or_default(),
            layout.content_width()
        )?;

        for group in &layout.groups {
            writeln!(out)?;
            writeln!(
                out,
                "{} ({} columns, max overlap {})",
                self.paint(&group.title, "36"),
                group.column_count,
                group.max_overlap
            )?;

            let headers = vec![
                "Col".to_string(),
                "ID".to_string(),
                "Name".to_string(),
                "Start".to_string(),
                "End".to_string(),
                "Offset".to_string(),
                "Px".to_string(),
            ];
            let rows = group
                .placements
                .iter()
                .map(|placed| {
                    let offset = layout
                        .interval
                        .day_offset(placed.item.start_date.date_naive());
                    vec![
                        placed.column.to_string(),
                        self.paint(&placed.item.id, "33"),
                        placed.item.name.clone(),
                        short_date(placed.item.start_date),
                        self.end_cell(&placed.item),
                        offset.to_string(),
                        format!("{:.0}", layout.view.offset_for(offset)),
                    ]
                })
                .collect();
            write_table(&mut out, headers, rows)?;
        }

        Ok(())
    }

    pub fn write_axis<W: Write>(
        &self,
        mut out: W,
        interval: &TimelineInterval,
    ) -> anyhow::Result<()> {
        let years = interval
            .years
            .iter()
            .map(|year| year.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "years        {years}")?;
        writeln!(
            out,
            "start month  {}",
            month_name(interval.start_month).unwrap_or("?")
        )?;
        writeln!(out, "total days   {}", interval.total_days())?;
        writeln!(out)?;

        let headers = vec!["Year".to_string(), "Month".to_string(), "Days".to_string()];
        let rows = interval
            .months()
            .into_iter()
            .map(|(year, month)| {
                vec![
                    year.to_string(),
                    month_name(month).unwrap_or("?").to_string(),
                    days_in_month(year, month).to_string(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)
    }

    pub fn write_item_info<W: Write>(
        &self,
        mut out: W,
        group_title: &str,
        item: &TimelineItem,
    ) -> anyhow::Result<()> {
        writeln!(out, "id        {}", item.id)?;
        writeln!(out, "name      {}", item.name)?;
        writeln!(out, "group     {group_title}")?;
        writeln!(out, "start     {}", format_item_date(item.start_date))?;
        writeln!(out, "end       {}", format_item_date(item.end_date))?;
        writeln!(out, "days      {}", item.duration_days())?;

        for (key, value) in &item.extra {
            writeln!(out, "{key:<9} {}", stringify_value(value))?;
        }

        Ok(())
    }

    pub fn write_counts<W: Write>(
        &self,
        mut out: W,
        field: &str,
        counts: &BTreeMap<String, usize>,
    ) -> anyhow::Result<()> {
        let headers = vec![field.to_string(), "Count".to_string()];
        let rows = counts
            .iter()
            .map(|(value, count)| vec![value.clone(), count.to_string()])
            .collect();
        write_table(&mut out, headers, rows)
    }

    pub fn write_zooms<W: Write>(&self, mut out: W, current: ZoomLevel) -> anyhow::Result<()> {
        let headers = vec![
            "Zoom".to_string(),
            "Label".to_string(),
            "Day width".to_string(),
            "Threshold".to_string(),
            "Wide labels".to_string(),
        ];
        let rows = ZoomLevel::all()
            .into_iter()
            .map(|zoom| {
                let view = zoom.view();
                let key = if zoom == current {
                    self.paint(&format!("{zoom}*"), "32")
                } else {
                    zoom.to_string()
                };
                vec![
                    key,
                    view.label.to_string(),
                    view.day_width.to_string(),
                    view.zoom_threshold.to_string(),
                    if view.is_expanded() { "yes" } else { "no" }.to_string(),
                ]
            })
            .collect();
        write_table(&mut out, headers, rows)
    }

    fn end_cell(&self, item: &TimelineItem) -> String {
        let end = short_date(item.end_date);
        if item.is_inverted() {
            self.paint(&end, "31")
        } else {
            end
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn short_date(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
