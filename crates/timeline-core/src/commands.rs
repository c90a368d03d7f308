use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument};

use crate::axis::{TimelineInterval, compute_interval};
use crate::cli::{Command, GroupArgs, LayoutArgs};
use crate::config::Config;
use crate::datastore::ItemSource;
use crate::grouping::{Grouping, count_by_field};
use crate::layout::build_layout;
use crate::render::Renderer;

/// Runs one command. The item source is only touched by commands that need
/// items, so `zooms` and `show` work without a data file.
#[instrument(skip(source, cfg, renderer))]
pub fn dispatch(
    source: &dyn ItemSource,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    debug!(?command, %today, "dispatching command");

    match command {
        Command::Groups(args) => cmd_groups(source, cfg, renderer, &args),
        Command::Layout(args) => cmd_layout(source, cfg, renderer, &args, today),
        Command::Axis => cmd_axis(source, renderer, today),
        Command::Info { id } => cmd_info(source, cfg, renderer, &id),
        Command::Stats { field } => cmd_stats(source, renderer, &field),
        Command::Zooms => cmd_zooms(cfg, renderer),
        Command::Show => cmd_show(cfg),
    }
}

fn grouping_for(cfg: &Config, by: Option<&str>) -> Grouping {
    let raw = by.map_or_else(|| cfg.group_by(), str::to_string);
    Grouping::parse(&raw)
}

#[instrument(skip(source, cfg, renderer))]
fn cmd_groups(
    source: &dyn ItemSource,
    cfg: &Config,
    renderer: &Renderer,
    args: &GroupArgs,
) -> anyhow::Result<()> {
    let items = source.load_items()?;
    let grouping = grouping_for(cfg, args.by.as_deref());
    info!(by = grouping.sort_by(), count = items.len(), "command groups");

    let data = grouping.group(items);
    if args.json {
        renderer.print_json(&data)
    } else {
        renderer.print_groups(&data)
    }
}

#[instrument(skip(source, cfg, renderer))]
fn cmd_layout(
    source: &dyn ItemSource,
    cfg: &Config,
    renderer: &Renderer,
    args: &LayoutArgs,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let items = source.load_items()?;
    let grouping = grouping_for(cfg, args.by.as_deref());
    let zoom = match args.zoom {
        Some(zoom) => zoom,
        None => cfg.zoom()?,
    };
    info!(by = grouping.sort_by(), %zoom, "command layout");

    let layout = build_layout(items, &grouping, zoom, today);
    if args.json {
        renderer.print_json(&layout)
    } else {
        renderer.print_layout(&layout)
    }
}

#[instrument(skip(source, renderer))]
fn cmd_axis(source: &dyn ItemSource, renderer: &Renderer, today: NaiveDate) -> anyhow::Result<()> {
    let interval = axis_interval(source, today)?;
    renderer.print_axis(&interval)
}

fn axis_interval(source: &dyn ItemSource, today: NaiveDate) -> anyhow::Result<TimelineInterval> {
    let items = source.load_items()?;
    Ok(compute_interval(&items, today))
}

#[instrument(skip(source, cfg, renderer))]
fn cmd_info(
    source: &dyn ItemSource,
    cfg: &Config,
    renderer: &Renderer,
    id: &str,
) -> anyhow::Result<()> {
    let grouping = grouping_for(cfg, None);
    let data = grouping.group(source.load_items()?);

    let (group, item) = data
        .find_item(id)
        .ok_or_else(|| anyhow!("no item with id {id}"))?;
    renderer.print_item_info(&group.group_title, item)
}

#[instrument(skip(source, renderer))]
fn cmd_stats(source: &dyn ItemSource, renderer: &Renderer, field: &str) -> anyhow::Result<()> {
    let items = source.load_items()?;
    let counts = count_by_field(&items, field);
    info!(field, values = counts.len(), "command stats");
    renderer.print_counts(field, &counts)
}

fn cmd_zooms(cfg: &Config, renderer: &Renderer) -> anyhow::Result<()> {
    renderer.print_zooms(cfg.zoom()?)
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<(&String, &String)> = cfg.iter().collect();
    entries.sort();
    for (k, v) in entries {
        println!("{k}={v}");
    }
    for file in &cfg.loaded_files {
        println!("# loaded {}", file.display());
    }
    Ok(())
}
