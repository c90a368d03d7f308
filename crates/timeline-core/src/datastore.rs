use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tracing::{debug, info, warn};

use crate::config::{Config, DATA_LOCATION_KEY, expand_tilde};
use crate::item::TimelineItem;

/// Anything that can produce the flat item list a layout is built from.
pub trait ItemSource {
    fn load_items(&self) -> anyhow::Result<Vec<TimelineItem>>;
}

/// Items held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    items: Vec<TimelineItem>,
}

impl StaticSource {
    pub fn new(items: Vec<TimelineItem>) -> Self {
        Self { items }
    }
}

impl ItemSource for StaticSource {
    fn load_items(&self) -> anyhow::Result<Vec<TimelineItem>> {
        Ok(self.items.clone())
    }
}

/// A JSON file holding either one array of items or one item per line.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    pub path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ItemSource for JsonFileSource {
    #[tracing::instrument(skip(self), fields(file = %self.path.display()))]
    fn load_items(&self) -> anyhow::Result<Vec<TimelineItem>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        let items = if text.trim_start().starts_with('[') {
            load_json_array(&self.path, &text)?
        } else {
            load_jsonl(&self.path, &text)?
        };

        for item in items.iter().filter(|item| item.is_inverted()) {
            warn!(id = %item.id, "item ends before it starts");
        }

        info!(count = items.len(), "loaded timeline items");
        Ok(items)
    }
}

/// Data file from `--data`, else from `data.location`.
#[tracing::instrument(skip(cfg, override_path))]
pub fn resolve_items_path(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(expand_tilde(path));
    }

    cfg.data_location().ok_or_else(|| {
        anyhow!("no item file given; pass --data FILE or set {DATA_LOCATION_KEY} in timelinerc")
    })
}

fn load_json_array(path: &Path, text: &str) -> anyhow::Result<Vec<TimelineItem>> {
    debug!(file = %path.display(), "parsing json array");
    serde_json::from_str(text).with_context(|| format!("failed parsing {}", path.display()))
}

fn load_jsonl(path: &Path, text: &str) -> anyhow::Result<Vec<TimelineItem>> {
    debug!(file = %path.display(), "parsing jsonl");

    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let item: TimelineItem = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(item);
    }

    Ok(out)
}
