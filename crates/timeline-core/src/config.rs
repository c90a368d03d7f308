use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::item::NAME_FIELD;
use crate::view::ZoomLevel;

pub const DATA_LOCATION_KEY: &str =
  "data.location";
pub const GROUP_BY_KEY: &str =
  "group.by";
pub const ZOOM_KEY: &str = "view.zoom";
pub const COLOR_KEY: &str = "color";

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      GROUP_BY_KEY.to_string(),
      NAME_FIELD.to_string()
    );
    map.insert(
      ZOOM_KEY.to_string(),
      ZoomLevel::default()
        .as_key()
        .to_string()
    );
    map.insert(
      COLOR_KEY.to_string(),
      "on".to_string()
    );

    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc =
      resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(timelinerc = %path.display(), "loading timelinerc");
      cfg.load_file(&path)?;
    } else {
      warn!(
        "no timelinerc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    self
      .map
      .get(key)
      .map(|v| {
        parse_bool(v).ok_or_else(|| {
          anyhow!(
            "invalid boolean for \
             {key}: {v}"
          )
        })
      })
      .transpose()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  pub fn data_location(
    &self
  ) -> Option<PathBuf> {
    self
      .get(DATA_LOCATION_KEY)
      .filter(|v| !v.trim().is_empty())
      .map(|v| {
        expand_tilde(Path::new(
          v.trim()
        ))
      })
  }

  pub fn group_by(&self) -> String {
    self
      .get(GROUP_BY_KEY)
      .map(|v| v.trim().to_string())
      .filter(|v| !v.is_empty())
      .unwrap_or_else(|| {
        NAME_FIELD.to_string()
      })
  }

  pub fn zoom(
    &self
  ) -> anyhow::Result<ZoomLevel> {
    match self.get(ZOOM_KEY) {
      | Some(raw) => raw
        .parse::<ZoomLevel>()
        .with_context(|| {
          format!(
            "invalid {ZOOM_KEY} \
             setting"
          )
        }),
      | None => Ok(ZoomLevel::default())
    }
  }

  pub fn color(
    &self
  ) -> anyhow::Result<bool> {
    Ok(
      self
        .get_bool(COLOR_KEY)?
        .unwrap_or(true)
    )
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var("TIMELINERC")
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let home = dirs::home_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine home \
         directory"
      )
    })?;
  let candidate =
    home.join(".timelinerc");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let expanded =
    expand_tilde(Path::new(include));
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

pub(crate) fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn defaults_without_rc_file() {
    let cfg = Config::default();

    assert_eq!(cfg.group_by(), "name");
    assert_eq!(
      cfg.zoom().ok(),
      Some(ZoomLevel::Month)
    );
    assert!(
      cfg.color().unwrap_or(false)
    );
    assert!(
      cfg.data_location().is_none()
    );
  }

  #[test]
  fn reads_rc_with_comments_and_includes()
   {
    let dir =
      tempdir().expect("tempdir");
    let extra = dir.path().join("extra.rc");
    fs::write(
      &extra,
      "view.zoom = day\n"
    )
    .expect("write include");
    let rc = dir.path().join("timelinerc");
    fs::write(
      &rc,
      "# timeline settings\n\
       group.by = team  # by team\n\
       \n\
       include extra.rc\n\
       color = off\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(rc.as_path()))
      .expect("load rc");

    assert_eq!(cfg.group_by(), "team");
    assert_eq!(
      cfg.zoom().ok(),
      Some(ZoomLevel::Day)
    );
    assert_eq!(
      cfg.color().ok(),
      Some(false)
    );
    assert_eq!(cfg.loaded_files.len(), 2);
  }

  #[test]
  fn malformed_line_is_an_error() {
    let dir =
      tempdir().expect("tempdir");
    let rc = dir.path().join("timelinerc");
    fs::write(&rc, "group.by team\n")
      .expect("write rc");

    let err = Config::load(Some(rc.as_path()))
      .expect_err("malformed rc");

    assert!(
      err
        .to_string()
        .contains("invalid config line")
    );
  }

  #[test]
  fn missing_include_is_skipped() {
    let dir =
      tempdir().expect("tempdir");
    let rc = dir.path().join("timelinerc");
    fs::write(
      &rc,
      "include nowhere.rc\n\
       view.zoom = year\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(rc.as_path()))
      .expect("load rc");

    assert_eq!(
      cfg.zoom().ok(),
      Some(ZoomLevel::Year)
    );
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![
      (
        "rc.group.by".to_string(),
        "status".to_string()
      ),
      (
        "view.zoom".to_string(),
        "week".to_string()
      ),
    ]);

    assert_eq!(cfg.group_by(), "status");
    assert!(cfg.zoom().is_err());
  }

  #[test]
  fn rejects_unknown_booleans() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "color".to_string(),
      "sometimes".to_string()
    )]);

    assert!(cfg.color().is_err());
  }
}
