pub mod axis;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod grouping;
pub mod item;
pub mod layout;
pub mod overlap;
pub mod placement;
pub mod render;
pub mod sort;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::datastore::{
  ItemSource,
  JsonFileSource,
  StaticSource
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting timeline CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.timelinerc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let command =
    cli.command.unwrap_or_default();

  let source: Box<dyn ItemSource> =
    if command.needs_items() {
      let path =
        datastore::resolve_items_path(
          &cfg,
          cli.data.as_deref()
        )
        .context(
          "failed to resolve item file"
        )?;
      Box::new(JsonFileSource::new(path))
    } else {
      Box::new(StaticSource::default())
    };

  let renderer =
    render::Renderer::new(&cfg)?;

  commands::dispatch(
    source.as_ref(),
    &cfg,
    &renderer,
    command
  )?;

  info!("done");
  Ok(())
}
