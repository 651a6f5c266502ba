//! Implementation of the `kiln clean` command.

use anyhow::{Context, Result};
use clap::Args;

use super::ManifestArgs;
use crate::output::{print_info, print_success};
use crate::prompts::confirm_clean;

#[derive(Args, Debug)]
pub struct CleanArgs {
  #[command(flatten)]
  pub manifest: ManifestArgs,

  /// Skip the confirmation prompt
  #[arg(long)]
  pub force: bool,
}

pub fn cmd_clean(args: &CleanArgs) -> Result<()> {
  let (_, session) = args.manifest.backend_session()?;
  let desc = session.active_backend().context("no active backend")?;
  let backend = desc.name.clone();
  let (build_dir, bin_dir) = (desc.build_path(), desc.bin_path());

  if !confirm_clean(&backend, &[build_dir.as_path(), bin_dir.as_path()], args.force)? {
    print_info("Aborted.");
    return Ok(());
  }

  let report = session.clean().context("clean failed")?;
  if report.removed.is_empty() {
    print_info(&format!("{backend}: nothing to clean"));
  } else {
    print_success(&format!("{backend}: removed {} output(s)", report.removed.len()));
  }
  Ok(())
}
