//! Implementation of the `kiln plan` command.
//!
//! Plans the build description against the active backend's recorded state
//! and lists every action with its staleness verdict. Nothing is executed and
//! nothing is written.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use kiln_lib::execute::PlannedAction;

use super::{ExecArgs, ManifestArgs};
use crate::output::{print_action, print_info, print_json, print_stat, symbols};

#[derive(Args, Debug)]
pub struct PlanArgs {
  #[command(flatten)]
  pub manifest: ManifestArgs,

  #[command(flatten)]
  pub exec: ExecArgs,

  /// Print the plan as JSON
  #[arg(long)]
  pub json: bool,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
  backend: &'a str,
  stale: usize,
  up_to_date: usize,
  actions: &'a [PlannedAction],
}

pub fn cmd_plan(args: &PlanArgs, verbose: bool) -> Result<()> {
  let session = args.manifest.session(&args.exec)?;
  let backend = session
    .active_backend()
    .map(|d| d.name.clone())
    .unwrap_or_default();
  let planned = session.plan().context("failed to plan build")?;
  let stale = planned.iter().filter(|p| p.staleness.is_stale()).count();

  if args.json {
    return print_json(&PlanOutput {
      backend: &backend,
      stale,
      up_to_date: planned.len() - stale,
      actions: &planned,
    });
  }

  for action in &planned {
    if action.staleness.is_stale() {
      print_action(symbols::STALE, action.kind, &action.label, action.staleness.as_str());
      if verbose {
        println!("      {}", action.command);
      }
    } else if verbose {
      print_action(symbols::FRESH, action.kind, &action.label, action.staleness.as_str());
    }
  }

  if stale == 0 {
    print_info(&format!("{backend}: everything up to date"));
  } else {
    println!();
    print_stat("Backend", &backend);
    print_stat("Would run", &stale.to_string());
    print_stat("Up to date", &(planned.len() - stale).to_string());
  }
  Ok(())
}
